use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::{GoodsReceipt, ItemMaster, PurchaseOrder, Record};
use crate::numbering::unique_document_number;
use crate::store::{RecordStore, StorageFactory};

/// Create/edit/list/delete operations for every record type.
#[derive(Debug, Clone)]
pub struct RecordService {
    store: RecordStore,
}

impl RecordService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// A service over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(RecordStore::in_memory())
    }

    /// Builds the configured backend and seeds sample data when enabled.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let backend = StorageFactory::create(config.storage())?;
        let service = Self::new(RecordStore::new(backend));
        if config.seed_samples {
            service.seed_samples()?;
        }
        Ok(service)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// All stored records of type `R`, newest first.
    pub fn list<R: Record>(&self) -> Vec<R> {
        self.store.load::<R>()
    }

    /// Stored records matching `query`. Never touches storage beyond the read.
    pub fn search<R: Record>(&self, query: &str) -> Vec<R> {
        self.list::<R>()
            .into_iter()
            .filter(|record| record.matches(query))
            .collect()
    }

    #[instrument(skip(self), fields(kind = %R::KIND))]
    pub fn get<R: Record>(&self, id: &str) -> Result<R, ServiceError> {
        self.list::<R>()
            .into_iter()
            .find(|record| record.id() == Some(id))
            .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", R::KIND.label(), id)))
    }

    /// A new unsaved record with a fresh document number.
    #[instrument(skip(self), fields(kind = %R::KIND))]
    pub fn create_draft<R: Record>(&self) -> Result<R, ServiceError> {
        let existing = self.list::<R>();
        let now = Utc::now();
        let number =
            unique_document_number(R::KIND, now, existing.iter().map(|record| record.number()))?;
        Ok(R::blank(number, now))
    }

    /// A private copy of a stored record for editing.
    pub fn load_draft<R: Record>(&self, id: &str) -> Result<R, ServiceError> {
        self.get(id)
    }

    /// Validates and persists `draft`.
    ///
    /// Drafts without an id are assigned one and put at the front of the list. Drafts with an
    /// id replace the stored record in place, keeping its number and creation time.
    #[instrument(skip(self, draft), fields(kind = %R::KIND))]
    pub fn save_draft<R: Record>(&self, draft: R) -> Result<R, ServiceError> {
        draft.field_errors().into_result()?;

        let mut records = self.store.load_for_write::<R>()?;
        let mut saved = draft;

        let position = saved
            .id()
            .and_then(|id| records.iter().position(|record| record.id() == Some(id)));

        match (saved.id().is_some(), position) {
            (true, Some(index)) => {
                let stored = &records[index];
                saved.set_number(stored.number().to_string());
                saved.set_created_at(stored.created_at());
                records[index] = saved.clone();
            }
            (true, None) => {
                warn!(
                    number = saved.number(),
                    "Edited record no longer stored; inserting it again"
                );
                records.insert(0, saved.clone());
            }
            (false, _) => {
                saved.set_id(Uuid::new_v4().to_string());
                records.insert(0, saved.clone());
            }
        }

        self.store.save(&records)?;
        info!(number = saved.number(), "Saved {}", R::KIND.label());
        Ok(saved)
    }

    /// Removes the record with `id`. Returns whether anything was removed.
    #[instrument(skip(self), fields(kind = %R::KIND))]
    pub fn delete<R: Record>(&self, id: &str) -> Result<bool, ServiceError> {
        let mut records = self.store.load_for_write::<R>()?;
        let before = records.len();
        records.retain(|record| record.id() != Some(id));

        if records.len() == before {
            return Ok(false);
        }

        self.store.save(&records)?;
        info!(id, "Deleted {}", R::KIND.label());
        Ok(true)
    }

    /// Drops every stored record of type `R`, including the slot itself.
    pub fn clear<R: Record>(&self) -> Result<(), ServiceError> {
        self.store.clear::<R>()?;
        Ok(())
    }

    /// Writes one sample record into each slot that has never been written.
    /// Returns how many slots were seeded.
    pub fn seed_samples(&self) -> Result<usize, ServiceError> {
        let seeded = [
            self.seed::<ItemMaster>()?,
            self.seed::<PurchaseOrder>()?,
            self.seed::<GoodsReceipt>()?,
        ]
        .into_iter()
        .filter(|seeded| *seeded)
        .count();

        if seeded > 0 {
            info!(seeded, "Seeded sample records");
        }
        Ok(seeded)
    }

    fn seed<R: Record>(&self) -> Result<bool, ServiceError> {
        if self.store.is_initialized::<R>()? {
            return Ok(false);
        }
        self.store.save(&[R::sample(Utc::now())])?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderLine;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn valid_order(service: &RecordService) -> PurchaseOrder {
        let mut order: PurchaseOrder = service.create_draft().unwrap();
        order.items = vec![OrderLine::new("Paper", dec!(2), dec!(5.5), dec!(5))];
        order
    }

    #[test]
    fn first_save_assigns_id_and_prepends() {
        let service = RecordService::in_memory();
        let first = service.save_draft(valid_order(&service)).unwrap();
        let second = service.save_draft(valid_order(&service)).unwrap();

        assert!(first.id.is_some());
        assert_ne!(first.id, second.id);

        let stored: Vec<PurchaseOrder> = service.list();
        assert_eq!(stored, vec![second, first]);
    }

    #[test]
    fn invalid_draft_is_not_persisted() {
        let service = RecordService::in_memory();
        let draft: PurchaseOrder = service.create_draft().unwrap();

        let err = service.save_draft(draft).unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("items[0].description"));
        assert!(!service.store().is_initialized::<PurchaseOrder>().unwrap());
    }

    #[test]
    fn edit_save_keeps_number_and_count() {
        let service = RecordService::in_memory();
        let saved = service.save_draft(valid_order(&service)).unwrap();

        let mut draft: PurchaseOrder = service.load_draft(saved.id().unwrap()).unwrap();
        draft.notes = "Rush".into();
        draft.po_number = "PO-TAMPERED".into();
        let updated = service.save_draft(draft).unwrap();

        assert_eq!(updated.po_number, saved.po_number);
        assert_eq!(updated.created_at, saved.created_at);
        let stored: Vec<PurchaseOrder> = service.list();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].notes, "Rush");
    }

    #[test]
    fn delete_unknown_id_is_noop() {
        let service = RecordService::in_memory();
        assert!(!service.delete::<ItemMaster>("missing").unwrap());
        assert!(!service.store().is_initialized::<ItemMaster>().unwrap());
    }

    #[test]
    fn missing_record_is_not_found() {
        let service = RecordService::in_memory();
        assert_matches!(
            service.load_draft::<GoodsReceipt>("nope"),
            Err(ServiceError::NotFound(_))
        );
    }

    #[test]
    fn seeding_only_fills_unwritten_slots() {
        let service = RecordService::in_memory();
        service.store().save::<ItemMaster>(&[]).unwrap();

        assert_eq!(service.seed_samples().unwrap(), 2);
        assert!(service.list::<ItemMaster>().is_empty());
        assert_eq!(service.list::<PurchaseOrder>().len(), 1);
        assert_eq!(service.seed_samples().unwrap(), 0);
    }

    #[test]
    fn search_filters_by_identifying_fields() {
        let service = RecordService::in_memory();
        service.seed_samples().unwrap();

        assert_eq!(service.search::<PurchaseOrder>("blue").len(), 1);
        assert!(service.search::<PurchaseOrder>("zzz").is_empty());
        assert_eq!(service.search::<GoodsReceipt>("").len(), 1);
    }

    #[test]
    fn draft_numbers_carry_kind_prefix() {
        let service = RecordService::in_memory();
        let item: ItemMaster = service.create_draft().unwrap();
        let receipt: GoodsReceipt = service.create_draft().unwrap();

        assert!(item.item_code.starts_with("ITM-"));
        assert!(receipt.gr_number.starts_with("GR-"));
        assert!(item.id.is_none());
    }
}
