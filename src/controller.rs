//! List/edit workflow for one record type.
//!
//! A [`RecordController`] is either showing the list or editing a single private draft.
//! Nothing the draft goes through is visible to other readers until [`RecordController::save`]
//! succeeds.

use crate::errors::ServiceError;
use crate::models::Record;
use crate::services::{RecordService, Totals};
use crate::validation::FieldErrors;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    New,
    Existing(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerState<R> {
    List,
    Editing {
        draft: R,
        mode: EditMode,
        errors: FieldErrors,
    },
}

#[derive(Debug)]
pub struct RecordController<R: Record> {
    service: RecordService,
    state: ControllerState<R>,
    filter: String,
}

impl<R: Record> RecordController<R> {
    pub fn new(service: RecordService) -> Self {
        Self {
            service,
            state: ControllerState::List,
            filter: String::new(),
        }
    }

    pub fn state(&self) -> &ControllerState<R> {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, ControllerState::Editing { .. })
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, query: impl Into<String>) {
        self.filter = query.into();
    }

    /// Every stored record, newest first.
    pub fn records(&self) -> Vec<R> {
        self.service.list()
    }

    /// Stored records matching the current filter.
    pub fn visible_records(&self) -> Vec<R> {
        self.service.search(&self.filter)
    }

    /// Starts editing a fresh draft.
    pub fn create(&mut self) -> Result<&mut R, ServiceError> {
        self.ensure_listing()?;
        let draft = self.service.create_draft::<R>()?;
        Ok(self.begin(draft, EditMode::New))
    }

    /// Starts editing a copy of the stored record `id`.
    pub fn edit(&mut self, id: &str) -> Result<&mut R, ServiceError> {
        self.ensure_listing()?;
        let draft = self.service.load_draft::<R>(id)?;
        Ok(self.begin(draft, EditMode::Existing(id.to_string())))
    }

    pub fn draft(&self) -> Option<&R> {
        match &self.state {
            ControllerState::Editing { draft, .. } => Some(draft),
            ControllerState::List => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut R> {
        match &mut self.state {
            ControllerState::Editing { draft, .. } => Some(draft),
            ControllerState::List => None,
        }
    }

    pub fn mode(&self) -> Option<&EditMode> {
        match &self.state {
            ControllerState::Editing { mode, .. } => Some(mode),
            ControllerState::List => None,
        }
    }

    /// Errors from the last rejected save of the current draft.
    pub fn errors(&self) -> Option<&FieldErrors> {
        match &self.state {
            ControllerState::Editing { errors, .. } => Some(errors),
            ControllerState::List => None,
        }
    }

    /// Live totals of the draft being edited.
    pub fn draft_totals(&self) -> Option<Totals> {
        self.draft().and_then(R::totals)
    }

    /// Discards the draft.
    pub fn cancel(&mut self) {
        self.state = ControllerState::List;
    }

    /// Persists the draft and returns to the list.
    ///
    /// On failure the controller keeps editing the same draft; validation messages are also
    /// available through [`RecordController::errors`].
    pub fn save(&mut self) -> Result<R, ServiceError> {
        let (draft, errors) = match &mut self.state {
            ControllerState::Editing { draft, errors, .. } => (draft.clone(), errors),
            ControllerState::List => {
                return Err(ServiceError::InvalidOperation(
                    "Nothing is being edited".to_string(),
                ))
            }
        };

        match self.service.save_draft(draft) {
            Ok(saved) => {
                self.state = ControllerState::List;
                Ok(saved)
            }
            Err(ServiceError::ValidationError(field_errors)) => {
                *errors = field_errors.clone();
                Err(ServiceError::ValidationError(field_errors))
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes a stored record. Only allowed from the list.
    pub fn delete(&mut self, id: &str) -> Result<bool, ServiceError> {
        self.ensure_listing()?;
        self.service.delete::<R>(id)
    }

    fn ensure_listing(&self) -> Result<(), ServiceError> {
        if self.is_editing() {
            return Err(ServiceError::InvalidOperation(format!(
                "Finish or cancel the open {} first",
                R::KIND.label()
            )));
        }
        Ok(())
    }

    fn begin(&mut self, draft: R, mode: EditMode) -> &mut R {
        self.state = ControllerState::Editing {
            draft,
            mode,
            errors: FieldErrors::new(),
        };
        match &mut self.state {
            ControllerState::Editing { draft, .. } => draft,
            ControllerState::List => unreachable!("state was just set to Editing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemMaster, OrderLine, PurchaseOrder};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn controller<R: Record>() -> RecordController<R> {
        RecordController::new(RecordService::in_memory())
    }

    #[test]
    fn create_then_save_returns_to_list() {
        let mut orders = controller::<PurchaseOrder>();
        let draft = orders.create().unwrap();
        draft.items[0] = OrderLine::new("Paper", dec!(2), dec!(5.5), dec!(5));

        let saved = orders.save().unwrap();
        assert!(!orders.is_editing());
        assert_eq!(orders.records(), vec![saved]);
    }

    #[test]
    fn failed_save_keeps_draft_and_errors() {
        let mut orders = controller::<PurchaseOrder>();
        orders.create().unwrap().items.clear();

        assert_matches!(orders.save(), Err(ServiceError::ValidationError(_)));
        assert!(orders.is_editing());
        assert!(orders.errors().unwrap().contains_key("items"));
        assert!(orders.draft().unwrap().items.is_empty());
        assert!(orders.records().is_empty());
    }

    #[test]
    fn cancel_discards_changes() {
        let service = RecordService::in_memory();
        service.seed_samples().unwrap();
        let mut items = RecordController::<ItemMaster>::new(service);

        items.edit("sample-1").unwrap().description = "Changed".into();
        assert_eq!(items.mode(), Some(&EditMode::Existing("sample-1".into())));
        items.cancel();

        assert_eq!(items.records()[0].description, "Sample Item - Office Chair");
        assert!(items.draft().is_none());
    }

    #[test]
    fn delete_is_rejected_while_editing() {
        let mut items = controller::<ItemMaster>();
        items.create().unwrap();
        assert_matches!(items.delete("x"), Err(ServiceError::InvalidOperation(_)));
        assert_matches!(items.create(), Err(ServiceError::InvalidOperation(_)));
    }

    #[test]
    fn save_without_draft_is_invalid() {
        let mut items = controller::<ItemMaster>();
        assert_matches!(items.save(), Err(ServiceError::InvalidOperation(_)));
    }

    #[test]
    fn draft_totals_follow_edits() {
        let mut orders = controller::<PurchaseOrder>();
        {
            let draft = orders.create().unwrap();
            draft.shipping_fee = dec!(25);
            draft.items = vec![
                OrderLine::new("Paper", dec!(2), dec!(5.5), dec!(5)),
                OrderLine::new("Staplers", dec!(3), dec!(8), dec!(0)),
            ];
        }
        assert_eq!(orders.draft_totals().unwrap().grand_total, dec!(60.55));
    }

    #[test]
    fn filter_narrows_visible_records() {
        let service = RecordService::in_memory();
        service.seed_samples().unwrap();
        let mut orders = RecordController::<PurchaseOrder>::new(service);

        orders.set_filter("evergreen");
        assert!(orders.visible_records().is_empty());
        orders.set_filter("");
        assert_eq!(orders.visible_records().len(), 1);
    }
}
