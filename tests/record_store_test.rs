mod common;

use std::sync::Arc;

use chrono::Utc;
use assert_matches::assert_matches;
use common::TestApp;
use procurement_records::{
    models::{GoodsReceipt, ItemMaster, PurchaseOrder, Record},
    store::{FileStorage, InMemoryStorage, RecordStore, StorageBackend, StorageFactory},
    ServiceError, StorageConfig, StorageError,
};
use rust_decimal_macros::dec;
use tempfile::TempDir;

/// Backend whose writes always fail.
struct ReadOnlyBackend(InMemoryStorage);

impl StorageBackend for ReadOnlyBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("quota exceeded".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("quota exceeded".into()))
    }

    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        self.0.contains(key)
    }
}

#[test]
fn save_then_load_preserves_order() {
    let store = RecordStore::in_memory();
    let records: Vec<ItemMaster> = (0..5)
        .map(|n| {
            let mut item = ItemMaster::sample(Utc::now());
            item.id = Some(format!("item-{}", n));
            item.item_code = format!("ITM-20250920-100{}", n);
            item
        })
        .collect();

    store.save(&records).unwrap();
    assert_eq!(store.load::<ItemMaster>(), records);
}

#[test]
fn file_backend_round_trips_between_instances() {
    let dir = TempDir::new().unwrap();
    let first = RecordStore::new(Arc::new(FileStorage::new(dir.path()).unwrap()));
    first.save(&[GoodsReceipt::sample(Utc::now())]).unwrap();

    let second = RecordStore::new(Arc::new(FileStorage::new(dir.path()).unwrap()));
    let receipts = second.load::<GoodsReceipt>();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].other_charges.shipping_fee, dec!(110));
}

#[test]
fn corrupt_file_reads_as_empty() {
    let app = TestApp::with_files();
    let path = app.data_dir().unwrap().join("item_master_v1.json");
    std::fs::write(path, "[{\"itemCode\": 12").unwrap();

    assert!(app.service.list::<ItemMaster>().is_empty());
}

#[test]
fn legacy_array_payload_loads() {
    let app = TestApp::new();
    app.backend
        .set(
            "purchase_orders_v1",
            r#"[{
                "id": "po-1",
                "poNumber": "PO-20250920-6424",
                "vendorId": "v-002",
                "vendorName": "Blue Ocean Traders",
                "orderDate": "2025-09-20",
                "expectedDate": "",
                "shippingFee": 25,
                "items": [
                    {"id": 1, "sku": "SKU-101", "description": "Paper A4 500pk", "qty": 2, "price": 5.5, "tax": 5},
                    {"id": 2, "sku": "SKU-202", "description": "Staplers", "qty": 3, "price": 8, "tax": 0}
                ],
                "status": "Approved",
                "createdAt": "2025-09-20T10:00:00.000Z"
            }]"#,
        )
        .unwrap();

    let order: PurchaseOrder = app.service.get("po-1").unwrap();
    assert_eq!(order.totals().unwrap().grand_total, dec!(60.55));

    // The next save rewrites the slot in the versioned layout.
    app.service.save_draft(order).unwrap();
    let raw = app.raw_slot("purchase_orders_v1").unwrap();
    assert!(raw.starts_with("{\"version\":1"));
}

#[test]
fn newer_schema_slot_survives_save_and_delete() {
    let app = TestApp::new();
    let newer = r#"{"version":2,"kind":"purchase_order","records":[{"id":"keep-me","poNumber":"PO-20991231-1234"}]}"#;
    app.backend.set("purchase_orders_v1", newer).unwrap();

    assert!(app.service.list::<PurchaseOrder>().is_empty());

    let err = app.service.save_draft(common::order(&app.service)).unwrap_err();
    assert_matches!(
        err,
        ServiceError::StorageError(StorageError::UnsupportedVersion { found: 2, .. })
    );
    assert_matches!(
        app.service.delete::<PurchaseOrder>("keep-me"),
        Err(ServiceError::StorageError(_))
    );
    assert_eq!(app.raw_slot("purchase_orders_v1").as_deref(), Some(newer));
}

#[test]
fn slot_of_another_kind_is_not_overwritten() {
    let app = TestApp::new();
    let other = r#"{"version":1,"kind":"goods_receipt","records":[]}"#;
    app.backend.set("item_master_v1", other).unwrap();

    let err = app
        .service
        .save_draft(common::item(&app.service, "Pens"))
        .unwrap_err();
    assert_matches!(err, ServiceError::StorageError(StorageError::KindMismatch { .. }));
    assert_eq!(app.raw_slot("item_master_v1").as_deref(), Some(other));
}

#[test]
fn write_failures_are_reported() {
    let backend = Arc::new(ReadOnlyBackend(InMemoryStorage::new()));
    let service = procurement_records::RecordService::new(RecordStore::new(backend));
    let draft = common::order(&service);

    let err = service.save_draft(draft).unwrap_err();
    assert!(!err.is_recoverable());
    assert_eq!(err.user_message(), "Could not save changes to storage");
}

#[test]
fn factory_honours_file_config() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("records");
    let backend =
        StorageFactory::create(&StorageConfig::file(data_dir.to_string_lossy())).unwrap();

    backend.set("item_master_v1", "[]").unwrap();
    assert!(data_dir.join("item_master_v1.json").is_file());
}
