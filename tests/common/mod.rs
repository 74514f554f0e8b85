#![allow(dead_code)]

use std::sync::Arc;

use procurement_records::{
    models::{GoodsReceipt, ItemMaster, OrderLine, PurchaseOrder, ReceiptLine},
    store::{FileStorage, InMemoryStorage, StorageBackend},
    RecordService, RecordStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

/// Helper harness wiring a [`RecordService`] to a backend the test can inspect directly.
pub struct TestApp {
    pub service: RecordService,
    pub backend: Arc<dyn StorageBackend>,
    _dir: Option<TempDir>,
}

impl TestApp {
    /// Fresh in-memory storage.
    pub fn new() -> Self {
        let backend: Arc<dyn StorageBackend> = Arc::new(InMemoryStorage::new());
        Self {
            service: RecordService::new(RecordStore::new(backend.clone())),
            backend,
            _dir: None,
        }
    }

    /// Fresh file storage in a temporary directory that lives as long as the harness.
    pub fn with_files() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let backend: Arc<dyn StorageBackend> =
            Arc::new(FileStorage::new(dir.path()).expect("failed to open file storage"));
        Self {
            service: RecordService::new(RecordStore::new(backend.clone())),
            backend,
            _dir: Some(dir),
        }
    }

    /// A second service over the same backend, as another session would see it.
    pub fn reopen(&self) -> RecordService {
        RecordService::new(RecordStore::new(self.backend.clone()))
    }

    pub fn raw_slot(&self, key: &str) -> Option<String> {
        self.backend.get(key).expect("backend read failed")
    }

    pub fn data_dir(&self) -> Option<&std::path::Path> {
        self._dir.as_ref().map(TempDir::path)
    }
}

pub fn item(service: &RecordService, description: &str) -> ItemMaster {
    let mut item: ItemMaster = service.create_draft().expect("draft");
    item.description = description.to_string();
    item.category = "Stationery".to_string();
    item.unit_of_measure = "Each".to_string();
    item.price = dec!(4.25);
    item
}

pub fn order_line(description: &str, quantity: Decimal, price: Decimal, tax: Decimal) -> OrderLine {
    OrderLine::new(description, quantity, price, tax)
}

/// The two-line order used throughout: subtotal 35, tax 0.55, shipping 25.
pub fn sample_lines() -> Vec<OrderLine> {
    vec![
        order_line("Paper A4 500pk", dec!(2), dec!(5.5), dec!(5)),
        order_line("Staplers", dec!(3), dec!(8), dec!(0)),
    ]
}

pub fn receipt(service: &RecordService, supplier: &str, po_number: &str) -> GoodsReceipt {
    let mut receipt: GoodsReceipt = service.create_draft().expect("draft");
    receipt.supplier = supplier.to_string();
    receipt.po_number = po_number.to_string();
    receipt.items = vec![ReceiptLine::new("Toner", dec!(4), dec!(1), dec!(30), dec!(10))];
    receipt
}

pub fn order(service: &RecordService) -> PurchaseOrder {
    let mut order: PurchaseOrder = service.create_draft().expect("draft");
    order.items = sample_lines();
    order.shipping_fee = dec!(25);
    order
}
