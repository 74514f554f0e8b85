//! Procurement Records Library
//!
//! Record model, validation, totals and persistence for item master, purchase order and
//! goods receipt data entry. Presentation code drives a [`RecordController`] per record type
//! (or calls [`RecordService`] directly) and renders what it returns.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod controller;
pub mod errors;
pub mod models;
pub mod numbering;
pub mod services;
pub mod store;
pub mod validation;

pub use config::{AppConfig, StorageConfig};
pub use controller::{ControllerState, EditMode, RecordController};
pub use errors::ServiceError;
pub use models::{
    EntityKind, GoodsReceipt, ItemMaster, OrderLine, PurchaseOrder, ReceiptLine, Record,
};
pub use services::{compute_totals, line_total, RecordService, Totals};
pub use store::{RecordStore, StorageBackend, StorageError};
pub use validation::{validate, FieldErrors};
