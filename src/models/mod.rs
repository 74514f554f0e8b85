// Record models
pub mod goods_receipt;
pub mod item_master;
pub mod line_item;
pub mod purchase_order;

pub use goods_receipt::{GoodsReceipt, OtherCharges, ReceiptStatus};
pub use item_master::{ItemMaster, ItemStatus};
pub use line_item::{Amounts, LineAmounts, OrderLine, ReceiptLine};
pub use purchase_order::{find_vendor, PurchaseOrder, PurchaseOrderStatus, Vendor, VENDORS};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

use crate::services::totals::Totals;
use crate::validation::FieldErrors;

/// The three kinds of record the application manages. Each owns one storage slot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
    ItemMaster,
    PurchaseOrder,
    GoodsReceipt,
}

impl EntityKind {
    /// Fixed storage key for the kind's record list.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::ItemMaster => "item_master_v1",
            Self::PurchaseOrder => "purchase_orders_v1",
            Self::GoodsReceipt => "goods_receipts_v1",
        }
    }

    /// Prefix of generated document numbers (`PO-20250920-1234`).
    pub fn number_prefix(self) -> &'static str {
        match self {
            Self::ItemMaster => "ITM",
            Self::PurchaseOrder => "PO",
            Self::GoodsReceipt => "GR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ItemMaster => "item",
            Self::PurchaseOrder => "purchase order",
            Self::GoodsReceipt => "goods receipt",
        }
    }
}

/// Behaviour shared by every persisted record type.
///
/// The record service, store and controller are written once against this trait instead of
/// once per entity.
pub trait Record:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    /// Identifier assigned on first save. Unsaved drafts have none.
    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);

    /// Human-facing document number (`itemCode`, `poNumber`, `grNumber`).
    fn number(&self) -> &str;
    fn set_number(&mut self, number: String);

    fn created_at(&self) -> DateTime<Utc>;
    fn set_created_at(&mut self, created_at: DateTime<Utc>);

    /// A fresh draft with defaults and the given document number.
    fn blank(number: String, now: DateTime<Utc>) -> Self;

    /// Example record written into an empty workspace.
    fn sample(now: DateTime<Utc>) -> Self;

    /// Field-level validation. Empty iff the record may be saved.
    fn field_errors(&self) -> FieldErrors;

    /// Fields matched by list filtering.
    fn search_fields(&self) -> Vec<&str>;

    fn totals(&self) -> Option<Totals> {
        None
    }

    /// Case-insensitive substring match of `query` against [`Record::search_fields`].
    /// A blank query matches everything.
    fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Serde helpers for fields written by older front ends.
pub(crate) mod lenient {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};

    /// Reads an optional `YYYY-MM-DD` date, treating `""` as absent.
    pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
