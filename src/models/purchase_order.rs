use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{lenient, EntityKind, OrderLine, Record};
use crate::services::totals::{compute_totals, Totals};
use crate::validation::{
    non_negative, not_blank, FieldErrors, REQUIRED_MESSAGE, TOTAL_OVERFLOW_MESSAGE,
};

/// A supplier that purchase orders can be raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vendor {
    pub id: &'static str,
    pub name: &'static str,
}

/// Fixed vendor catalog offered when raising a purchase order.
pub const VENDORS: &[Vendor] = &[
    Vendor {
        id: "v-001",
        name: "Acme Supplies Co.",
    },
    Vendor {
        id: "v-002",
        name: "Blue Ocean Traders",
    },
    Vendor {
        id: "v-003",
        name: "Evergreen Materials",
    },
];

pub fn find_vendor(id: &str) -> Option<&'static Vendor> {
    VENDORS.iter().find(|vendor| vendor.id == id)
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum PurchaseOrderStatus {
    #[default]
    Draft,
    Approved,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub po_number: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub vendor_id: String,
    #[serde(default)]
    pub vendor_name: String,
    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub order_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub expected_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub status: PurchaseOrderStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// Sets the vendor and copies its display name. Unknown ids leave the name empty.
    pub fn select_vendor(&mut self, vendor_id: &str) {
        self.vendor_id = vendor_id.to_string();
        self.vendor_name = find_vendor(vendor_id)
            .map(|vendor| vendor.name.to_string())
            .unwrap_or_default();
    }

    pub fn add_line(&mut self) -> &mut OrderLine {
        self.items.push(OrderLine::default());
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    /// Removes the row at `index`. The order always keeps at least one (possibly empty) row.
    pub fn remove_line(&mut self, index: usize) -> Option<OrderLine> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        if self.items.is_empty() {
            self.items.push(OrderLine::default());
        }
        Some(removed)
    }

    /// Total ordered quantity across all rows.
    pub fn item_count(&self) -> Decimal {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

impl Record for PurchaseOrder {
    const KIND: EntityKind = EntityKind::PurchaseOrder;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn number(&self) -> &str {
        &self.po_number
    }

    fn set_number(&mut self, number: String) {
        self.po_number = number;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = created_at;
    }

    fn blank(number: String, now: DateTime<Utc>) -> Self {
        let default_vendor = VENDORS[0];
        Self {
            id: None,
            po_number: number,
            vendor_id: default_vendor.id.to_string(),
            vendor_name: default_vendor.name.to_string(),
            billing_address: String::new(),
            shipping_address: String::new(),
            order_date: Some(now.date_naive()),
            expected_date: None,
            shipping_fee: Decimal::ZERO,
            notes: String::new(),
            items: vec![OrderLine::default()],
            status: PurchaseOrderStatus::Draft,
            created_at: now,
        }
    }

    fn sample(now: DateTime<Utc>) -> Self {
        let vendor = VENDORS[1];
        Self {
            id: Some("sample-1".to_string()),
            po_number: "PO-SAMPLE-0001".to_string(),
            vendor_id: vendor.id.to_string(),
            vendor_name: vendor.name.to_string(),
            billing_address: "123 Sample St, Suite 100".to_string(),
            shipping_address: "Warehouse 5, Dock 2".to_string(),
            order_date: Some(now.date_naive()),
            expected_date: None,
            shipping_fee: dec!(25),
            notes: String::new(),
            items: vec![
                OrderLine::new("Paper A4 500pk", dec!(2), dec!(5.5), dec!(5)).with_sku("SKU-101"),
                OrderLine::new("Staplers", dec!(3), dec!(8), dec!(0)).with_sku("SKU-202"),
            ],
            status: PurchaseOrderStatus::Approved,
            created_at: now,
        }
    }

    fn field_errors(&self) -> FieldErrors {
        let mut errors = self.validate().err().map(FieldErrors::from).unwrap_or_default();

        if !self.vendor_id.trim().is_empty() && find_vendor(&self.vendor_id).is_none() {
            errors.insert("vendor_id", "Unknown vendor");
        }
        if self.order_date.is_none() {
            errors.insert("order_date", REQUIRED_MESSAGE);
        }

        if self.items.is_empty() {
            errors.insert("items", "At least one item is required");
            return errors;
        }
        for (index, line) in self.items.iter().enumerate() {
            if let Err(line_errors) = line.validate() {
                errors.extend_prefixed(&format!("items[{}]", index), line_errors.into());
            }
        }
        if !self.items.iter().any(OrderLine::is_complete) {
            errors.insert("items", "At least one valid item is required");
        }
        if self.totals().is_none() {
            errors.insert("items", TOTAL_OVERFLOW_MESSAGE);
        }
        errors
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.po_number.as_str(), self.vendor_name.as_str()]
    }

    fn totals(&self) -> Option<Totals> {
        compute_totals(&self.items, self.shipping_fee)
    }
}
