use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{lenient, EntityKind, ReceiptLine, Record};
use crate::services::totals::{compute_totals, Totals};
use crate::validation::{
    non_negative, not_blank, FieldErrors, REQUIRED_MESSAGE, TOTAL_OVERFLOW_MESSAGE,
};

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
pub enum ReceiptStatus {
    #[default]
    Pending,
    Received,
    #[serde(rename = "Partially Received")]
    #[strum(to_string = "Partially Received", serialize = "partially-received")]
    PartiallyReceived,
    Rejected,
}

/// Charges billed on top of the received lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OtherCharges {
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoodsReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub gr_number: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub po_number: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub supplier: String,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub receipt_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ReceiptStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub items: Vec<ReceiptLine>,
    #[serde(default)]
    #[validate]
    pub other_charges: OtherCharges,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl GoodsReceipt {
    pub fn add_line(&mut self) -> &mut ReceiptLine {
        self.items.push(ReceiptLine::default());
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    pub fn remove_line(&mut self, index: usize) -> Option<ReceiptLine> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn accepted_count(&self) -> Decimal {
        self.items.iter().map(|line| line.quantity_accepted).sum()
    }

    pub fn rejected_count(&self) -> Decimal {
        self.items.iter().map(|line| line.quantity_rejected).sum()
    }
}

impl Record for GoodsReceipt {
    const KIND: EntityKind = EntityKind::GoodsReceipt;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn number(&self) -> &str {
        &self.gr_number
    }

    fn set_number(&mut self, number: String) {
        self.gr_number = number;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = created_at;
    }

    fn blank(number: String, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            gr_number: number,
            po_number: String::new(),
            supplier: String::new(),
            receipt_date: Some(now.date_naive()),
            status: ReceiptStatus::Pending,
            description: String::new(),
            billing_address: String::new(),
            shipping_address: String::new(),
            items: vec![ReceiptLine::default()],
            other_charges: OtherCharges::default(),
            created_at: now,
        }
    }

    fn sample(now: DateTime<Utc>) -> Self {
        let address = "DLF phase 3, Moti nagar industrial Area, Delhi,110008 India";
        Self {
            id: Some("sample-1".to_string()),
            gr_number: "GR-20250920-1001".to_string(),
            po_number: "PO-20250912-6424".to_string(),
            supplier: "Acme Supplies Co.".to_string(),
            receipt_date: NaiveDate::from_ymd_opt(2025, 9, 20),
            status: ReceiptStatus::Received,
            description: String::new(),
            billing_address: address.to_string(),
            shipping_address: address.to_string(),
            items: vec![
                ReceiptLine::new("Men face W", dec!(10), dec!(0), dec!(12), dec!(40)),
                ReceiptLine::new("Men Face c", dec!(14), dec!(1), dec!(17), dec!(10)),
            ],
            other_charges: OtherCharges {
                shipping_fee: dec!(110),
                notes: "Goods received and inspected".to_string(),
            },
            created_at: now,
        }
    }

    fn field_errors(&self) -> FieldErrors {
        let mut errors = self.validate().err().map(FieldErrors::from).unwrap_or_default();

        if self.receipt_date.is_none() {
            errors.insert("receipt_date", REQUIRED_MESSAGE);
        }
        if self.items.is_empty() {
            errors.insert("items", "At least one item is required");
        }
        for (index, line) in self.items.iter().enumerate() {
            if let Err(line_errors) = line.validate() {
                errors.extend_prefixed(&format!("items[{}]", index), line_errors.into());
            }
        }
        if self.totals().is_none() {
            errors.insert("items", TOTAL_OVERFLOW_MESSAGE);
        }
        errors
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.gr_number.as_str(),
            self.po_number.as_str(),
            self.supplier.as_str(),
        ]
    }

    fn totals(&self) -> Option<Totals> {
        compute_totals(&self.items, self.other_charges.shipping_fee)
    }
}
