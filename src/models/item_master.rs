use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{EntityKind, Record};
use crate::validation::{non_negative, not_blank, FieldErrors};

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
pub enum ItemStatus {
    #[default]
    Active,
    Inactive,
}

/// Messages shown on the item form, per field.
const FIELD_MESSAGES: &[(&str, &str)] = &[
    ("item_code", "Item Code is required"),
    ("description", "Description is required"),
    ("category", "Category is required"),
    ("unit_of_measure", "Unit of Measure is required"),
    ("price", "Price must be zero or positive"),
    ("tax_percent", "Tax % must be zero or positive"),
    ("reorder_level", "Reorder Level must be zero or positive"),
    ("reorder_quantity", "Reorder Quantity must be zero or positive"),
];

/// An inventory item in the item master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemMaster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(custom = "not_blank")]
    pub item_code: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub description: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub category: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub reorder_level: Decimal,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub reorder_quantity: Decimal,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub tax_percent: Decimal,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Record for ItemMaster {
    const KIND: EntityKind = EntityKind::ItemMaster;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn number(&self) -> &str {
        &self.item_code
    }

    fn set_number(&mut self, number: String) {
        self.item_code = number;
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
            item_code: number,
            description: String::new(),
            category: String::new(),
            unit_of_measure: String::new(),
            brand: String::new(),
            model: String::new(),
            barcode: String::new(),
            reorder_level: Decimal::ZERO,
            reorder_quantity: Decimal::ZERO,
            price: Decimal::ZERO,
            tax_percent: Decimal::ZERO,
            supplier: String::new(),
            notes: String::new(),
            status: ItemStatus::Active,
            created_at: now,
        }
    }

    fn sample(now: DateTime<Utc>) -> Self {
        Self {
            id: Some("sample-1".to_string()),
            item_code: "ITM-SAMPLE-0001".to_string(),
            description: "Sample Item - Office Chair".to_string(),
            category: "Furniture".to_string(),
            unit_of_measure: "Each".to_string(),
            brand: "Acme".to_string(),
            model: "AC123".to_string(),
            barcode: "1234567890123".to_string(),
            reorder_level: dec!(5),
            reorder_quantity: dec!(10),
            price: dec!(120.5),
            tax_percent: dec!(10),
            supplier: "Acme Supplies Co.".to_string(),
            notes: "Ergonomic office chair with adjustable height.".to_string(),
            status: ItemStatus::Active,
            created_at: now,
        }
    }

    fn field_errors(&self) -> FieldErrors {
        let mut errors = self.validate().err().map(FieldErrors::from).unwrap_or_default();
        for (field, message) in FIELD_MESSAGES {
            errors.relabel(field, message);
        }
        errors
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.item_code.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            self.barcode.as_str(),
            self.supplier.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_item() -> ItemMaster {
        let mut item = ItemMaster::blank("ITM-20250920-1234".into(), Utc::now());
        item.description = "Printer paper".into();
        item.category = "Stationery".into();
        item.unit_of_measure = "Ream".into();
        item
    }

    #[test]
    fn complete_item_is_valid() {
        assert!(valid_item().field_errors().is_empty());
    }

    #[test]
    fn blank_item_reports_required_text_fields() {
        let item = ItemMaster::blank("ITM-20250920-1234".into(), Utc::now());
        let errors = item.field_errors();

        assert_eq!(errors.get("description"), Some("Description is required"));
        assert_eq!(errors.get("category"), Some("Category is required"));
        assert_eq!(
            errors.get("unit_of_measure"),
            Some("Unit of Measure is required")
        );
        assert!(!errors.contains_key("item_code"));
    }

    #[test]
    fn blank_item_code_names_the_field() {
        let mut item = valid_item();
        item.item_code = "  ".into();
        assert_eq!(
            item.field_errors().get("item_code"),
            Some("Item Code is required")
        );
    }

    #[test]
    fn negative_numbers_are_rejected() {
        let mut item = valid_item();
        item.price = dec!(-1);
        item.tax_percent = dec!(-0.5);
        item.reorder_level = dec!(-2);
        item.reorder_quantity = dec!(-3);

        let errors = item.field_errors();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("price"), Some("Price must be zero or positive"));
        assert_eq!(
            errors.get("reorder_quantity"),
            Some("Reorder Quantity must be zero or positive")
        );
    }

    #[test]
    fn tax_above_hundred_is_allowed_for_items() {
        let mut item = valid_item();
        item.tax_percent = dec!(150);
        assert!(item.field_errors().is_empty());
    }

    #[test]
    fn sample_is_valid_and_searchable() {
        let sample = ItemMaster::sample(Utc::now());
        assert!(sample.field_errors().is_empty());
        assert!(sample.matches("office chair"));
        assert!(sample.matches("furniture"));
        assert!(!sample.matches("stapler"));
    }

    #[test]
    fn reads_payload_written_by_browser_form() {
        let raw = r#"{
            "id": "itm-1726800000000",
            "itemCode": "ITM-20250920-4821",
            "description": "Stapler",
            "category": "Office",
            "unitOfMeasure": "Each",
            "reorderLevel": 2,
            "reorderQuantity": 6,
            "price": 8,
            "taxPercent": 0,
            "status": "Inactive",
            "createdAt": "2025-09-20T10:00:00.000Z"
        }"#;
        let item: ItemMaster = serde_json::from_str(raw).unwrap();

        assert_eq!(item.id(), Some("itm-1726800000000"));
        assert_eq!(item.status, ItemStatus::Inactive);
        assert_eq!(item.price, dec!(8));
        assert!(item.brand.is_empty());
    }
}
