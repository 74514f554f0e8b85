use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{non_negative, not_blank, percentage, positive};

/// Quantity, unit price and tax rate of one priced row.
pub trait LineAmounts {
    fn quantity(&self) -> Decimal;
    fn unit_price(&self) -> Decimal;
    /// Tax as a percentage (5 means 5%).
    fn tax_percent(&self) -> Decimal;
}

/// Bare amounts, for callers that price rows without building a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amounts {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_percent: Decimal,
}

impl Amounts {
    pub fn new(quantity: Decimal, unit_price: Decimal, tax_percent: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
            tax_percent,
        }
    }
}

impl LineAmounts for Amounts {
    fn quantity(&self) -> Decimal {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn tax_percent(&self) -> Decimal {
        self.tax_percent
    }
}

/// A purchase order row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub description: String,
    #[serde(alias = "qty")]
    #[validate(custom = "positive")]
    pub quantity: Decimal,
    #[serde(alias = "price")]
    #[validate(custom = "non_negative")]
    pub unit_price: Decimal,
    #[serde(alias = "tax", default)]
    #[validate(custom = "non_negative")]
    pub tax_percent: Decimal,
}

impl OrderLine {
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        tax_percent: Decimal,
    ) -> Self {
        Self {
            sku: String::new(),
            description: description.into(),
            quantity,
            unit_price,
            tax_percent,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    /// Whether this row alone would satisfy the "at least one valid item" rule.
    pub fn is_complete(&self) -> bool {
        !self.description.trim().is_empty()
            && self.quantity > Decimal::ZERO
            && self.unit_price >= Decimal::ZERO
    }
}

impl Default for OrderLine {
    fn default() -> Self {
        Self::new("", Decimal::ONE, Decimal::ZERO, Decimal::ZERO)
    }
}

impl LineAmounts for OrderLine {
    fn quantity(&self) -> Decimal {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn tax_percent(&self) -> Decimal {
        self.tax_percent
    }
}

/// A goods receipt row. Totals are taken on the accepted quantity only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    #[serde(default)]
    pub description: String,
    #[serde(alias = "qtyAccepted", alias = "quantity")]
    #[validate(custom = "non_negative")]
    pub quantity_accepted: Decimal,
    #[serde(alias = "qtyRejected", default)]
    #[validate(custom = "non_negative")]
    pub quantity_rejected: Decimal,
    #[validate(custom = "non_negative")]
    pub unit_price: Decimal,
    #[serde(default)]
    #[validate(custom = "percentage")]
    pub tax_percent: Decimal,
}

impl ReceiptLine {
    pub fn new(
        description: impl Into<String>,
        quantity_accepted: Decimal,
        quantity_rejected: Decimal,
        unit_price: Decimal,
        tax_percent: Decimal,
    ) -> Self {
        Self {
            description: description.into(),
            quantity_accepted,
            quantity_rejected,
            unit_price,
            tax_percent,
        }
    }
}

impl LineAmounts for ReceiptLine {
    fn quantity(&self) -> Decimal {
        self.quantity_accepted
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn tax_percent(&self) -> Decimal {
        self.tax_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_line_reads_short_field_names() {
        let line: OrderLine = serde_json::from_str(
            r#"{"id": 1, "sku": "SKU-101", "description": "Paper A4 500pk", "qty": 2, "price": 5.5, "tax": 5}"#,
        )
        .unwrap();

        assert_eq!(line.sku, "SKU-101");
        assert_eq!(line.quantity, dec!(2));
        assert_eq!(line.unit_price, dec!(5.5));
        assert_eq!(line.tax_percent, dec!(5));
    }

    #[test]
    fn receipt_line_reads_short_field_names() {
        let line: ReceiptLine = serde_json::from_str(
            r#"{"description": "Men face W", "qtyAccepted": 10, "qtyRejected": 1, "unitPrice": 12, "taxPercent": 40}"#,
        )
        .unwrap();

        assert_eq!(line.quantity_accepted, dec!(10));
        assert_eq!(line.quantity_rejected, dec!(1));
        assert_eq!(LineAmounts::quantity(&line), dec!(10));
    }

    #[test]
    fn default_order_line_has_quantity_one() {
        let line = OrderLine::default();
        assert_eq!(line.quantity, Decimal::ONE);
        assert!(!line.is_complete());
    }

    #[test]
    fn order_line_validation_flags_each_field() {
        let line = OrderLine::new(" ", dec!(0), dec!(-1), dec!(-5));
        let errors = crate::validation::FieldErrors::from(line.validate().unwrap_err());

        assert!(errors.contains_key("description"));
        assert!(errors.contains_key("quantity"));
        assert!(errors.contains_key("unit_price"));
        assert!(errors.contains_key("tax_percent"));
    }

    #[test]
    fn order_line_tax_has_no_upper_bound() {
        let line = OrderLine::new("Paper", dec!(1), dec!(10), dec!(150));
        assert!(line.validate().is_ok());
    }

    #[test]
    fn receipt_line_tax_is_capped_at_hundred() {
        let line = ReceiptLine::new("Toner", dec!(1), dec!(0), dec!(10), dec!(150));
        let errors = crate::validation::FieldErrors::from(line.validate().unwrap_err());
        assert_eq!(
            errors.get("tax_percent"),
            Some(crate::validation::PERCENT_MESSAGE)
        );
    }

    #[test]
    fn receipt_line_allows_zero_quantities() {
        let line = ReceiptLine::new("", dec!(0), dec!(0), dec!(0), dec!(0));
        assert!(line.validate().is_ok());
    }
}
