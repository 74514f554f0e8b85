//! Field-level validation for records.
//!
//! Each record type derives [`validator::Validate`] for its scalar fields and layers the rules
//! that need context (line items, catalog lookups) on top. Everything is flattened into a
//! [`FieldErrors`] map keyed by field path, e.g. `item_code` or `items[2].quantity`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::models::Record;

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const NON_NEGATIVE_MESSAGE: &str = "Must be zero or positive";
pub const POSITIVE_MESSAGE: &str = "Must be greater than zero";
pub const PERCENT_MESSAGE: &str = "Must be between 0 and 100";
pub const TOTAL_OVERFLOW_MESSAGE: &str = "Amounts are too large to total";

/// Mapping from field path to a single human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`. The first message recorded for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replaces the message already recorded for `field`, if any.
    pub fn relabel(&mut self, field: &str, message: &str) {
        if let Some(existing) = self.0.get_mut(field) {
            *existing = message.to_string();
        }
    }

    /// Merges `other` in, prefixing every field with `prefix` (`items[0]` + `quantity`).
    pub fn extend_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(format!("{}.{}", prefix, field), message);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        flatten_into(&mut out, None, errors);
        out
    }
}

fn flatten_into(out: &mut FieldErrors, prefix: Option<&str>, errors: ValidationErrors) {
    for (field, kind) in errors.into_errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(first) = list.first() {
                    out.insert(path, message_for(first));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_into(out, Some(&path), *nested),
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    flatten_into(out, Some(&format!("{}[{}]", path, index)), *nested);
                }
            }
        }
    }
}

fn message_for(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Rejects empty and whitespace-only text.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("required", REQUIRED_MESSAGE));
    }
    Ok(())
}

pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(rule_error("non_negative", NON_NEGATIVE_MESSAGE));
    }
    Ok(())
}

pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(rule_error("positive", POSITIVE_MESSAGE));
    }
    Ok(())
}

pub fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > dec!(100) {
        return Err(rule_error("percentage", PERCENT_MESSAGE));
    }
    Ok(())
}

/// Validates a record of any entity type. Returns an empty map iff the record may be saved.
pub fn validate<R: Record>(record: &R) -> FieldErrors {
    record.field_errors()
}
