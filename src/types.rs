use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar as pulled out of a feed, before any validation.
///
/// Extractors tag what they saw instead of guessing a type: text stays
/// `Text`, an absent or empty value becomes `Null`, and `Number` is reserved
/// for sources that carry typed numerics. Validators match on the kind they
/// expect and never coerce implicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One record as read from a feed. Field order follows source order.
///
/// Records are ephemeral: they exist between extraction and validation and
/// are never persisted. Lookup is linear, which is fine for the handful of
/// fields a feed row carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, FieldValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    /// First field with the given name, or `None` if the feed never
    /// carried it.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Why a record was rejected. Rendered in snake_case in logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingField,
    InvalidMobile,
    InvalidOrderId,
    InvalidDatetime,
    NonPositiveAmount,
    NonPositiveQuantity,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingField => "missing_field",
            RejectReason::InvalidMobile => "invalid_mobile",
            RejectReason::InvalidOrderId => "invalid_order_id",
            RejectReason::InvalidDatetime => "invalid_datetime",
            RejectReason::NonPositiveAmount => "non_positive_amount",
            RejectReason::NonPositiveQuantity => "non_positive_quantity",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record classification produced by a cleaner. A record is either
/// accepted with its canonical form or rejected with a single reason; there
/// is no partial acceptance.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome<T> {
    Accepted(T),
    Rejected(RejectReason),
}
