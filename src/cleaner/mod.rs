//! Record validators and schema mapping.
//!
//! A cleaner takes the raw records of one dataset and classifies each record
//! whole: accept with normalized values, or reject with a single named
//! reason. Accepted records are then mapped onto the persisted column names.
//! Rejections never abort the batch.

pub mod customers;
pub mod orders;

pub use self::customers::{CleanedCustomers, CustomerCleaner, CustomerRecord, CustomerRow};
pub use self::orders::{CleanedOrders, OrderCleaner, OrderRecord, OrderRow};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::types::{FieldValue, RawRecord, RejectReason};

/// Mobile numbers are exactly ten digits and start with 7, 8 or 9.
pub(crate) static MOBILE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[789]\d{9}$").unwrap());

/// What one cleaner did with one dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    /// Records handed to the cleaner.
    pub read: usize,
    /// Records that passed every rule and survived dedup.
    pub accepted: usize,
    /// Records rejected, summed across reasons.
    pub rejected: usize,
    /// Accepted records dropped as natural-key duplicates. Always zero for
    /// datasets without a dedup step.
    pub duplicates: usize,
    /// Rejection counts keyed by reason.
    pub reasons: HashMap<RejectReason, usize>,
}

impl CleanReport {
    pub(crate) fn record_rejection(&mut self, reason: RejectReason) {
        self.rejected += 1;
        *self.reasons.entry(reason).or_default() += 1;
    }

    pub fn rejections_for(&self, reason: RejectReason) -> usize {
        self.reasons.get(&reason).copied().unwrap_or(0)
    }
}

/// A required text field: present and non-empty. Whitespace was already
/// stripped at extraction, so empty means the source had nothing to say.
pub(crate) fn required_text<'a>(record: &'a RawRecord, field: &str) -> Option<&'a str> {
    match record.get(field) {
        Some(FieldValue::Text(text)) if !text.is_empty() => Some(text.as_str()),
        _ => None,
    }
}

/// Capitalize the first letter of every alphabetic run and lowercase the
/// rest, so "south west" becomes "South West" and "NEW-delhi" becomes
/// "New-Delhi".
pub(crate) fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
                at_word_start = false;
            } else {
                out.extend(ch.to_lowercase());
            }
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_pattern_accepts_valid_prefixes() {
        assert!(MOBILE_NUMBER.is_match("9123456781"));
        assert!(MOBILE_NUMBER.is_match("8000000000"));
        assert!(MOBILE_NUMBER.is_match("7999999999"));
    }

    #[test]
    fn test_mobile_pattern_rejects_wrong_shape() {
        assert!(!MOBILE_NUMBER.is_match("1234567890"));
        assert!(!MOBILE_NUMBER.is_match("912345678"));
        assert!(!MOBILE_NUMBER.is_match("91234567812"));
        assert!(!MOBILE_NUMBER.is_match("912345678a"));
        assert!(!MOBILE_NUMBER.is_match(""));
    }

    #[test]
    fn test_title_case_handles_mixed_input() {
        assert_eq!(title_case("south"), "South");
        assert_eq!(title_case("SOUTH west"), "South West");
        assert_eq!(title_case("new-delhi"), "New-Delhi");
    }

    #[test]
    fn test_required_text_sees_null_and_number_as_absent() {
        let mut record = RawRecord::new();
        record.push("region", FieldValue::Text("south".to_string()));
        record.push("blank", FieldValue::Null);
        record.push("count", FieldValue::Number(2.0));

        assert_eq!(required_text(&record, "region"), Some("south"));
        assert_eq!(required_text(&record, "blank"), None);
        assert_eq!(required_text(&record, "count"), None);
        assert_eq!(required_text(&record, "absent"), None);
    }

    #[test]
    fn test_report_accumulates_reasons() {
        let mut report = CleanReport::default();
        report.record_rejection(RejectReason::InvalidMobile);
        report.record_rejection(RejectReason::InvalidMobile);
        report.record_rejection(RejectReason::MissingField);

        assert_eq!(report.rejected, 3);
        assert_eq!(report.rejections_for(RejectReason::InvalidMobile), 2);
        assert_eq!(report.rejections_for(RejectReason::MissingField), 1);
        assert_eq!(report.rejections_for(RejectReason::InvalidDatetime), 0);
    }
}
