use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use super::{required_text, CleanReport, MOBILE_NUMBER};
use crate::types::{FieldValue, RawRecord, RecordOutcome, RejectReason};

/// Child elements every order record must carry.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "order_id",
    "mobile_number",
    "order_date_time",
    "sku_id",
    "sku_count",
    "total_amount",
];

/// Order identifiers look like `ORD-2025-0001`: a four-digit year block and
/// a sequence number.
static ORDER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ORD-\d{4}-\d+$").unwrap());

/// Timestamps arrive ISO-ish with a `T` separator and are persisted with a
/// space instead.
const INPUT_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";
const CANONICAL_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// An order that passed every rule, with typed values.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub mobile_number: String,
    pub order_datetime: NaiveDateTime,
    pub sku_id: String,
    pub sku_count: i64,
    pub total_amount: f64,
}

/// An order shaped for the `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    pub orderid: String,
    pub mobilenumber: String,
    pub orderdatetime: String,
    pub skuid: String,
    pub skucount: i64,
    pub totalamount: f64,
}

impl From<OrderRecord> for OrderRow {
    fn from(record: OrderRecord) -> Self {
        Self {
            orderid: record.order_id,
            mobilenumber: record.mobile_number,
            orderdatetime: record.order_datetime.format(CANONICAL_DATETIME).to_string(),
            skuid: record.sku_id,
            skucount: record.sku_count,
            totalamount: record.total_amount,
        }
    }
}

/// Rows and accounting for one cleaned order batch.
#[derive(Debug)]
pub struct CleanedOrders {
    pub rows: Vec<OrderRow>,
    pub report: CleanReport,
}

/// Validates and maps the order feed. Orders are not deduplicated: repeated
/// order ids flow through untouched.
pub struct OrderCleaner;

impl OrderCleaner {
    /// Classify a single record. Rules run in a fixed order and the first
    /// failure names the rejection: presence of all six fields, order id
    /// shape, mobile pattern, timestamp parse, then the positivity checks.
    pub fn check(record: &RawRecord) -> RecordOutcome<OrderRecord> {
        if REQUIRED_FIELDS.iter().any(|field| missing(record, field)) {
            return RecordOutcome::Rejected(RejectReason::MissingField);
        }

        let (Some(order_id), Some(mobile_number), Some(datetime_text), Some(sku_id)) = (
            required_text(record, "order_id"),
            required_text(record, "mobile_number"),
            required_text(record, "order_date_time"),
            required_text(record, "sku_id"),
        ) else {
            return RecordOutcome::Rejected(RejectReason::MissingField);
        };

        if !ORDER_ID.is_match(order_id) {
            return RecordOutcome::Rejected(RejectReason::InvalidOrderId);
        }
        if !MOBILE_NUMBER.is_match(mobile_number) {
            return RecordOutcome::Rejected(RejectReason::InvalidMobile);
        }

        let order_datetime = match NaiveDateTime::parse_from_str(datetime_text, INPUT_DATETIME) {
            Ok(parsed) => parsed,
            Err(_) => return RecordOutcome::Rejected(RejectReason::InvalidDatetime),
        };

        let Some(sku_count) = positive_int(record, "sku_count") else {
            return RecordOutcome::Rejected(RejectReason::NonPositiveQuantity);
        };
        let Some(total_amount) = positive_amount(record, "total_amount") else {
            return RecordOutcome::Rejected(RejectReason::NonPositiveAmount);
        };

        RecordOutcome::Accepted(OrderRecord {
            order_id: order_id.to_string(),
            mobile_number: mobile_number.to_string(),
            order_datetime,
            sku_id: sku_id.to_string(),
            sku_count,
            total_amount,
        })
    }

    /// Clean a whole batch: validate every record and map the accepted ones
    /// onto persisted column names, in input order.
    pub fn clean(records: &[RawRecord]) -> CleanedOrders {
        let mut report = CleanReport {
            read: records.len(),
            ..Default::default()
        };
        let mut rows = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match Self::check(record) {
                RecordOutcome::Accepted(order) => {
                    report.accepted += 1;
                    rows.push(OrderRow::from(order));
                }
                RecordOutcome::Rejected(reason) => {
                    debug!("Rejected order at record {}: {}", index, reason);
                    report.record_rejection(reason);
                }
            }
        }

        info!(
            "Cleaned orders: {} accepted, {} rejected",
            report.accepted, report.rejected
        );
        CleanedOrders { rows, report }
    }
}

/// A field counts as missing when it is absent, `Null`, or empty text.
/// Typed numbers are present by definition.
fn missing(record: &RawRecord, field: &str) -> bool {
    match record.get(field) {
        Some(FieldValue::Text(text)) => text.is_empty(),
        Some(FieldValue::Number(_)) => false,
        _ => true,
    }
}

/// Strictly positive whole number, from either a typed number with no
/// fractional part or text that parses as an integer.
fn positive_int(record: &RawRecord, field: &str) -> Option<i64> {
    let value = match record.get(field) {
        Some(FieldValue::Number(n)) if n.fract() == 0.0 => Some(*n as i64),
        Some(FieldValue::Text(text)) => text.parse::<i64>().ok(),
        _ => None,
    };
    value.filter(|v| *v > 0)
}

/// Strictly positive amount, from a typed number or text that parses as a
/// decimal.
fn positive_amount(record: &RawRecord, field: &str) -> Option<f64> {
    let value = match record.get(field) {
        Some(FieldValue::Number(n)) => Some(*n),
        Some(FieldValue::Text(text)) => text.parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| *v > 0.0)
}
