use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use super::{required_text, title_case, CleanReport, MOBILE_NUMBER};
use crate::types::{RawRecord, RecordOutcome, RejectReason};

/// Columns the customer feed must carry.
pub const REQUIRED_COLUMNS: [&str; 4] =
    ["customer_id", "customer_name", "mobile_number", "region"];

/// A customer that passed every rule, still under source field names.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub customer_name: String,
    pub mobile_number: String,
    pub region: String,
}

/// A customer shaped for the `customers` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRow {
    pub customerid: String,
    pub customername: String,
    pub mobilenumber: String,
    pub region: String,
}

impl From<CustomerRecord> for CustomerRow {
    fn from(record: CustomerRecord) -> Self {
        Self {
            customerid: record.customer_id,
            customername: record.customer_name,
            mobilenumber: record.mobile_number,
            region: record.region,
        }
    }
}

/// Rows and accounting for one cleaned customer batch.
#[derive(Debug)]
pub struct CleanedCustomers {
    pub rows: Vec<CustomerRow>,
    pub report: CleanReport,
}

/// Validates, deduplicates and maps the customer feed.
pub struct CustomerCleaner;

impl CustomerCleaner {
    /// Classify a single record. All four fields must be present and the
    /// mobile number must match the subscriber pattern; the region of an
    /// accepted record is normalized to title case. One failing rule rejects
    /// the whole record.
    pub fn check(record: &RawRecord) -> RecordOutcome<CustomerRecord> {
        let (Some(customer_id), Some(customer_name), Some(mobile_number), Some(region)) = (
            required_text(record, "customer_id"),
            required_text(record, "customer_name"),
            required_text(record, "mobile_number"),
            required_text(record, "region"),
        ) else {
            return RecordOutcome::Rejected(RejectReason::MissingField);
        };

        if !MOBILE_NUMBER.is_match(mobile_number) {
            return RecordOutcome::Rejected(RejectReason::InvalidMobile);
        }

        RecordOutcome::Accepted(CustomerRecord {
            customer_id: customer_id.to_string(),
            customer_name: customer_name.to_string(),
            mobile_number: mobile_number.to_string(),
            region: title_case(region),
        })
    }

    /// Clean a whole batch: validate every record, drop natural-key
    /// duplicates on `(customer_id, mobile_number)` keeping the first
    /// occurrence, and map survivors onto persisted column names.
    pub fn clean(records: &[RawRecord]) -> CleanedCustomers {
        let mut report = CleanReport {
            read: records.len(),
            ..Default::default()
        };
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut rows = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match Self::check(record) {
                RecordOutcome::Accepted(customer) => {
                    let key = (customer.customer_id.clone(), customer.mobile_number.clone());
                    if !seen.insert(key) {
                        report.duplicates += 1;
                        debug!(
                            "Dropped duplicate customer at row {}: ({}, {})",
                            index, customer.customer_id, customer.mobile_number
                        );
                        continue;
                    }
                    report.accepted += 1;
                    rows.push(CustomerRow::from(customer));
                }
                RecordOutcome::Rejected(reason) => {
                    debug!("Rejected customer at row {}: {}", index, reason);
                    report.record_rejection(reason);
                }
            }
        }

        info!(
            "Cleaned customers: {} accepted, {} rejected, {} duplicates dropped",
            report.accepted, report.rejected, report.duplicates
        );
        CleanedCustomers { rows, report }
    }
}
