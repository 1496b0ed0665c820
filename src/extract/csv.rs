use std::fs::File;
use std::path::Path;

use tracing::debug;

use super::text_field;
use crate::error::ExtractionError;
use crate::types::{FieldValue, RawRecord};

/// Reads a headered tabular feed into raw records.
///
/// The header row must contain every required column; order does not matter
/// and extra columns are carried through untouched. Cell whitespace is
/// stripped during the read, and a cell that is empty after stripping
/// becomes `Null`. A data row shorter than the header is padded with `Null`
/// rather than failing the file, so the cleaners get to reject it
/// per-record.
pub struct CsvExtractor {
    required_columns: Vec<String>,
}

impl CsvExtractor {
    pub fn new<S: AsRef<str>>(required_columns: &[S]) -> Self {
        Self {
            required_columns: required_columns
                .iter()
                .map(|c| c.as_ref().to_string())
                .collect(),
        }
    }

    /// Read every data row of the file, in file order.
    pub fn extract(&self, path: &Path) -> Result<Vec<RawRecord>, ExtractionError> {
        let file = File::open(path)?;
        let mut reader = ::csv::ReaderBuilder::new()
            .trim(::csv::Trim::All)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = self
            .required_columns
            .iter()
            .map(|c| c.as_str())
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(ExtractionError::MissingHeader(missing.join(", ")));
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let mut record = RawRecord::new();
            for (idx, column) in headers.iter().enumerate() {
                let value = row.get(idx).map(text_field).unwrap_or(FieldValue::Null);
                record.push(column, value);
            }
            records.push(record);
        }

        debug!("Extracted {} rows from {}", records.len(), path.display());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const COLUMNS: [&str; 4] = ["customer_id", "customer_name", "mobile_number", "region"];

    fn write_feed(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_extracts_rows_in_file_order() {
        let file = write_feed(
            "customer_id,customer_name,mobile_number,region\n\
             C001, Asha Rao ,9123456781,south\n\
             C002,Vikram Iyer,9988776655,north\n",
        );

        let records = CsvExtractor::new(&COLUMNS).extract(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get("customer_name").and_then(|v| v.as_text()),
            Some("Asha Rao")
        );
        assert_eq!(
            records[1].get("customer_id").and_then(|v| v.as_text()),
            Some("C002")
        );
    }

    #[test]
    fn test_empty_cell_becomes_null() {
        let file = write_feed(
            "customer_id,customer_name,mobile_number,region\n\
             C001,,9123456781,south\n",
        );

        let records = CsvExtractor::new(&COLUMNS).extract(file.path()).unwrap();
        assert_eq!(records[0].get("customer_name"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_short_row_is_padded_with_nulls() {
        let file = write_feed(
            "customer_id,customer_name,mobile_number,region\n\
             C001,Asha Rao,9123456781\n\
             C002,Vikram Iyer,9988776655,north\n",
        );

        let records = CsvExtractor::new(&COLUMNS).extract(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("region"), Some(&FieldValue::Null));
        assert_eq!(records[0].len(), 4);
        assert_eq!(records[1].get("region").and_then(|v| v.as_text()), Some("north"));
    }

    #[test]
    fn test_header_order_is_irrelevant_and_extras_are_kept() {
        let file = write_feed(
            "region,customer_id,notes,customer_name,mobile_number\n\
             south,C001,vip,Asha Rao,9123456781\n",
        );

        let records = CsvExtractor::new(&COLUMNS).extract(file.path()).unwrap();
        assert_eq!(records[0].len(), 5);
        assert_eq!(records[0].get("notes").and_then(|v| v.as_text()), Some("vip"));
    }

    #[test]
    fn test_missing_column_is_named_in_error() {
        let file = write_feed("customer_id,customer_name,region\nC001,Asha Rao,south\n");

        let err = CsvExtractor::new(&COLUMNS).extract(file.path()).unwrap_err();
        match err {
            ExtractionError::MissingHeader(cols) => assert_eq!(cols, "mobile_number"),
            other => panic!("expected MissingHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_reports_all_columns_missing() {
        let file = write_feed("");

        let err = CsvExtractor::new(&COLUMNS).extract(file.path()).unwrap_err();
        match err {
            ExtractionError::MissingHeader(cols) => {
                assert_eq!(cols, "customer_id, customer_name, mobile_number, region")
            }
            other => panic!("expected MissingHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = CsvExtractor::new(&COLUMNS)
            .extract(Path::new("/nonexistent/customers.csv"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
