use std::path::Path;

use tracing::debug;

use super::text_field;
use crate::error::ExtractionError;
use crate::types::{FieldValue, RawRecord};

/// Reads a hierarchical feed into raw records, one per record element.
///
/// Each element child of a record element becomes a field named after its
/// tag, with trimmed text as the value. An empty or text-less child becomes
/// `Null`, and so does an expected field whose child element is absent, so
/// every record carries the full expected field set and rejection stays with
/// the cleaners. Elements under the root with a different tag are skipped.
pub struct XmlExtractor {
    record_element: String,
    expected_fields: Vec<String>,
}

impl XmlExtractor {
    pub fn new<S: AsRef<str>>(record_element: impl Into<String>, expected_fields: &[S]) -> Self {
        Self {
            record_element: record_element.into(),
            expected_fields: expected_fields
                .iter()
                .map(|f| f.as_ref().to_string())
                .collect(),
        }
    }

    /// Parse the whole document and flatten record elements in document
    /// order. A structurally malformed document fails the extraction.
    pub fn extract(&self, path: &Path) -> Result<Vec<RawRecord>, ExtractionError> {
        let text = std::fs::read_to_string(path)?;
        let document = roxmltree::Document::parse(&text)?;

        let mut records = Vec::new();
        for node in document.root_element().children().filter(|n| n.is_element()) {
            if node.tag_name().name() != self.record_element {
                continue;
            }
            let mut record = RawRecord::new();
            for child in node.children().filter(|n| n.is_element()) {
                let value = child.text().map(text_field).unwrap_or(FieldValue::Null);
                record.push(child.tag_name().name(), value);
            }
            for field in &self.expected_fields {
                if record.get(field).is_none() {
                    record.push(field.as_str(), FieldValue::Null);
                }
            }
            records.push(record);
        }

        debug!(
            "Extracted {} <{}> records from {}",
            records.len(),
            self.record_element,
            path.display()
        );
        Ok(records)
    }
}
