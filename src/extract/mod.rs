//! Format extractors: read a feed file into untyped raw records.
//!
//! Extraction only flattens the source format. It fails fast on files the
//! pipeline cannot read at all (missing file, broken header, malformed
//! document) and defers every per-record judgement to the cleaners.

pub mod csv;
pub mod xml;

pub use self::csv::CsvExtractor;
pub use self::xml::XmlExtractor;

use crate::types::FieldValue;

/// Trimmed text from a source cell. Empty after trimming means the source
/// carried no value, which is `Null`.
pub(crate) fn text_field(raw: &str) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::Text(trimmed.to_string())
    }
}
