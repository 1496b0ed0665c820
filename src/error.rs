use thiserror::Error;

/// Errors raised while reading a feed into raw records.
///
/// Extraction failures abort the run for that dataset; per-record problems
/// inside a well-formed feed are handled by the cleaners as rejections, not
/// as errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("missing required columns in header: {0}")]
    MissingHeader(String),
}

/// Errors raised while writing cleaned rows to the store.
#[derive(Error, Debug)]
#[error("failed to load table {table}: {source}")]
pub struct LoadError {
    pub table: String,
    #[source]
    pub source: rusqlite::Error,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
