//! Pipeline run metrics.
//!
//! Counters and timings recorded through the `metrics` facade. The crate
//! installs no recorder of its own; an embedder that wants the numbers
//! installs one before running the pipeline.

/// Per-dataset counters and timings, labelled by dataset name.
pub struct PipelineMetrics;

impl PipelineMetrics {
    /// Record how many raw records extraction produced.
    pub fn record_read(dataset: &str, records: usize) {
        ::metrics::counter!("etl_records_read_total", "dataset" => dataset.to_string())
            .increment(records as u64);
    }

    /// Record the cleaner verdicts for one dataset.
    pub fn record_clean(dataset: &str, accepted: usize, rejected: usize, duplicates: usize) {
        ::metrics::counter!("etl_records_accepted_total", "dataset" => dataset.to_string())
            .increment(accepted as u64);
        ::metrics::counter!("etl_records_rejected_total", "dataset" => dataset.to_string())
            .increment(rejected as u64);
        ::metrics::counter!("etl_duplicates_dropped_total", "dataset" => dataset.to_string())
            .increment(duplicates as u64);
    }

    /// Record rows committed by the loader.
    pub fn record_loaded(dataset: &str, rows: usize) {
        ::metrics::counter!("etl_rows_loaded_total", "dataset" => dataset.to_string())
            .increment(rows as u64);
    }

    /// Record a stage timing measurement.
    pub fn record_stage_duration(dataset: &str, stage: &str, duration_secs: f64) {
        ::metrics::histogram!(
            "etl_stage_duration_seconds",
            "dataset" => dataset.to_string(),
            "stage" => stage.to_string()
        )
        .record(duration_secs);
    }

    /// Record a dataset that could not complete its run.
    pub fn record_failure(dataset: &str) {
        ::metrics::counter!("etl_dataset_failures_total", "dataset" => dataset.to_string())
            .increment(1);
    }

    /// Record how long the whole run took, both datasets included.
    pub fn record_run_duration(duration_secs: f64) {
        ::metrics::histogram!("etl_run_duration_seconds").record(duration_secs);
    }
}
