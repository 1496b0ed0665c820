use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::cleaner::{
    customers, orders, CleanReport, CustomerCleaner, CustomerRow, OrderCleaner, OrderRow,
};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::extract::{CsvExtractor, XmlExtractor};
use crate::loader::{BatchLoader, BatchRow};
use crate::metrics::PipelineMetrics;

const CUSTOMERS: &str = "customers";
const ORDERS: &str = "orders";

/// Where a dataset is in its pass through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatasetStatus {
    Idle,
    Extracting,
    Validating,
    Loading,
    Done,
    Failed,
}

/// What happened to one dataset during a run. A failed dataset keeps the
/// counts it reached before the failure and never disturbs the other one.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetOutcome {
    pub dataset: String,
    pub status: DatasetStatus,
    pub read: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub loaded: usize,
    pub error: Option<String>,
}

impl DatasetOutcome {
    fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            status: DatasetStatus::Idle,
            read: 0,
            accepted: 0,
            rejected: 0,
            duplicates: 0,
            loaded: 0,
            error: None,
        }
    }

    fn absorb(&mut self, report: &CleanReport) {
        self.read = report.read;
        self.accepted = report.accepted;
        self.rejected = report.rejected;
        self.duplicates = report.duplicates;
    }

    fn fail(&mut self, error: impl std::fmt::Display) {
        self.status = DatasetStatus::Failed;
        self.error = Some(error.to_string());
    }

    pub fn is_failed(&self) -> bool {
        self.status == DatasetStatus::Failed
    }
}

/// Result of a complete pipeline run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub datasets: Vec<DatasetOutcome>,
}

impl RunSummary {
    pub fn any_failed(&self) -> bool {
        self.datasets.iter().any(|d| d.is_failed())
    }

    /// Persist the summary as pretty JSON for downstream inspection.
    pub fn persist_to_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Sequences extract, clean and load for both feeds and aggregates one
/// outcome per dataset. The orchestrator holds no business rules of its
/// own; it owns ordering, isolation between datasets, and accounting.
pub struct EtlPipeline {
    batch_size: usize,
}

impl EtlPipeline {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.load.batch_size)
    }

    /// Run both datasets through the pipeline against the given store
    /// connection. Cleaning runs on blocking workers so the two feeds
    /// overlap; loads run one after the other on the single connection.
    /// The connection is released before the summary is returned.
    #[instrument(
        skip(self, conn, customers_csv, orders_xml),
        fields(run_id = tracing::field::Empty)
    )]
    pub async fn run(
        &self,
        mut conn: Connection,
        customers_csv: &Path,
        orders_xml: &Path,
    ) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(&run_id));
        let started_at = Utc::now();
        let t_run = Instant::now();

        info!("🚀 Starting feed run {}", run_id);
        println!("🚀 Starting feed run {}", run_id);

        BatchLoader::ensure_schema(&conn)?;

        let customers_path = customers_csv.to_path_buf();
        let orders_path = orders_xml.to_path_buf();

        // File parsing and validation are blocking work; keep them off the
        // async runtime and let the two datasets overlap.
        let customers_task = tokio::task::spawn_blocking(move || clean_customers(&customers_path));
        let orders_task = tokio::task::spawn_blocking(move || clean_orders(&orders_path));
        let (customers_cleaned, orders_cleaned) = tokio::join!(customers_task, orders_task);

        let (mut customers_outcome, customer_rows) = unwrap_worker(CUSTOMERS, customers_cleaned);
        let (mut orders_outcome, order_rows) = unwrap_worker(ORDERS, orders_cleaned);

        // Loads never interleave: one table at a time on the one connection.
        let loader = BatchLoader::new(self.batch_size);
        load_dataset(&mut customers_outcome, &customer_rows, &mut conn, &loader);
        load_dataset(&mut orders_outcome, &order_rows, &mut conn, &loader);

        // The store handle is released before the summary is reported,
        // on failure paths included.
        drop(conn);

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            datasets: vec![customers_outcome, orders_outcome],
        };
        PipelineMetrics::record_run_duration(t_run.elapsed().as_secs_f64());

        info!("🏁 Finished feed run {}", run_id);
        println!("🏁 Finished feed run {}", run_id);
        Ok(summary)
    }
}

/// Extract and clean the customer feed. Runs on a blocking worker.
fn clean_customers(path: &Path) -> (DatasetOutcome, Vec<CustomerRow>) {
    let mut outcome = DatasetOutcome::new(CUSTOMERS);

    outcome.status = DatasetStatus::Extracting;
    info!("📡 Extracting customers from {}", path.display());
    let t_extract = Instant::now();
    let records = match CsvExtractor::new(&customers::REQUIRED_COLUMNS).extract(path) {
        Ok(records) => records,
        Err(e) => {
            error!("Customer extraction failed: {}", e);
            PipelineMetrics::record_failure(CUSTOMERS);
            outcome.fail(PipelineError::Extraction(e));
            return (outcome, Vec::new());
        }
    };
    PipelineMetrics::record_read(CUSTOMERS, records.len());
    PipelineMetrics::record_stage_duration(CUSTOMERS, "extract", t_extract.elapsed().as_secs_f64());
    outcome.read = records.len();

    outcome.status = DatasetStatus::Validating;
    let t_clean = Instant::now();
    let cleaned = CustomerCleaner::clean(&records);
    PipelineMetrics::record_clean(
        CUSTOMERS,
        cleaned.report.accepted,
        cleaned.report.rejected,
        cleaned.report.duplicates,
    );
    PipelineMetrics::record_stage_duration(CUSTOMERS, "clean", t_clean.elapsed().as_secs_f64());
    outcome.absorb(&cleaned.report);

    (outcome, cleaned.rows)
}

/// Extract and clean the order feed. Runs on a blocking worker.
fn clean_orders(path: &Path) -> (DatasetOutcome, Vec<OrderRow>) {
    let mut outcome = DatasetOutcome::new(ORDERS);

    outcome.status = DatasetStatus::Extracting;
    info!("📡 Extracting orders from {}", path.display());
    let t_extract = Instant::now();
    let records = match XmlExtractor::new("order", &orders::REQUIRED_FIELDS).extract(path) {
        Ok(records) => records,
        Err(e) => {
            error!("Order extraction failed: {}", e);
            PipelineMetrics::record_failure(ORDERS);
            outcome.fail(PipelineError::Extraction(e));
            return (outcome, Vec::new());
        }
    };
    PipelineMetrics::record_read(ORDERS, records.len());
    PipelineMetrics::record_stage_duration(ORDERS, "extract", t_extract.elapsed().as_secs_f64());
    outcome.read = records.len();

    outcome.status = DatasetStatus::Validating;
    let t_clean = Instant::now();
    let cleaned = OrderCleaner::clean(&records);
    PipelineMetrics::record_clean(
        ORDERS,
        cleaned.report.accepted,
        cleaned.report.rejected,
        cleaned.report.duplicates,
    );
    PipelineMetrics::record_stage_duration(ORDERS, "clean", t_clean.elapsed().as_secs_f64());
    outcome.absorb(&cleaned.report);

    (outcome, cleaned.rows)
}

/// Turn a worker join result into its outcome, converting a panicked or
/// cancelled worker into a failed dataset instead of tearing down the run.
fn unwrap_worker<R>(
    dataset: &str,
    joined: std::result::Result<(DatasetOutcome, Vec<R>), tokio::task::JoinError>,
) -> (DatasetOutcome, Vec<R>) {
    match joined {
        Ok(cleaned) => cleaned,
        Err(e) => {
            error!("Worker for {} failed: {}", dataset, e);
            PipelineMetrics::record_failure(dataset);
            let mut outcome = DatasetOutcome::new(dataset);
            outcome.fail(PipelineError::Join(e));
            (outcome, Vec::new())
        }
    }
}

/// Load a cleaned dataset unless its earlier stages already failed.
fn load_dataset<R: BatchRow>(
    outcome: &mut DatasetOutcome,
    rows: &[R],
    conn: &mut Connection,
    loader: &BatchLoader,
) {
    if outcome.is_failed() {
        return;
    }

    outcome.status = DatasetStatus::Loading;
    info!("💾 Loading {} rows into {}", rows.len(), outcome.dataset);
    let t_load = Instant::now();
    match loader.load(conn, rows) {
        Ok(loaded) => {
            outcome.loaded = loaded;
            outcome.status = DatasetStatus::Done;
            PipelineMetrics::record_loaded(&outcome.dataset, loaded);
            PipelineMetrics::record_stage_duration(
                &outcome.dataset,
                "load",
                t_load.elapsed().as_secs_f64(),
            );
        }
        Err(e) => {
            error!("Load failed for {}: {}", outcome.dataset, e);
            PipelineMetrics::record_failure(&outcome.dataset);
            outcome.fail(e);
        }
    }
}
