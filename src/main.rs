use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use feedpipe::config::{Config, DatabaseConfig};
use feedpipe::logging;
use feedpipe::pipeline::{DatasetOutcome, EtlPipeline};

#[derive(Parser)]
#[command(name = "feedpipe")]
#[command(about = "Customer and order feed ETL pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the customer CSV feed
    #[arg(long)]
    customers: PathBuf,

    /// Path to the order XML feed
    #[arg(long)]
    orders: PathBuf,

    /// Store file path, overriding the configured one
    #[arg(long)]
    database: Option<PathBuf>,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(database) = cli.database {
        config.database = DatabaseConfig { path: database };
    }

    logging::init_logging(&config.logging.dir);

    let conn = config.store_connection()?;
    let pipeline = EtlPipeline::from_config(&config);
    let summary = pipeline.run(conn, &cli.customers, &cli.orders).await?;

    println!("\n📊 Results for run {}:", summary.run_id);
    for outcome in &summary.datasets {
        print_outcome(outcome);
    }

    if let Some(report) = cli.report {
        summary.persist_to_json(&report)?;
        println!("\n💾 Saved run summary to {}", report.display());
    }

    if summary.any_failed() {
        error!("Run {} finished with failed datasets", summary.run_id);
        std::process::exit(1);
    }
    Ok(())
}

fn print_outcome(outcome: &DatasetOutcome) {
    println!("\n   {}:", outcome.dataset);
    println!("      Status: {:?}", outcome.status);
    println!("      Read: {}", outcome.read);
    println!("      Accepted: {}", outcome.accepted);
    println!("      Rejected: {}", outcome.rejected);
    println!("      Duplicates dropped: {}", outcome.duplicates);
    println!("      Loaded: {}", outcome.loaded);
    if let Some(error) = &outcome.error {
        println!("      ⚠️  Error: {}", error);
    }
}
