pub mod cleaner;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;
