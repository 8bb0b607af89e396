//! Crawler module for fetching and dispatching pages
//!
//! This module contains the core crawling logic, including:
//! - The HTTP transport and body decoding
//! - The per-origin frontier with extraction quotas
//! - Per-host pacing
//! - The orchestration loop

mod coordinator;
mod fetcher;
mod frontier;
mod pacer;

pub use coordinator::Orchestrator;
pub use fetcher::{decode_body, FetchedPage, HttpTransport, Transport, TransportError};
pub use frontier::{CrawlFrontier, FrontierEntry, Origin};
pub use pacer::Pacer;

use crate::config::Config;
use crate::output::RunReport;
use crate::storage::ArchiveStorage;
use crate::CrawlError;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP transport
/// 2. Open the archive and its ledger
/// 3. Queue every seed
/// 4. Crawl until the frontier is empty, the budget is reached, or Ctrl-C
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `config_hash` - Fingerprint of the configuration file, stored with the run
///
/// # Returns
///
/// * `Ok(RunReport)` - The run finished (including interrupted runs)
/// * `Err(CrawlError)` - Startup failed
///
/// # Example
///
/// ```no_run
/// use seedcrawl::config::load_config_with_hash;
/// use seedcrawl::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("seedcrawl.toml"))?;
/// let report = run_crawl(&config, &hash).await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, config_hash: &str) -> Result<RunReport, CrawlError> {
    let transport = HttpTransport::new(&config.user_agent, &config.crawler)?;
    let storage = ArchiveStorage::open(
        Path::new(&config.output.data_dir),
        Path::new(&config.output.database_path),
    )?;

    let mut orchestrator = Orchestrator::new(config, Arc::new(transport), storage)?;
    orchestrator.run_until(config_hash, shutdown_signal()).await
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        futures::future::pending::<()>().await;
    }
}
