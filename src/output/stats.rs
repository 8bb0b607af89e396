//! Statistics read back from the run ledger
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::UrlState;
use crate::storage::{ArchiveStorage, RunRecord, StorageResult};
use std::collections::HashMap;

/// Ledger statistics for the latest run
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// The latest run, if any run was ever started
    pub run: Option<RunRecord>,

    /// Visits of the latest run by terminal state
    pub visits_by_state: HashMap<UrlState, u64>,

    /// Documents archived across all runs
    pub total_documents: u64,

    /// Discovered links recorded across all runs
    pub total_links: u64,
}

impl CrawlStatistics {
    /// Total visits of the latest run
    pub fn total_visits(&self) -> u64 {
        self.visits_by_state.values().sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The archive whose ledger is queried
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query the ledger
pub fn load_statistics(storage: &ArchiveStorage) -> StorageResult<CrawlStatistics> {
    let run = storage.latest_run()?;
    let visits_by_state = match &run {
        Some(run) => storage.visit_counts(run.id)?,
        None => HashMap::new(),
    };

    Ok(CrawlStatistics {
        run,
        visits_by_state,
        total_documents: storage.document_count()?,
        total_links: storage.discovered_link_count()?,
    })
}

/// Prints crawl statistics to stdout
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Archive:");
    println!("  Documents saved: {}", stats.total_documents);
    println!("  Links discovered: {}", stats.total_links);
    println!();

    let Some(run) = &stats.run else {
        println!("No runs recorded yet.");
        return;
    };

    println!("Latest run #{}:", run.id);
    println!("  Status: {}", run.status.to_db_string());
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Config hash: {}", run.config_hash);
    println!(
        "  Visited: {}, saved: {}, skipped: {}, ignored: {}",
        run.visited, run.saved, run.skipped, run.ignored
    );
    println!();

    let total = stats.total_visits();
    println!("Visits by State:");
    let mut state_counts: Vec<_> = stats.visits_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
}
