//! Output module for run reports and ledger statistics
//!
//! This module handles:
//! - The end-of-run summary counters
//! - Reading statistics back from the run ledger

mod report;
pub mod stats;

pub use report::{print_report, RunReport};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
