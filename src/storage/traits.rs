//! Storage traits and error types
//!
//! The orchestrator persists through the [`Storage`] trait only, so its control loop can
//! be tested against an in-memory double.

use crate::crawler::Origin;
use crate::extract::{Document, Metadata};
use crate::output::RunReport;
use crate::state::UrlState;
use crate::storage::RunStatus;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Where a saved document ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub path: PathBuf,
    /// False when the same URL had already been written and was overwritten in place
    pub created: bool,
}

/// Persistence used by the crawl loop
pub trait Storage {
    // ===== Run bookkeeping =====

    /// Opens a new run and returns its id
    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Records the terminal state reached by one URL
    fn record_visit(
        &mut self,
        run_id: i64,
        url: &Url,
        origin: &Origin,
        state: UrlState,
        detail: Option<&str>,
    ) -> StorageResult<()>;

    /// Closes a run with its final status and counters
    fn finish_run(&mut self, run_id: i64, status: RunStatus, report: &RunReport)
        -> StorageResult<()>;

    // ===== Documents =====

    /// Writes a document; saving the same URL again rewrites the same file
    fn save(&mut self, run_id: i64, document: &Document) -> StorageResult<SavedDocument>;

    /// Returns true if this URL was already saved with the same title and its file
    /// still exists
    fn is_already_saved(&self, url: &Url, metadata: &Metadata) -> StorageResult<bool>;

    // ===== Links =====

    /// Records discovered links and returns those not recorded before, in input order
    fn save_discovered_links(
        &mut self,
        run_id: i64,
        origin: &Origin,
        links: &[Url],
    ) -> StorageResult<Vec<Url>>;
}
