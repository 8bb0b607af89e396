//! Per-URL crawl states
//!
//! Every URL taken from the frontier ends in exactly one terminal state. The state is
//! written to the run ledger and drives the run report counters.
use std::fmt;

/// Lifecycle state of a URL within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Queued in the frontier, not yet dispatched
    Pending,

    // ===== Terminal Skip States =====
    /// robots.txt disallows the URL
    Denied,

    /// Transport error, timeout or non-200 response
    Failed,

    /// No extractor recognised the page shape (or no extractor covers the host)
    Unrecognized,

    /// Page recognised but carried nothing useful
    Empty,

    // ===== Terminal Success States =====
    /// Page yielded links and no document
    LinksFound,

    /// Page yielded a document that was written to the archive
    DocumentSaved,

    // ===== Terminal Ignore States =====
    /// Document already archived with the same metadata
    AlreadySaved,

    /// Document produced after the page budget was reached
    BudgetExhausted,
}

impl UrlState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true for outcomes counted as skips in the run report
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::Denied | Self::Failed | Self::Unrecognized | Self::Empty
        )
    }

    /// Returns true for outcomes counted as ignored documents in the run report
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::AlreadySaved | Self::BudgetExhausted)
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Denied => "denied",
            Self::Failed => "failed",
            Self::Unrecognized => "unrecognized",
            Self::Empty => "empty",
            Self::LinksFound => "links_found",
            Self::DocumentSaved => "document_saved",
            Self::AlreadySaved => "already_saved",
            Self::BudgetExhausted => "budget_exhausted",
        }
    }

    /// Parses a state from its database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        Self::all_states()
            .into_iter()
            .find(|state| state.to_db_string() == s)
    }

    /// Returns all possible states
    pub fn all_states() -> [Self; 9] {
        [
            Self::Pending,
            Self::Denied,
            Self::Failed,
            Self::Unrecognized,
            Self::Empty,
            Self::LinksFound,
            Self::DocumentSaved,
            Self::AlreadySaved,
            Self::BudgetExhausted,
        ]
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
