//! End-of-run counters

use crate::state::UrlState;
use std::fmt;

/// What happened during one run
///
/// Every dispatched URL is counted once under `visited` and once under the counter of
/// its terminal state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub visited: u64,
    pub links_pages: u64,
    pub saved: u64,
    pub already_saved: u64,
    pub over_budget: u64,
    pub denied: u64,
    pub failed: u64,
    pub empty: u64,
    pub unrecognized: u64,
    /// Entries taken from the frontier after their URL was already visited
    pub duplicates_skipped: u64,
    pub links_accepted: u64,
    /// Links turned away as already known or over quota
    pub links_rejected: u64,
    /// Links dropped for pointing at an ignored path
    pub links_ignored: u64,
    /// The run stopped on a shutdown signal
    pub interrupted: bool,
    /// The run stopped because the page budget was reached
    pub budget_reached: bool,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one dispatched URL under its terminal state
    pub fn record(&mut self, state: UrlState) {
        self.visited += 1;
        match state {
            UrlState::Pending => {}
            UrlState::Denied => self.denied += 1,
            UrlState::Failed => self.failed += 1,
            UrlState::Unrecognized => self.unrecognized += 1,
            UrlState::Empty => self.empty += 1,
            UrlState::LinksFound => self.links_pages += 1,
            UrlState::DocumentSaved => self.saved += 1,
            UrlState::AlreadySaved => self.already_saved += 1,
            UrlState::BudgetExhausted => self.over_budget += 1,
        }
    }

    pub fn skipped(&self) -> u64 {
        self.denied + self.failed + self.empty + self.unrecognized
    }

    pub fn ignored(&self) -> u64 {
        self.already_saved + self.over_budget + self.links_ignored
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f)?;
        writeln!(f, "Visited: {}", self.visited)?;
        writeln!(f, "  Link pages: {}", self.links_pages)?;
        writeln!(f, "Saved: {}", self.saved)?;
        writeln!(f, "Skipped: {}", self.skipped())?;
        writeln!(f, "  Denied by robots.txt: {}", self.denied)?;
        writeln!(f, "  Failed: {}", self.failed)?;
        writeln!(f, "  Empty: {}", self.empty)?;
        writeln!(f, "  Unrecognized: {}", self.unrecognized)?;
        writeln!(f, "Ignored: {}", self.ignored())?;
        writeln!(f, "  Already saved: {}", self.already_saved)?;
        writeln!(f, "  Over budget: {}", self.over_budget)?;
        writeln!(f, "  Ignored links: {}", self.links_ignored)?;
        writeln!(
            f,
            "Links: {} accepted, {} rejected",
            self.links_accepted, self.links_rejected
        )?;
        writeln!(f, "Duplicate entries skipped: {}", self.duplicates_skipped)?;

        if self.interrupted {
            writeln!(f, "Stopped: interrupted")?;
        } else if self.budget_reached {
            writeln!(f, "Stopped: page budget reached")?;
        } else {
            writeln!(f, "Stopped: frontier exhausted")?;
        }
        Ok(())
    }
}

/// Prints the report to stdout
pub fn print_report(report: &RunReport) {
    print!("{}", report);
}
