//! Crawl frontier
//!
//! Pending work is kept in one FIFO queue per origin and served round-robin, so a seed
//! with a large catalog cannot starve the others. Each origin may accept at most
//! `quota` discovered links over the whole run; seeds themselves bypass the quota.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use url::Url;

/// The seed a URL was (transitively) discovered from
///
/// Discovered URLs inherit the origin of the page they were found on, not their own
/// host, so fairness and quotas are per seed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(Url);

impl Origin {
    pub fn new(seed: Url) -> Self {
        Self(seed)
    }

    pub fn seed(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of pending work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub origin: Origin,
    pub is_seed: bool,
}

#[derive(Debug)]
struct OriginQueue {
    origin: Origin,
    pending: VecDeque<FrontierEntry>,
    /// Discovered links accepted so far
    accepted: u32,
}

/// Pending work, visited set and per-origin quotas
#[derive(Debug)]
pub struct CrawlFrontier {
    quota: u32,
    origins: Vec<OriginQueue>,
    index: HashMap<Origin, usize>,
    /// Position of the origin served last
    cursor: Option<usize>,
    /// Every URL ever queued; a URL is queued at most once per run
    known: HashSet<Url>,
    visited: HashSet<Url>,
}

impl CrawlFrontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `quota` - Maximum number of discovered links each origin may accept
    pub fn new(quota: u32) -> Self {
        Self {
            quota,
            origins: Vec::new(),
            index: HashMap::new(),
            cursor: None,
            known: HashSet::new(),
            visited: HashSet::new(),
        }
    }

    /// Registers a seed as a new origin and queues it
    ///
    /// Returns false (and queues nothing) if the URL is already known.
    pub fn enqueue_seed(&mut self, url: Url) -> bool {
        if self.visited.contains(&url) || !self.known.insert(url.clone()) {
            tracing::debug!("Duplicate seed {} ignored", url);
            return false;
        }

        let origin = Origin::new(url.clone());
        let mut pending = VecDeque::new();
        pending.push_back(FrontierEntry {
            url,
            origin: origin.clone(),
            is_seed: true,
        });

        self.index.insert(origin.clone(), self.origins.len());
        self.origins.push(OriginQueue {
            origin,
            pending,
            accepted: 0,
        });
        true
    }

    /// Queues links discovered under `origin`
    ///
    /// A link is accepted only if it was never queued or visited before and the origin
    /// still has quota. Accepted links are appended in input order and returned; links
    /// past the quota are dropped for good.
    pub fn enqueue_discovered<I>(&mut self, origin: &Origin, links: I) -> Vec<Url>
    where
        I: IntoIterator<Item = Url>,
    {
        let Some(&position) = self.index.get(origin) else {
            tracing::warn!("Links offered for unknown origin {}", origin);
            return Vec::new();
        };

        let queue = &mut self.origins[position];
        let mut accepted = Vec::new();

        for url in links {
            if queue.accepted >= self.quota {
                tracing::debug!("Extraction quota of {} reached for {}", self.quota, origin);
                break;
            }
            if self.visited.contains(&url) || self.known.contains(&url) {
                tracing::trace!("Already known: {}", url);
                continue;
            }

            self.known.insert(url.clone());
            queue.accepted += 1;
            queue.pending.push_back(FrontierEntry {
                url: url.clone(),
                origin: origin.clone(),
                is_seed: false,
            });
            accepted.push(url);
        }

        accepted
    }

    /// Takes the next entry, round-robin across origins
    pub fn next(&mut self) -> Option<FrontierEntry> {
        self.next_matching(|_| true)
    }

    /// Takes the next entry from an origin accepted by `eligible`
    ///
    /// Origins are scanned starting just after the one served last; the cursor moves to
    /// the origin that supplied the entry.
    pub fn next_matching<F>(&mut self, eligible: F) -> Option<FrontierEntry>
    where
        F: Fn(&Origin) -> bool,
    {
        let count = self.origins.len();
        let start = self.cursor.map_or(0, |c| c + 1);

        for step in 0..count {
            let position = (start + step) % count;
            let queue = &mut self.origins[position];
            if !eligible(&queue.origin) {
                continue;
            }
            if let Some(entry) = queue.pending.pop_front() {
                self.cursor = Some(position);
                return Some(entry);
            }
        }

        None
    }

    /// Records that a URL was dispatched; returns true the first time
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.clone())
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    /// Returns true if any origin still has pending entries
    pub fn has_work(&self) -> bool {
        self.origins.iter().any(|queue| !queue.pending.is_empty())
    }

    /// Total number of pending entries
    pub fn pending(&self) -> usize {
        self.origins.iter().map(|queue| queue.pending.len()).sum()
    }

    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Discovered links accepted so far for `origin`
    pub fn accepted(&self, origin: &Origin) -> u32 {
        self.index
            .get(origin)
            .map_or(0, |&position| self.origins[position].accepted)
    }
}
