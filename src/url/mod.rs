//! URL handling module for SeedCrawl
//!
//! This module provides URL normalization, host extraction, wildcard host matching
//! and ignored-path filtering.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, host_key, is_ignored_path};
pub use matcher::matches_wildcard;
pub use normalize::{normalize_url, resolve_url};
