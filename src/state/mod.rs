//! State module for tracking crawl progress
//!
//! - `UrlState`: the terminal outcome recorded for each URL taken from the frontier

mod url_state;

pub use url_state::UrlState;
