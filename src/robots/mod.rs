//! Robots.txt handling module
//!
//! This module parses robots.txt files and caches one policy per host behind the
//! [`PolitenessGate`], which the crawler consults before every fetch.

mod gate;
mod parser;

pub use gate::PolitenessGate;
pub use parser::ParsedRobots;
