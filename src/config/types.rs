use crate::extract::ExtractorKind;
use serde::Deserialize;

/// Main configuration structure for SeedCrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

impl Config {
    /// Returns every configured seed in declaration order
    pub fn seeds(&self) -> impl Iterator<Item = &str> {
        self.sites
            .iter()
            .flat_map(|site| site.seeds.iter().map(String::as_str))
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Global page budget: the crawl stops once this many documents are saved
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum number of discovered links a single seed may add to the frontier
    #[serde(rename = "extraction-quota")]
    pub extraction_quota: u32,

    /// Minimum time between two fetches to the same host (milliseconds)
    #[serde(rename = "minimum-delay-ms", default = "default_minimum_delay_ms")]
    pub minimum_delay_ms: u64,

    /// Timeout for a page fetch (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Timeout for a robots.txt fetch (seconds)
    #[serde(rename = "robots-timeout-secs", default = "default_timeout_secs")]
    pub robots_timeout_secs: u64,

    /// Upper bound applied to a robots.txt crawl-delay (seconds)
    #[serde(rename = "max-crawl-delay-secs", default = "default_max_crawl_delay_secs")]
    pub max_crawl_delay_secs: u64,

    /// What to assume when robots.txt cannot be retrieved
    #[serde(rename = "robots-fallback", default)]
    pub robots_fallback: RobotsFallback,

    /// How many seeds may have a fetch in flight at once
    #[serde(rename = "max-concurrent-origins", default = "default_concurrency")]
    pub max_concurrent_origins: u32,

    /// Path prefixes that are never enqueued (administrative catalog sections)
    #[serde(rename = "ignored-paths", default)]
    pub ignored_paths: Vec<String>,
}

fn default_minimum_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_crawl_delay_secs() -> u64 {
    60
}

fn default_concurrency() -> u32 {
    1
}

/// Policy applied when a host's robots.txt cannot be retrieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotsFallback {
    /// Treat the host as disallowing everything
    #[default]
    Deny,
    /// Treat the host as unrestricted
    Allow,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the product token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the full User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one text file per saved document
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Path to the SQLite run ledger
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A site family: its host pattern, the extractor that understands it, and its seeds
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Domain pattern (e.g., "wolnelektury.pl" or "*.wikipedia.org")
    pub domain: String,

    /// Which extractor handles pages on matching hosts
    pub extractor: ExtractorKind,

    /// Seed URLs; each one becomes its own crawl origin
    #[serde(default)]
    pub seeds: Vec<String>,
}
