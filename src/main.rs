//! SeedCrawl main entry point
//!
//! This is the command-line interface for the SeedCrawl text crawler.

use anyhow::{Context, Result};
use clap::Parser;
use seedcrawl::config::{load_config_with_hash, Config};
use seedcrawl::crawler::run_crawl;
use seedcrawl::output::{load_statistics, print_report, print_statistics};
use seedcrawl::storage::ArchiveStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// SeedCrawl: a polite seed-scoped text crawler
///
/// SeedCrawl starts from configured seed pages, follows the links each site's
/// extractor recognises, and archives document text with its metadata. It respects
/// robots.txt, keeps a minimum delay per host, and bounds how far each seed fans out.
#[derive(Parser, Debug)]
#[command(name = "seedcrawl")]
#[command(version = "1.0.0")]
#[command(about = "A polite seed-scoped text crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the latest run from the ledger and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Override the page budget from the config file
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(max_pages) = cli.max_pages {
        tracing::info!("Page budget overridden: {}", max_pages);
        config.crawler.max_pages = max_pages;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seedcrawl=info,warn"),
            1 => EnvFilter::new("seedcrawl=debug,info"),
            2 => EnvFilter::new("seedcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved crawl plan
fn handle_dry_run(config: &Config) {
    println!("=== SeedCrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page budget: {}", config.crawler.max_pages);
    println!("  Extraction quota per seed: {}", config.crawler.extraction_quota);
    println!("  Minimum delay: {}ms", config.crawler.minimum_delay_ms);
    println!(
        "  Timeouts: fetch {}s, robots.txt {}s",
        config.crawler.fetch_timeout_secs, config.crawler.robots_timeout_secs
    );
    println!("  Robots fallback: {:?}", config.crawler.robots_fallback);
    println!("  Crawl-delay cap: {}s", config.crawler.max_crawl_delay_secs);
    println!(
        "  Concurrent origins: {}",
        config.crawler.max_concurrent_origins
    );
    if !config.crawler.ignored_paths.is_empty() {
        println!("  Ignored paths: {}", config.crawler.ignored_paths.join(", "));
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);
    println!("  Database: {}", config.output.database_path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!(
            "  - {} [{}] ({} seeds)",
            site.domain,
            site.extractor,
            site.seeds.len()
        );
        for seed in &site.seeds {
            println!("    * {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.seeds().count()
    );
}

/// Handles the --stats mode: shows statistics from the ledger
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = ArchiveStorage::open(
        Path::new(&config.output.data_dir),
        Path::new(&config.output.database_path),
    )
    .context("Failed to open the run ledger")?;

    let stats = load_statistics(&storage).context("Failed to read ledger statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> Result<()> {
    tracing::info!(
        "Sites: {}, seed URLs: {}",
        config.sites.len(),
        config.seeds().count()
    );

    let report = run_crawl(config, config_hash)
        .await
        .context("Crawl could not start")?;

    print_report(&report);
    Ok(())
}
