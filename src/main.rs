//! Wiki-Trawl main entry point
//!
//! This is the command-line interface for the Wiki-Trawl crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wiki_trawl::config::{load_config_with_hash, validate, Config};
use wiki_trawl::crawler::SAFE_RATE_CEILING;
use wiki_trawl::output::{load_statistics, print_report, print_statistics};
use wiki_trawl::storage::{SqliteStore, StateStore};
use wiki_trawl::CrawlOrchestrator;

/// Wiki-Trawl: a polite, resumable encyclopedia crawler
///
/// Wiki-Trawl crawls a wiki in batches while respecting robots.txt and a
/// global request rate. Progress is persisted after every batch, so an
/// interrupted crawl picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "wiki-trawl")]
#[command(version)]
#[command(about = "A polite, resumable encyclopedia crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", env = "WIKI_TRAWL_CONFIG")]
    config: Option<PathBuf>,

    /// Requests allowed per time period
    #[arg(long, env = "WIKI_TRAWL_RPS")]
    rps: Option<u32>,

    /// URLs fetched concurrently per batch
    #[arg(long, env = "WIKI_TRAWL_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Stop after this many URLs have been fetched
    #[arg(long, env = "WIKI_TRAWL_DOCS_COUNT")]
    docs_count: Option<u64>,

    /// First URL to crawl on a cold start
    #[arg(long, env = "WIKI_TRAWL_START_URL")]
    start_url: Option<String>,

    /// Scheme and host of the site being crawled
    #[arg(long, env = "WIKI_TRAWL_SITE_BASE")]
    site_base: Option<String>,

    /// Path of the SQLite database
    #[arg(long, value_name = "PATH", env = "WIKI_TRAWL_OUT")]
    out: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Forget persisted visited/pending URLs before crawling
    #[arg(long)]
    fresh: bool,

    /// Print the effective configuration and exit
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    /// Applies command-line overrides on top of file (or default) values
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(rps) = self.rps {
            config.crawler.requests_per_second = rps;
        }
        if let Some(batch_size) = self.batch_size {
            config.crawler.batch_size = batch_size;
        }
        if let Some(docs_count) = self.docs_count {
            config.crawler.max_scraped_count = docs_count;
        }
        if let Some(start_url) = &self.start_url {
            config.crawler.start_url = start_url.clone();
        }
        if let Some(site_base) = &self.site_base {
            config.crawler.site_base = site_base.clone();
        }
        if let Some(out) = &self.out {
            config.output.database_path = out.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wiki_trawl=info,warn"),
            1 => EnvFilter::new("wiki_trawl=debug,info"),
            2 => EnvFilter::new("wiki_trawl=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;

    println!("=== Wiki-Trawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", crawler.start_url);
    println!("  Site base: {}", crawler.site_base);
    println!("  Content prefix: {}", crawler.content_prefix);
    println!(
        "  Rate: {} requests per {}ms",
        crawler.requests_per_second, crawler.time_period_ms
    );
    println!("  Batch size: {}", crawler.batch_size);
    println!("  Max documents: {}", crawler.max_scraped_count);
    println!("  Frontier capacity: {}", crawler.frontier_capacity);
    println!(
        "  Retries: {} (backoff {}ms)",
        crawler.max_retries, crawler.retry_backoff_ms
    );
    println!(
        "  Timeouts: {}s request, {}s connect",
        crawler.request_timeout_secs, crawler.connect_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let per_second =
        crawler.requests_per_second as f64 / (crawler.time_period_ms as f64 / 1000.0);
    if per_second > SAFE_RATE_CEILING {
        println!(
            "\n! Configured rate of {:.1} requests/second is above {}",
            per_second, SAFE_RATE_CEILING
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = SqliteStore::open(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    store.close()?;
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    let db_path = Path::new(&config.output.database_path);

    let mut state_store = SqliteStore::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let doc_store = SqliteStore::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    if fresh {
        tracing::info!("Starting fresh crawl (clearing persisted state)");
        state_store.clear_state()?;
    } else {
        tracing::info!("Starting crawl (will resume from persisted state if any)");
    }

    let mut orchestrator = CrawlOrchestrator::initialize(&config, state_store, doc_store).await?;

    let report = orchestrator.run_until(shutdown_signal()).await?;
    tracing::info!(
        "Crawl stopped ({}) after {} URLs",
        orchestrator.phase(),
        report.visited_count
    );
    tracing::debug!("Report: {}", serde_json::to_string(&report)?);

    let (state_store, doc_store) = orchestrator.into_stores();
    state_store.close()?;
    doc_store.close()?;

    print_report(&report);
    Ok(())
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::warn!("Interrupt received, stopping"),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
