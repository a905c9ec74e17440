//! Catalog-Ripple main entry point
//!
//! This is the command-line interface for the Catalog-Ripple scraper.

use catalog_ripple::config::{load_config_with_hash, Config};
use catalog_ripple::crawler::Pipeline;
use catalog_ripple::output::{print_summary, sinks_from_config, Sink};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Ripple: a polite catalog scraper
///
/// Catalog-Ripple fetches paginated catalog listings under a concurrency
/// and rate limit, rotates request identities and proxies, and writes the
/// extracted products as JSON and CSV.
#[derive(Parser, Debug)]
#[command(name = "catalog-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A polite catalog scraper", long_about = None)]
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

    /// Validate config and show which pages would be fetched without fetching
    #[arg(long)]
    dry_run: bool,

    /// Override the number of pages to scrape
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Send every request directly, ignoring configured proxies
    #[arg(long)]
    no_proxy: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(pages) = cli.pages {
        config.scraper.total_pages = pages;
    }
    if cli.no_proxy {
        config.proxy.use_proxy = false;
    }

    // Overrides are re-validated when the pipeline is built
    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&pipeline)?;
    } else {
        handle_scrape(&pipeline, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_ripple=info,warn"),
            1 => EnvFilter::new("catalog_ripple=debug,info"),
            2 => EnvFilter::new("catalog_ripple=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be fetched
fn handle_dry_run(pipeline: &Pipeline) -> Result<(), Box<dyn std::error::Error>> {
    let config: &Config = pipeline.config();

    println!("=== Catalog-Ripple Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Origin: {}", config.scraper.origin);
    println!("  Max attempts: {}", config.scraper.max_attempts);
    println!(
        "  Retry delay: {}ms ({:?})",
        config.scraper.retry_delay_ms, config.scraper.backoff
    );

    println!("\nScheduler:");
    println!(
        "  Max concurrent tasks: {}",
        config.scheduler.max_concurrent_tasks
    );
    println!(
        "  Rate: {} per {}ms",
        config.scheduler.requests_per_window, config.scheduler.window_ms
    );

    println!("\nProxies ({}):", config.proxy.servers.len());
    println!("  Enabled: {}", config.proxy.use_proxy);
    for proxy in &config.proxy.servers {
        let auth = if proxy.username.is_some() { " (auth)" } else { "" };
        println!("  - {}{}", proxy.url(), auth);
    }

    println!("\nOutput:");
    println!("  JSON: {}", config.output.json_path);
    println!("  CSV: {}", config.output.csv_path);

    let pages = pipeline.page_urls()?;
    println!("\nPages ({}):", pages.len());
    for (index, url) in &pages {
        println!("  {:>4}  {}", index, url);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(pipeline: &Pipeline, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (json, csv) = sinks_from_config(&pipeline.config().output);
    let sinks: [&dyn Sink; 2] = [&json, &csv];
    let report = pipeline.run_with_sinks(&sinks).await?;

    tracing::info!("JSON written to {}", json.path().display());
    tracing::info!("CSV written to {}", csv.path().display());
    tracing::info!("Total products scraped: {}", report.records.len());

    if !quiet {
        println!();
        print_summary(&report.summary);
    }

    Ok(())
}
