//! Property-Trawler main entry point
//!
//! This is the command-line interface for the Property-Trawler listing crawler.

use anyhow::Context;
use clap::Parser;
use property_trawler::config::{load_config_with_hash, validate, Config};
use property_trawler::crawler::{run_crawl, user_agent_string};
use property_trawler::output::print_report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Property-Trawler: a real-estate listing crawler
///
/// Property-Trawler walks paginated search results from the configured
/// seeds, fetches each distinct listing page once, and writes every
/// extracted listing to a single JSON file.
#[derive(Parser, Debug)]
#[command(name = "property-trawler")]
#[command(version)]
#[command(about = "A real-estate listing crawler", long_about = None)]
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
    #[arg(long)]
    dry_run: bool,

    /// Write the listings here instead of the configured json-path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Override the configured number of listing workers
    #[arg(short, long, value_name = "N")]
    workers: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(output) = &cli.output {
        config.output.json_path = output.display().to_string();
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    validate(&config).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("property_trawler=info,warn"),
            1 => EnvFilter::new("property_trawler=debug,info"),
            2 => EnvFilter::new("property_trawler=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated config and the seeds
fn handle_dry_run(config: &Config) {
    println!("=== Property-Trawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Listing workers: {}", config.crawler.workers);
    println!(
        "  Concurrent search pages: {}",
        config.crawler.max_concurrent_search_pages
    );
    println!("  Channel capacity: {}", config.crawler.channel_capacity);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", user_agent_string(&config.user_agent));

    println!("\nOutput:");
    println!("  JSON: {}", config.output.json_path);

    println!("\nSeeds ({}):", config.search.seeds.len());
    for seed in &config.search.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.search.seeds.len()
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, workers: {}, output: {}",
        config.search.seeds.len(),
        config.crawler.workers,
        config.output.json_path
    );

    let report = run_crawl(config).await.context("Crawl failed")?;

    if !quiet {
        print_report(&report);
    }
    Ok(())
}
