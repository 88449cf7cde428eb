//! Sumi-Sitemap main entry point
//!
//! This is the command-line interface for the Sumi-Sitemap generator.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sumi_sitemap::config::{
    load_config_with_hash, validate, Config, PublishConfig, UserAgentConfig,
};
use sumi_sitemap::crawler::crawl_with_cancellation;
use sumi_sitemap::output::{print_statistics, write_sitemap};
use sumi_sitemap::publish::{publish_all, publishers_from_config};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Sitemap: A polite sitemap generator
///
/// Sumi-Sitemap crawls a single website breadth-first while respecting
/// robots.txt and a politeness delay, writes the discovered pages as a
/// sitemap.xml, and optionally publishes it to object storage or git.
#[derive(Parser, Debug)]
#[command(name = "sumi-sitemap")]
#[command(version = "1.0.0")]
#[command(about = "A polite sitemap generator", long_about = None)]
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

    /// Write the sitemap but skip every configured publisher
    #[arg(long)]
    no_publish: bool,

    /// Override the seed URL from the config file
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Override the maximum number of pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Override the sitemap output path
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.no_publish, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sitemap=info,warn"),
            1 => EnvFilter::new("sumi_sitemap=debug,info"),
            2 => EnvFilter::new("sumi_sitemap=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(seed) = &cli.seed {
        tracing::info!(seed, "Overriding seed URL");
        config.crawler.seed_url = seed.clone();
    }

    if let Some(max_pages) = cli.max_pages {
        tracing::info!(max_pages, "Overriding page limit");
        config.crawler.max_pages = max_pages;
    }

    if let Some(output) = &cli.output {
        tracing::info!(output = %output.display(), "Overriding sitemap path");
        config.output.sitemap_path = output.to_string_lossy().into_owned();
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Sitemap Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Concurrency: {}", config.crawler.concurrency);
    match config.crawler.max_duration_secs {
        Some(secs) => println!("  Time budget: {}s", secs),
        None => println!("  Time budget: none"),
    }

    println!("\nRetry Policy:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Initial backoff: {}ms", config.retry.initial_backoff_ms);
    println!("  Backoff factor: {}", config.retry.backoff_factor);

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header_value());
    println!("  robots.txt token: {}", config.user_agent.crawler_name);

    println!("\nOutput:");
    println!("  Sitemap: {}", config.output.sitemap_path);

    println!("\nPublishing:");
    match &config.publish.s3 {
        Some(s3) => println!(
            "  S3: s3://{}/{} in {} (acl: {})",
            s3.bucket,
            s3.key,
            s3.region,
            if s3.acl.is_empty() { "none" } else { s3.acl.as_str() }
        ),
        None => println!("  S3: disabled"),
    }
    match &config.publish.object_store {
        Some(store) => println!(
            "  Object store: {} (acl: {})",
            store.url,
            store.acl.as_deref().unwrap_or("none")
        ),
        None => println!("  Object store: disabled"),
    }
    match &config.publish.git {
        Some(git) => println!(
            "  Git: {}/{} (push: {})",
            git.repo_path, git.file_name, git.push
        ),
        None => println!("  Git: disabled"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, no_publish: bool, quiet: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let sitemap_path = PathBuf::from(&config.output.sitemap_path);
    let user_agent = config.user_agent.clone();
    let timeout = config.crawler.fetch_timeout();
    let publish_config = config.publish.clone();

    let result = crawl_with_cancellation(config, cancel)
        .await
        .context("Crawl could not be started")?;

    write_sitemap(&result.urls, &sitemap_path)
        .with_context(|| format!("Failed to write sitemap to {}", sitemap_path.display()))?;

    if !quiet {
        print_statistics(&result.stats);
        println!("\n✓ Sitemap with {} URLs written to: {}", result.urls.len(), sitemap_path.display());
    }

    if no_publish {
        tracing::info!("Publishing disabled by --no-publish");
        return Ok(());
    }

    publish(&publish_config, &user_agent, timeout, &sitemap_path, quiet).await
}

async fn publish(
    config: &PublishConfig,
    user_agent: &UserAgentConfig,
    timeout: Duration,
    sitemap_path: &Path,
    quiet: bool,
) -> anyhow::Result<()> {
    let publishers = publishers_from_config(config, user_agent, timeout)
        .await
        .context("Failed to set up publishers")?;

    if publishers.is_empty() {
        tracing::debug!("No publishers configured");
        return Ok(());
    }

    let reports = publish_all(&publishers, sitemap_path).await;

    let mut failures = 0;
    for report in &reports {
        match &report.result {
            Ok(receipt) => {
                if !quiet {
                    println!("✓ {}: {}", report.target, receipt);
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("✗ {}: {}", report.target, e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} publishers failed", failures, reports.len());
    }

    Ok(())
}

/// Cancels the crawl on Ctrl-C; in-flight fetches finish and the partial
/// sitemap is still written
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            cancel.cancel();
        }
    });
}
