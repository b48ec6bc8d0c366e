//! Recon-Scan main entry point
//!
//! This is the command-line interface for the Recon-Scan web reconnaissance crawler.

use anyhow::{bail, Context};
use clap::Parser;
use recon_scan::config::{load_config_with_hash, ScanConfig, ScopeMode};
use recon_scan::Scanner;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Recon-Scan: a concurrent web reconnaissance crawler
///
/// Recon-Scan crawls a target site, visits external links once, flags
/// state-changing endpoints without touching them, and scans every fetched
/// page for exposed secrets. Results stream to the console and a CSV report.
#[derive(Parser, Debug)]
#[command(name = "recon-scan")]
#[command(version)]
#[command(about = "A concurrent web reconnaissance crawler", long_about = None)]
struct Cli {
    /// URL to start scanning from (overrides the config file's start-url)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of main-queue workers
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Maximum crawl depth
    #[arg(short = 'd', long = "depth", value_name = "N")]
    max_depth: Option<u32>,

    /// Scope mode: main-domain-only, external-once, unrestricted, whitelist-only
    #[arg(long, value_name = "MODE")]
    scope: Option<ScopeMode>,

    /// Stop issuing requests after N fetches
    #[arg(long, value_name = "N")]
    max_requests: Option<usize>,

    /// Stop reporting after N results
    #[arg(long, value_name = "N")]
    max_urls: Option<usize>,

    /// Proxy URL (http, https, socks5)
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// CSV report path (defaults to a timestamped file in the current directory)
    #[arg(short, long, value_name = "CSV")]
    output: Option<String>,

    /// Validate the configuration and show what would be scanned without scanning
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scan(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("recon_scan=info,warn"),
            1 => EnvFilter::new("recon_scan=debug,info"),
            2 => EnvFilter::new("recon_scan=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<ScanConfig> {
    let mut builder = match (&cli.config, &cli.url) {
        (Some(path), url) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);

            let builder = config.into_builder();
            match url {
                Some(url) => builder.start_url(url.clone()),
                None => builder,
            }
        }
        (None, Some(url)) => ScanConfig::builder(url.clone()),
        (None, None) => bail!("either a start URL or --config must be given"),
    };

    if let Some(workers) = cli.workers {
        builder = builder.workers(workers);
    }
    if let Some(depth) = cli.max_depth {
        builder = builder.max_depth(depth);
    }
    if let Some(scope) = cli.scope {
        builder = builder.scope(scope);
    }
    if let Some(max_requests) = cli.max_requests {
        builder = builder.max_requests(max_requests);
    }
    if let Some(max_urls) = cli.max_urls {
        builder = builder.max_urls(max_urls);
    }
    if let Some(proxy) = &cli.proxy {
        builder = builder.proxy(proxy.clone());
    }
    if let Some(output) = &cli.output {
        builder = builder.csv_path(output.clone());
    }

    let mut config = builder.build().context("invalid configuration")?;

    if config.output.csv_path.is_none() {
        let path = default_csv_path(&config.scan.start_url);
        config = config.into_builder().csv_path(path).build()?;
    }

    Ok(config)
}

/// `recon_<host>_<timestamp>.csv` in the current directory
fn default_csv_path(start_url: &str) -> String {
    let host = Url::parse(start_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.replace([':', '[', ']'], "_")))
        .unwrap_or_else(|| "scan".to_string());
    format!("recon_{}_{}.csv", host, chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &ScanConfig) {
    println!("=== Recon-Scan Dry Run ===\n");

    println!("Scan Configuration:");
    println!("  Start URL: {}", config.scan.start_url);
    println!("  Scope: {}", config.scan.scope);
    println!("  Max depth: {}", config.scan.max_depth);
    println!("  Workers: {} (+1 external)", config.scan.workers);
    println!("  Delay: {}ms", config.scan.delay_ms);
    println!("  Timeout: {}s", config.scan.timeout_secs);
    println!(
        "  Max requests: {}",
        config
            .scan
            .max_requests
            .map_or("unlimited".to_string(), |n| n.to_string())
    );
    println!(
        "  Max URLs: {}",
        config
            .scan
            .max_urls
            .map_or("unlimited".to_string(), |n| n.to_string())
    );
    println!(
        "  Proxy: {}",
        config.scan.proxy.as_deref().unwrap_or("none")
    );
    println!("  Verify TLS: {}", config.scan.verify_tls);

    let filters = &config.filters;
    println!("\nFilters:");
    println!("  Allowed domains: {:?}", filters.allow_domains);
    println!("  Denied domains: {:?}", filters.deny_domains);
    println!("  Denied extensions: {}", filters.deny_extensions.len());
    println!("  Danger keywords: {:?}", filters.danger_substrings);
    println!("  Exclude substrings: {:?}", filters.exclude_substrings);
    println!("  Allow substrings: {:?}", filters.allow_substrings);
    println!("  Title filters: {:?}", filters.title_filters);
    println!("  Status filters: {:?}", filters.status_filters);

    println!("\nOutput:");
    println!(
        "  CSV: {}",
        config.output.csv_path.as_deref().unwrap_or("none")
    );
    println!("  Show duplicates: {}", config.output.show_duplicates);
    println!("  Extra sensitive patterns: {}", config.sensitive.len());

    println!("\n✓ Configuration is valid");
}

/// Handles the main scan operation
async fn handle_scan(config: ScanConfig) -> anyhow::Result<()> {
    let scanner = Scanner::new(config).context("failed to set up scanner")?;

    // Ctrl-C stops workers at their next suspension point
    let stop = scanner.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping scan");
            stop.cancel();
        }
    });

    match scanner.run().await {
        Ok(report) => {
            tracing::info!(
                "Scan completed: {} results, {} dangerous URLs, {} unvisited external URLs",
                report.results.len(),
                report.dangerous_urls.len(),
                report.unvisited_external.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scan failed in state {}: {}", scanner.state(), e);
            Err(e.into())
        }
    }
}
