//! Sumi-Sitemap main entry point
//!
//! This is the command-line interface for the Sumi-Sitemap crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use sumi_sitemap::config::{load_config_with_hash, Config};
use sumi_sitemap::crawler::Crawler;
use sumi_sitemap::output::{print_statistics, render, OutputFormat};
use sumi_sitemap::server;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Sitemap: A polite same-domain sitemap builder
///
/// Sumi-Sitemap crawls a site from a starting page, following same-domain
/// links up to a bounded depth while respecting robots.txt and capping
/// concurrent fetches.
#[derive(Parser, Debug)]
#[command(name = "sumi-sitemap")]
#[command(version = "1.0.0")]
#[command(about = "A polite same-domain sitemap builder", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and print its sitemap
    Crawl {
        /// Starting URL
        #[arg(value_name = "URL")]
        url: String,

        /// Maximum link depth (overrides crawler.max-depth)
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Path to TOML configuration file
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Serve crawls over HTTP
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,

        /// Path to TOML configuration file
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl {
            url,
            depth,
            format,
            config,
        } => {
            let config = load_configuration(config.as_deref())?;
            handle_crawl(config, &url, depth, format).await
        }
        Command::Serve { bind, config } => {
            let mut config = load_configuration(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            handle_serve(config).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the rendered sitemap.
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
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, otherwise the defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Cancels `token` on the first Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping");
            token.cancel();
        }
    });
}

/// Handles the crawl subcommand
async fn handle_crawl(
    config: Config,
    url: &str,
    depth: Option<u32>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let max_depth = depth.unwrap_or(config.crawler.max_depth);
    tracing::info!(
        "Max depth: {}, max concurrent fetches: {}, scope: {:?}",
        max_depth,
        config.crawler.max_concurrent_fetches,
        config.crawler.scope
    );

    let crawler = Crawler::new(config).context("Failed to build crawler")?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let report = crawler
        .crawl_with_cancel(url, max_depth, cancel)
        .await
        .with_context(|| format!("Crawl of {} failed", url))?;

    if report.cancelled {
        tracing::warn!("Crawl was cancelled; printing partial sitemap");
    }

    let rendered = render(&report, format).context("Failed to render sitemap")?;
    print!("{}", rendered);
    if !rendered.ends_with('\n') {
        println!();
    }

    print_statistics(&report.statistics);

    Ok(())
}

/// Handles the serve subcommand
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let crawler = Crawler::new(config.clone()).context("Failed to build crawler")?;

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    server::serve(crawler, &config.server, shutdown)
        .await
        .context("Server error")?;

    Ok(())
}
