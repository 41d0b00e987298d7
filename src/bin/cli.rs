//! Exchange Crawler CLI
//!
//! Local execution entry point: crawl the catalog, persist the
//! snapshot, and report the diff against the previous run.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use exchange_crawler::{
    error::Result,
    models::Config,
    pipeline::{diff, CrawlControl, CrawlEngine, LogSink},
    services::HttpSession,
    storage::{self, SnapshotFile},
};

/// exchange-crawler - Exchange catalog update tracker
#[derive(Parser, Debug)]
#[command(
    name = "exchange-crawler",
    version,
    about = "Tracks new and updated resources on the Exchange catalog"
)]
struct Cli {
    /// Path to storage directory containing config and snapshots
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the catalog and diff against the previous snapshot
    Crawl {
        /// Snapshot output path (default: {storage_dir}/current.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Diff two snapshot files offline
    Diff {
        /// Current snapshot file
        current: PathBuf,
        /// Past snapshot file
        past: PathBuf,
        /// Write the diff result as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration files
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Arc::new(Config::load_or_default(&config_path));
    let snapshot_path = cli.storage_dir.join("current.json");

    match cli.command {
        Command::Crawl { output } => {
            config.validate()?;
            let output = output.unwrap_or(snapshot_path);

            let previous = storage::load_snapshot_optional(&output).await?;

            let (control, receiver) = CrawlControl::channel();
            tokio::spawn({
                let control = control.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        log::warn!("Interrupt received; stopping after the current item...");
                        control.stop();
                    }
                }
            });

            let mut session = HttpSession::new(&config.crawler, &config.selectors.item_link)?;
            let mut engine = CrawlEngine::new(Arc::clone(&config), receiver, Arc::new(LogSink));
            let outcome = engine.run(&mut session).await?;

            log::info!(
                "Crawl finished: {} records, {} failures, state {:?}",
                outcome.snapshot.len(),
                outcome.fetch_failures,
                outcome.state
            );

            let snapshot = SnapshotFile::new(outcome.snapshot);
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            storage::save_snapshot(&output, &snapshot).await?;
            log::info!("Snapshot saved to {}", output.display());

            match previous {
                Some(past) => report_diff(&diff(&snapshot.resources, &past.resources)),
                None => log::info!("No previous snapshot; skipping diff."),
            }
        }

        Command::Diff {
            current,
            past,
            output,
        } => {
            let current = storage::load_snapshot(&current).await?;
            let past = storage::load_snapshot(&past).await?;

            let result = diff(&current.resources, &past.resources);
            report_diff(&result);

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&result)?;
                tokio::fs::write(&path, json).await?;
                log::info!("Diff result written to {}", path.display());
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK ({} title selectors, {} load-more selectors)",
                config.selectors.title.len(),
                config.selectors.load_more.len()
            );
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            match storage::load_snapshot_optional(&snapshot_path).await? {
                Some(snapshot) => {
                    log::info!("Current snapshot: {} records", snapshot.count);
                    log::info!("Captured at: {}", snapshot.scraped_at);
                }
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    Ok(())
}

/// Log the outcome of a snapshot comparison.
fn report_diff(result: &exchange_crawler::pipeline::DiffResult) {
    let stats = &result.stats;

    log::info!(
        "Diff: {} changed ({} new, {} modified, {} removed) out of {} current / {} past",
        stats.total_changed,
        stats.new_count,
        stats.modified_count,
        stats.removed_count,
        stats.total_current,
        stats.total_past
    );

    for record in &result.records {
        log::info!(
            "  {} {} (v{})",
            if stats.new_identities.contains(&record.identity) {
                "NEW"
            } else {
                "UPD"
            },
            record.label(),
            record.version_or_empty()
        );
    }

    if !stats.removed_identities.is_empty() {
        log::info!("  Removed identities: {:?}", stats.removed_identities);
    }
}
