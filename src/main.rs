//! LightSNS-Mirror main entry point
//!
//! This is the command-line interface for the LightSNS forum mirror.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use lightsns_mirror::config::{load_config_with_hash, Config};
use lightsns_mirror::crawler::{Coordinator, RunOutcome, Target};
use lightsns_mirror::output::{
    generate_markdown_summary, print_statistics, Notifier, RunSummary, SilentNotifier,
    TerminalBell,
};
use lightsns_mirror::shutdown::install_signal_handler;
use lightsns_mirror::storage::CursorStore;
use lightsns_mirror::ResourceKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// LightSNS-Mirror: a resumable offline mirror for LightSNS forums
///
/// Walks posts, author profiles and author cards by numeric ID, follows
/// their paginated comments and feeds, then mirrors the static assets the
/// saved pages reference. Progress is kept in cursor files, so re-running
/// resumes where the last run stopped.
#[derive(Parser, Debug)]
#[command(name = "lightsns-mirror")]
#[command(version = "1.0.0")]
#[command(about = "A resumable offline mirror for LightSNS forums", long_about = None)]
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

    /// Run only these walkers (repeatable); defaults to all, in order
    #[arg(long, value_enum)]
    only: Vec<TargetArg>,

    /// Validate config and show what would be mirrored without fetching
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show the stored cursor positions and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,

    /// Do not ring the terminal bell on alerts
    #[arg(long)]
    no_bell: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum TargetArg {
    Posts,
    Authors,
    AuthorCards,
    Assets,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Posts => Target::Posts,
            TargetArg::Authors => Target::Authors,
            TargetArg::AuthorCards => Target::AuthorCards,
            TargetArg::Assets => Target::Assets,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &selected_targets(&cli.only));
    } else if cli.status {
        handle_status(&config)?;
    } else {
        let notifier: Arc<dyn Notifier> = if cli.no_bell {
            Arc::new(SilentNotifier)
        } else {
            Arc::new(TerminalBell)
        };
        handle_mirror(config, config_hash, &selected_targets(&cli.only), notifier).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lightsns_mirror=info,warn"),
            1 => EnvFilter::new("lightsns_mirror=debug,info"),
            2 => EnvFilter::new("lightsns_mirror=trace,debug"),
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

/// Requested targets in run order, all of them when none were named
fn selected_targets(only: &[TargetArg]) -> Vec<Target> {
    if only.is_empty() {
        return Target::ALL.to_vec();
    }
    let requested: Vec<Target> = only.iter().map(|&arg| arg.into()).collect();
    Target::ALL
        .into_iter()
        .filter(|target| requested.contains(target))
        .collect()
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config, targets: &[Target]) {
    println!("=== LightSNS-Mirror Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Asset host: {}", config.site.asset_host);
    println!("  Asset CDN: {}", config.site.asset_cdn_base);
    println!(
        "  Session cookie: {}",
        if config.site.session_cookie.is_some() {
            "set"
        } else {
            "none"
        }
    );

    println!("\nCrawler:");
    println!("  Post ceiling: {}", config.crawler.post_ceiling);
    println!("  Author ceiling: {}", config.crawler.author_ceiling);
    println!("  Author card ceiling: {}", config.crawler.author_card_ceiling);
    println!("  Retry limit: {}", config.crawler.retry_limit);
    println!(
        "  Author mode: {:?} (window {})",
        config.crawler.author_mode, config.crawler.author_batch_size
    );
    println!("  Asset delay: {}ms", config.crawler.asset_delay_ms);

    println!("\nUser Agent:");
    println!("  Crawler: {}", config.user_agent.header_value());
    println!("  Browser: {}", config.user_agent.browser_user_agent);

    println!("\nOutput:");
    println!("  Root: {}", config.output.root);
    println!("  Cursors: {}", config.output.state_dir);
    println!("  Mirror root: {}", config.output.mirror_root);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!(
        "\nExcluded assets: {} URLs, {} fragments",
        config.mirror.excluded_urls.len(),
        config.mirror.excluded_fragments.len()
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would run: {:?}", targets);
}

/// Handles the --status mode: prints the cursor positions
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let mut cursors = CursorStore::open(&config.output.state_dir)?;

    println!("Cursors: {}\n", config.output.state_dir);
    for (kind, position) in cursor_positions(&mut cursors)? {
        println!("  {:<12} {}", kind.to_string(), position);
    }

    Ok(())
}

fn cursor_positions(cursors: &mut CursorStore) -> anyhow::Result<Vec<(ResourceKind, u64)>> {
    let mut positions = Vec::with_capacity(ResourceKind::ALL.len());
    for kind in ResourceKind::ALL {
        positions.push((kind, cursors.get(kind)?));
    }
    Ok(positions)
}

/// Handles the main mirror run
async fn handle_mirror(
    config: Config,
    config_hash: String,
    targets: &[Target],
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<()> {
    let started_at = chrono::Utc::now();
    let base_url = config.site.base_url.clone();
    let summary_path = config.output.summary_path.clone();

    tracing::info!("Mirroring {} ({:?})", base_url, targets);

    let cancel = install_signal_handler();
    let mut coordinator = Coordinator::new(config, notifier, cancel)?;

    let outcome = match coordinator.run(targets).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Mirror run failed: {}", e);
            print_statistics(&coordinator.stats());
            return Err(e.into());
        }
    };

    println!();
    print_statistics(&outcome.stats);

    if let Some(path) = summary_path {
        let RunOutcome {
            walks,
            assets,
            stats,
        } = outcome;
        let summary = RunSummary {
            started_at,
            finished_at: chrono::Utc::now(),
            config_hash,
            base_url,
            walks,
            assets,
            cursors: cursor_positions(coordinator.cursors())?,
            stats,
        };
        generate_markdown_summary(&summary, Path::new(&path))
            .with_context(|| format!("Failed to write summary to {}", path))?;
        tracing::info!("Summary written to {}", path);
    }

    Ok(())
}
