//! Sitemapper main entry point
//!
//! This is the command-line interface for the Sitemapper site mapper.

use anyhow::{bail, Context};
use clap::Parser;
use sitemapper::config::{load_config, Config, RuleKind};
use sitemapper::output::log_statistics;
use sitemapper::url::parse_authority;
use sitemapper::{
    DedupFilter, FetchWorker, LinkExtractor, Orchestrator, PageRecord, ScopeFilter,
    SiteMapCollector, Stage,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sitemapper: maps every page reachable on a single host
///
/// Sitemapper starts from a seed URL, follows links and images that stay on
/// the seed's host, and prints a sitemaps.org document listing every page it
/// fetched.
#[derive(Parser, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "Maps every page reachable on a single host", long_about = None)]
struct Cli {
    /// Absolute URL to start crawling from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the sitemap to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Maximum concurrent requests (overrides the config file)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Follow anchors marked rel="nofollow"
    #[arg(long)]
    follow_nofollow: bool,

    /// Crawl links to other hosts as well
    #[arg(long)]
    no_scope: bool,

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
    let seed = validate_seed(&cli.seed)?;

    let archive = Arc::new(DedupFilter::new());
    let map = Arc::new(SiteMapCollector::new());
    let stages = build_stages(&config, &seed, &archive, &map)?;

    let report = Orchestrator::from_config(&config.pipeline)
        .run(PageRecord::new(seed), stages)
        .await
        .context("Crawl failed")?;

    tracing::info!(
        "Mapped {} of {} distinct URLs in {:.2?}",
        map.len(),
        archive.archived_count(),
        report.elapsed
    );
    log_statistics(&report.stats);
    if map.is_empty() {
        tracing::warn!("No page could be fetched, the sitemap is empty");
    }

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            map.write_to(BufWriter::new(file))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Sitemap written to {}", path.display());
        }
        None => map
            .write_to(io::stdout().lock())
            .context("Failed to write sitemap to stdout")?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for the sitemap.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemapper=info,warn"),
            1 => EnvFilter::new("sitemapper=debug,info"),
            2 => EnvFilter::new("sitemapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(concurrency) = cli.concurrency {
        config.fetch.concurrency = concurrency;
    }
    if cli.follow_nofollow {
        for rule in config.extract.rules.iter_mut() {
            if *rule == RuleKind::AnchorNoFollow {
                *rule = RuleKind::Anchor;
            }
        }
    }
    if cli.no_scope {
        config.pipeline.scope = false;
    }

    sitemapper::config::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Checks that the seed is an absolute URL with a host
fn validate_seed(seed: &str) -> anyhow::Result<String> {
    let seed = seed.trim();
    if seed.is_empty() {
        bail!("Seed URL is empty");
    }
    parse_authority(seed).with_context(|| format!("Invalid seed URL: {}", seed))?;
    Ok(seed.to_string())
}

/// Wires Dedup -> Scope -> Fetch -> SiteMap -> Extract
fn build_stages(
    config: &Config,
    seed: &str,
    archive: &Arc<DedupFilter>,
    map: &Arc<SiteMapCollector>,
) -> anyhow::Result<Vec<Arc<dyn Stage>>> {
    let mut stages: Vec<Arc<dyn Stage>> = vec![Arc::clone(archive) as Arc<dyn Stage>];

    if config.pipeline.scope {
        let scope = ScopeFilter::new(seed).context("Failed to scope crawl to seed host")?;
        tracing::info!("Crawl scoped to {}", scope.origin_host());
        stages.push(Arc::new(scope));
    } else {
        tracing::warn!("Scope filter disabled, links to other hosts will be crawled");
    }

    let fetcher = FetchWorker::new(&config.fetch).context("Failed to build HTTP client")?;
    stages.push(Arc::new(fetcher));
    stages.push(Arc::clone(map) as Arc<dyn Stage>);
    stages.push(Arc::new(LinkExtractor::from_config(&config.extract)));

    Ok(stages)
}
