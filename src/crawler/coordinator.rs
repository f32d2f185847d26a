//! Crawl orchestration
//!
//! The orchestrator wires an ordered list of stages into a closed ring:
//!
//! ```text
//! frontier -> stage 1 -> ... -> stage n -> tail --+
//!    ^                                            |
//!    +--------------------------------------------+
//! ```
//!
//! The frontier is unbounded so the loop-back edge never blocks; the
//! orchestrator pumps it into the bounded head channel. The crawl is complete
//! once the in-flight counter reaches zero, at which point the head channel
//! is closed and the closure cascades through every stage.

use crate::config::PipelineConfig;
use crate::crawler::{InFlight, PipeContext, Stage};
use crate::output::{CrawlStatistics, CrawlStats};
use crate::state::{PageRecord, Retirement};
use crate::{CrawlError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// How often crawl progress is logged
const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Name reported for the tail task that feeds the frontier
const TAIL: &str = "frontier";

/// Outcome of a completed crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Counters snapshotted after quiescence
    pub stats: CrawlStatistics,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Runs stages as a self-feeding ring until no work remains
#[derive(Debug, Clone)]
pub struct Orchestrator {
    channel_capacity: usize,
}

impl Orchestrator {
    /// Creates an orchestrator with inter-stage channels of `channel_capacity`
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Creates an orchestrator from the `[pipeline]` configuration section
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Crawls from `origin` through `stages` until quiescence
    ///
    /// Records that reach the end of the ring with `done` set are retired
    /// there; all others go back to the frontier.
    ///
    /// # Errors
    ///
    /// * `CrawlError::EmptyPipeline` - `stages` is empty
    /// * `CrawlError::InvalidSeed` - the origin URL is empty
    /// * `CrawlError::StageAborted` - a stage returned before the crawl quiesced
    /// * `CrawlError::Join` - a stage panicked
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sitemapper::config::Config;
    /// use sitemapper::{DedupFilter, FetchWorker, LinkExtractor, Orchestrator, PageRecord, Stage};
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Config::default();
    /// let stages: Vec<Arc<dyn Stage>> = vec![
    ///     Arc::new(DedupFilter::new()),
    ///     Arc::new(FetchWorker::new(&config.fetch)?),
    ///     Arc::new(LinkExtractor::from_config(&config.extract)),
    /// ];
    ///
    /// let report = Orchestrator::from_config(&config.pipeline)
    ///     .run(PageRecord::new("http://localhost:8080/home"), stages)
    ///     .await?;
    /// println!("Fetched {} pages", report.stats.pages_fetched);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(
        &self,
        origin: PageRecord,
        stages: Vec<Arc<dyn Stage>>,
    ) -> Result<CrawlReport> {
        if stages.is_empty() {
            return Err(CrawlError::EmptyPipeline);
        }
        if origin.url.trim().is_empty() {
            return Err(CrawlError::InvalidSeed("empty URL".to_string()));
        }

        let start = Instant::now();
        let in_flight = InFlight::new();
        let stats = Arc::new(CrawlStats::new());
        let ctx = PipeContext::new(in_flight.clone(), Arc::clone(&stats));

        tracing::info!(seed = %origin.url, stages = stages.len(), "Starting crawl");

        // Seed the frontier
        let (frontier_tx, mut frontier_rx) = mpsc::unbounded_channel();
        in_flight.add(1);
        frontier_tx.send(origin).map_err(|_| CrawlError::FrontierClosed)?;

        // Wire the ring
        let (head_tx, mut next_rx) = mpsc::channel(self.channel_capacity);
        let mut tasks = JoinSet::new();
        for stage in stages {
            let (output, following) = mpsc::channel(self.channel_capacity);
            let input = std::mem::replace(&mut next_rx, following);
            let ctx = ctx.clone();
            tasks.spawn(async move {
                stage.pipe(ctx, input, output).await;
                stage.name()
            });
        }
        tasks.spawn(recirculate(ctx.clone(), next_rx, frontier_tx));

        let mut progress =
            tokio::time::interval_at(start + PROGRESS_INTERVAL, PROGRESS_INTERVAL);

        loop {
            tokio::select! {
                _ = in_flight.quiesced() => break,
                Some(record) = frontier_rx.recv() => {
                    if let Err(mpsc::error::SendError(record)) = head_tx.send(record).await {
                        tracing::error!(url = %record.url, "First stage closed, dropping record");
                        ctx.retire(record, Retirement::Abandoned);
                    }
                }
                Some(joined) = tasks.join_next() => {
                    let stage = joined?;
                    tracing::error!("Stage '{}' exited before the crawl quiesced", stage);
                    return Err(CrawlError::StageAborted {
                        stage: stage.to_string(),
                    });
                }
                _ = progress.tick() => {
                    tracing::info!(
                        "Progress: {} records in flight, {} pages fetched, {:.0?} elapsed",
                        in_flight.count(),
                        stats.snapshot().pages_fetched,
                        start.elapsed()
                    );
                }
            }
        }

        // Closing the head cascades through every stage to the tail
        drop(head_tx);
        while let Some(joined) = tasks.join_next().await {
            let stage = joined?;
            tracing::debug!("Stage '{}' finished", stage);
        }

        let elapsed = start.elapsed();
        tracing::info!("Crawl complete in {:.2?}", elapsed);

        Ok(CrawlReport {
            stats: stats.snapshot(),
            elapsed,
        })
    }
}

/// Tail of the ring: retires finished records and recirculates the rest
async fn recirculate(
    ctx: PipeContext,
    mut input: mpsc::Receiver<PageRecord>,
    frontier: mpsc::UnboundedSender<PageRecord>,
) -> &'static str {
    while let Some(record) = input.recv().await {
        if record.done {
            ctx.retire(record, Retirement::Completed);
            continue;
        }
        if let Err(mpsc::error::SendError(record)) = frontier.send(record) {
            tracing::error!(url = %record.url, "Frontier closed, dropping record");
            ctx.retire(record, Retirement::Abandoned);
        }
    }
    TAIL
}
