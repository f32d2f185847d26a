//! The stage contract shared by every component spliced into the crawl ring
//!
//! A stage reads records from one input channel and, for each record, either
//! forwards it (possibly transformed) to its output channel or retires it.
//! When the input is exhausted the stage returns, dropping its output sender,
//! which closes the next stage's input in turn.

use crate::crawler::InFlight;
use crate::output::CrawlStats;
use crate::state::{PageRecord, Retirement};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A component that can be spliced into the crawl pipeline
///
/// Implementations must account for every record they receive exactly once:
/// either hand it to [`PipeContext::forward`] or to [`PipeContext::retire`].
/// A stage that creates records must [`PipeContext::register`] them before
/// retiring the record they came from.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Consumes `input` until it closes, forwarding or retiring each record
    async fn pipe(
        &self,
        ctx: PipeContext,
        input: mpsc::Receiver<PageRecord>,
        output: mpsc::Sender<PageRecord>,
    );
}

/// Bookkeeping handles passed to every stage of a run
#[derive(Debug, Clone)]
pub struct PipeContext {
    in_flight: InFlight,
    stats: Arc<CrawlStats>,
}

impl PipeContext {
    /// Creates a context over a run's counter and statistics
    pub fn new(in_flight: InFlight, stats: Arc<CrawlStats>) -> Self {
        Self { in_flight, stats }
    }

    /// The run's in-flight counter
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// The run's statistics
    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Registers `count` records about to be created
    pub fn register(&self, count: usize) {
        self.in_flight.add(count);
    }

    /// Removes a record from circulation
    pub fn retire(&self, record: PageRecord, reason: Retirement) {
        tracing::trace!(url = %record.url, %reason, "Retiring record");
        self.stats.record_retirement(reason);
        self.in_flight.done();
    }

    /// Sends a record downstream
    ///
    /// If the next stage is gone the record is retired as abandoned so the
    /// counter stays balanced.
    pub async fn forward(&self, output: &mpsc::Sender<PageRecord>, record: PageRecord) {
        if let Err(mpsc::error::SendError(record)) = output.send(record).await {
            tracing::error!(url = %record.url, "Downstream stage closed, dropping record");
            self.retire(record, Retirement::Abandoned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PipeContext {
        PipeContext::new(InFlight::new(), Arc::new(CrawlStats::new()))
    }

    #[test]
    fn test_retire_decrements_and_counts() {
        let ctx = context();
        ctx.register(2);
        ctx.retire(PageRecord::new("http://localhost/a"), Retirement::Duplicate);

        assert_eq!(ctx.in_flight().count(), 1);
        assert_eq!(ctx.stats().snapshot().retired(Retirement::Duplicate), 1);
    }

    #[tokio::test]
    async fn test_forward_keeps_record_in_flight() {
        let ctx = context();
        let (tx, mut rx) = mpsc::channel(1);
        ctx.register(1);

        ctx.forward(&tx, PageRecord::new("http://localhost/a")).await;

        assert_eq!(ctx.in_flight().count(), 1);
        assert_eq!(rx.recv().await.unwrap().url, "http://localhost/a");
    }

    #[tokio::test]
    async fn test_forward_to_closed_stage_abandons() {
        let ctx = context();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        ctx.register(1);

        ctx.forward(&tx, PageRecord::new("http://localhost/a")).await;

        assert_eq!(ctx.in_flight().count(), 0);
        assert_eq!(ctx.stats().snapshot().retired(Retirement::Abandoned), 1);
    }
}
