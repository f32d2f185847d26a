//! Live crawl counters and the summary built from them
//!
//! Stages bump these counters as records move through the ring; the
//! orchestrator snapshots them once the crawl has quiesced.

use crate::state::Retirement;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

const REASONS: usize = Retirement::all().len();

/// Counters shared by every stage of a run
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_fetched: AtomicU64,
    links_discovered: AtomicU64,
    retired: [AtomicU64; REASONS],
}

impl CrawlStats {
    /// Creates a zeroed counter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful fetch
    pub fn record_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `count` links fanned out by the extractor
    pub fn record_discovered(&self, count: usize) {
        self.links_discovered
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Records one record leaving the ring
    pub fn record_retirement(&self, reason: Retirement) {
        self.retired[reason as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters
    pub fn snapshot(&self) -> CrawlStatistics {
        let retired_by_reason = Retirement::all()
            .into_iter()
            .map(|reason| (reason, self.retired[reason as usize].load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        CrawlStatistics {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            retired_by_reason,
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Pages whose body was fetched
    pub pages_fetched: u64,

    /// Links fanned out by the extractor, before dedup and scope filtering
    pub links_discovered: u64,

    /// Retired records per reason (zero counts omitted)
    pub retired_by_reason: HashMap<Retirement, u64>,
}

impl CrawlStatistics {
    /// Number of records retired for `reason`
    pub fn retired(&self, reason: Retirement) -> u64 {
        self.retired_by_reason.get(&reason).copied().unwrap_or(0)
    }

    /// Number of records retired for any reason
    pub fn total_retired(&self) -> u64 {
        self.retired_by_reason.values().sum()
    }

    /// Number of records retired because something went wrong
    pub fn total_errors(&self) -> u64 {
        self.total_where(Retirement::is_error)
    }

    /// Number of records dropped by a filter stage
    pub fn total_filtered(&self) -> u64 {
        self.total_where(Retirement::is_filtered)
    }

    /// Number of records retired after their page was fetched
    pub fn total_finished(&self) -> u64 {
        self.total_where(Retirement::was_fetched)
    }

    fn total_where(&self, class: fn(&Retirement) -> bool) -> u64 {
        self.retired_by_reason
            .iter()
            .filter(|(reason, _)| class(*reason))
            .map(|(_, count)| count)
            .sum()
    }
}

/// Logs statistics at info level
///
/// Stdout carries the sitemap, so the summary goes through tracing.
pub fn log_statistics(stats: &CrawlStatistics) {
    tracing::info!(
        "Crawl statistics: {} pages fetched, {} links discovered, {} records retired",
        stats.pages_fetched,
        stats.links_discovered,
        stats.total_retired()
    );
    tracing::info!(
        "  {} finished, {} filtered, {} errors",
        stats.total_finished(),
        stats.total_filtered(),
        stats.total_errors()
    );

    // Sort reasons by count (descending)
    let mut reason_counts: Vec<_> = stats.retired_by_reason.iter().collect();
    reason_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

    for (reason, count) in reason_counts {
        tracing::info!("  {}: {}", reason, count);
    }
}
