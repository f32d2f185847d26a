//! Duplicate suppression for the crawl ring

use crate::crawler::{PipeContext, Stage};
use crate::state::{PageRecord, Retirement};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Outcome of offering a URL to the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First time this URL was offered; it is now archived
    New,
    /// The URL was already archived
    Seen,
}

/// Stage that lets each URL through at most once per run
///
/// The archive only grows. URLs are compared as exact strings, so
/// `http://host/a` and `http://host/a/` are distinct entries.
#[derive(Debug, Default)]
pub struct DedupFilter {
    archive: Mutex<HashSet<String>>,
}

impl DedupFilter {
    /// Creates a filter with an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Tests and archives `url` in one critical section
    ///
    /// # Example
    ///
    /// ```
    /// use sitemapper::crawler::{Admission, DedupFilter};
    ///
    /// let filter = DedupFilter::new();
    /// assert_eq!(filter.check_and_admit("http://localhost/a"), Admission::New);
    /// assert_eq!(filter.check_and_admit("http://localhost/a"), Admission::Seen);
    /// ```
    pub fn check_and_admit(&self, url: &str) -> Admission {
        let mut archive = self.archive.lock().unwrap_or_else(PoisonError::into_inner);
        if archive.contains(url) {
            Admission::Seen
        } else {
            archive.insert(url.to_string());
            Admission::New
        }
    }

    /// Number of distinct URLs admitted so far
    pub fn archived_count(&self) -> usize {
        self.archive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Stage for DedupFilter {
    fn name(&self) -> &'static str {
        "dedup"
    }

    async fn pipe(
        &self,
        ctx: PipeContext,
        mut input: mpsc::Receiver<PageRecord>,
        output: mpsc::Sender<PageRecord>,
    ) {
        while let Some(record) = input.recv().await {
            match self.check_and_admit(&record.url) {
                Admission::New => ctx.forward(&output, record).await,
                Admission::Seen => {
                    tracing::trace!(url = %record.url, "Already archived");
                    ctx.retire(record, Retirement::Duplicate);
                }
            }
        }
    }
}
