//! In-flight work counter used to detect quiescence
//!
//! The counter holds the number of records currently owned by a stage or
//! sitting in a channel. Producers register work before it becomes visible
//! downstream and retire it only after every record it spawned has been
//! registered, so the count can never touch zero while work remains.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle on the in-flight counter
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    drained: Notify,
}

impl InFlight {
    /// Creates a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `n` new records
    pub fn add(&self, n: usize) {
        if n > 0 {
            self.inner.count.fetch_add(n, Ordering::AcqRel);
        }
    }

    /// Retires one record, waking waiters when the count reaches zero
    pub fn done(&self) {
        let retired = self
            .inner
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });

        match retired {
            Ok(1) => self.inner.drained.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::error!("In-flight counter retired more records than were registered"),
        }
    }

    /// Current number of records in flight
    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Resolves once the count is zero
    ///
    /// Returns immediately if nothing is in flight.
    pub async fn quiesced(&self) {
        loop {
            let notified = self.inner.drained.notified();
            tokio::pin!(notified);
            // Register interest before checking so a concurrent `done` is not missed
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}
