//! HTTP fetch stage
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with bounded timeouts and idle pools
//! - Bounding the wait for response headers separately from the body
//! - Running a bounded number of requests concurrently within the stage

use crate::config::FetchConfig;
use crate::crawler::{PipeContext, Stage};
use crate::state::{PageRecord, Retirement};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

/// Builds an HTTP client with the configured limits
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sitemapper::config::FetchConfig;
/// use sitemapper::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        // Covers TCP connect and the TLS handshake
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .pool_max_idle_per_host(config.max_idle_per_host)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Stage that downloads the body of every record it receives
#[derive(Debug, Clone)]
pub struct FetchWorker {
    client: Client,
    header_timeout: Duration,
    concurrency: usize,
}

impl FetchWorker {
    /// Creates a worker with a client built from `config`
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            header_timeout: Duration::from_secs(config.response_header_timeout_secs),
            concurrency: config.concurrency.max(1),
        })
    }

    /// Overrides how long to wait for response headers
    pub fn with_header_timeout(mut self, timeout: Duration) -> Self {
        self.header_timeout = timeout;
        self
    }

    /// Fetches `record.url` and stores the full body in `record.content`
    ///
    /// Any completed response counts as a successful fetch, whatever its
    /// status code. Transport failures, header timeouts and body read errors
    /// are returned as errors and leave `record` untouched.
    pub async fn fetch(&self, record: &mut PageRecord) -> Result<(), FetchError> {
        let request = self.client.get(record.url.as_str()).send();
        let response = tokio::time::timeout(self.header_timeout, request)
            .await
            .map_err(|_| FetchError::HeaderTimeout {
                url: record.url.clone(),
            })?
            .map_err(|source| FetchError::Http {
                url: record.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %record.url, %status, "Non-success status");
        }

        let body = response.bytes().await.map_err(|source| FetchError::Http {
            url: record.url.clone(),
            source,
        })?;
        record.content = body.to_vec();

        Ok(())
    }

    async fn process(
        &self,
        ctx: &PipeContext,
        output: &mpsc::Sender<PageRecord>,
        mut record: PageRecord,
    ) {
        match self.fetch(&mut record).await {
            Ok(()) => {
                tracing::debug!(url = %record.url, bytes = record.content.len(), "Fetched");
                record.done = true;
                ctx.stats().record_fetched();
                ctx.forward(output, record).await;
            }
            Err(e) => {
                tracing::warn!(url = %record.url, "Fetch failed: {}", e);
                ctx.retire(record, Retirement::FetchFailed);
            }
        }
    }
}

#[async_trait]
impl Stage for FetchWorker {
    fn name(&self) -> &'static str {
        "fetch"
    }

    async fn pipe(
        &self,
        ctx: PipeContext,
        mut input: mpsc::Receiver<PageRecord>,
        output: mpsc::Sender<PageRecord>,
    ) {
        let mut in_progress = JoinSet::new();

        loop {
            tokio::select! {
                Some(joined) = in_progress.join_next(), if !in_progress.is_empty() => {
                    settle(joined);
                }
                received = input.recv(), if in_progress.len() < self.concurrency => {
                    let Some(record) = received else { break };
                    let worker = self.clone();
                    let ctx = ctx.clone();
                    let output = output.clone();
                    in_progress.spawn(async move {
                        worker.process(&ctx, &output, record).await;
                    });
                }
            }
        }

        // Output closes only once every request has resolved
        while let Some(joined) = in_progress.join_next().await {
            settle(joined);
        }
    }
}

/// Surfaces the outcome of a finished fetch task
///
/// A panicking task took its record down with it, so the panic is re-raised
/// on the stage task where the orchestrator reports it.
fn settle(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            std::panic::resume_unwind(e.into_panic());
        }
        tracing::error!("Fetch task failed: {}", e);
    }
}
