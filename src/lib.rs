//! Sitemapper: a single-host site mapper
//!
//! This crate crawls every page reachable from a seed URL on the seed's host
//! and renders the visited pages as a sitemaps.org document. Work circulates
//! through a closed ring of pipeline stages; completion is detected by
//! counting the records still in flight rather than by exhausting a known
//! input.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl setup and orchestration
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Pipeline has no stages")]
    EmptyPipeline,

    #[error("Frontier closed before the seed could be injected")]
    FrontierClosed,

    #[error("Stage '{stage}' stopped before the crawl quiesced")]
    StageAborted { stage: String },

    #[error("Stage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Empty link")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("No host found in {0}")]
    MissingHost(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Per-record fetch failures
///
/// These never abort a crawl: the fetch stage logs them and retires the
/// record.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Timed out waiting for response headers from {url}")]
    HeaderTimeout { url: String },
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    DedupFilter, FetchWorker, LinkExtractor, Orchestrator, ScopeFilter, Stage,
};
pub use output::SiteMapCollector;
pub use state::{PageRecord, Retirement};
