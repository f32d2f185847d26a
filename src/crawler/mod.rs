//! Crawler module: the crawl ring and the stages spliced into it
//!
//! This module contains the core crawling logic, including:
//! - The `Stage` contract and the in-flight counter behind quiescence
//! - Duplicate suppression and same-host scoping
//! - HTTP fetching with bounded concurrency
//! - HTML tokenization and link extraction
//! - Overall crawl orchestration

mod archive;
mod coordinator;
mod fetcher;
mod parser;
mod scope;
mod stage;
mod tracker;

pub use archive::{Admission, DedupFilter};
pub use coordinator::{CrawlReport, Orchestrator};
pub use fetcher::{build_http_client, FetchWorker};
pub use parser::{
    anchor_href, anchor_href_no_follow, image_source, tokenize, ExtractionRule, LinkExtractor,
    Token, TokenKind,
};
pub use scope::ScopeFilter;
pub use stage::{PipeContext, Stage};
pub use tracker::InFlight;
