//! Output module for the crawl results
//!
//! This module handles:
//! - Collecting fetched URLs and rendering them as a sitemap
//! - Recording crawl statistics and logging the summary

mod sitemap;
pub mod stats;

pub use sitemap::{SiteMapCollector, SITEMAP_NAMESPACE};
pub use stats::{log_statistics, CrawlStatistics, CrawlStats};
