//! Configuration module for Sitemapper
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so crawling works without one.
//!
//! # Example
//!
//! ```no_run
//! use sitemapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemapper.toml")).unwrap();
//! println!("Request timeout: {}s", config.fetch.request_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ExtractConfig, FetchConfig, PipelineConfig, RuleKind};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
