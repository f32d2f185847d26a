//! URL handling module for Sitemapper
//!
//! This module provides authority extraction and the link normalization used
//! by the link extractor.

mod domain;
mod normalize;

pub use domain::{extract_authority, parse_authority};
pub use normalize::{normalize_link, DEFAULT_ACCEPTED_SCHEMES};
