//! State module for the records moving through the crawl ring
//!
//! # Components
//!
//! - `PageRecord`: a URL, its fetched body and a completion flag
//! - `Retirement`: why a record left the ring

mod page_record;
mod retirement;

pub use page_record::PageRecord;
pub use retirement::Retirement;
