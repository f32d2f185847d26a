//! Reasons a record leaves the pipeline
//!
//! Every record that enters the ring is retired exactly once, with exactly one
//! of these reasons. Retiring is what decrements the in-flight counter.

use std::fmt;

/// Represents why a page record was removed from circulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Retirement {
    // ===== Filtered =====
    /// URL was already admitted by the dedup archive
    Duplicate,

    /// URL host differs from the crawl origin
    OutOfScope,

    /// URL could not be parsed or has no host
    Unparsable,

    // ===== Failed =====
    /// Transport-level fetch failure (DNS, refused, timeout, body read)
    FetchFailed,

    // ===== Finished =====
    /// A fetched page was consumed by link extraction
    Consumed,

    /// A fetched page reached the end of the ring without being consumed
    Completed,

    // ===== Shutdown =====
    /// The downstream stage was gone when the record was forwarded
    Abandoned,
}

impl Retirement {
    /// Returns true if the record was dropped by a filter stage
    pub fn is_filtered(&self) -> bool {
        matches!(self, Self::Duplicate | Self::OutOfScope | Self::Unparsable)
    }

    /// Returns true if the record was retired because something went wrong
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::Abandoned)
    }

    /// Returns true if the record's page was fetched before retirement
    pub fn was_fetched(&self) -> bool {
        matches!(self, Self::Consumed | Self::Completed)
    }

    /// Short label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::OutOfScope => "out_of_scope",
            Self::Unparsable => "unparsable",
            Self::FetchFailed => "fetch_failed",
            Self::Consumed => "consumed",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    /// Returns all retirement reasons
    pub const fn all() -> [Self; 7] {
        [
            Self::Duplicate,
            Self::OutOfScope,
            Self::Unparsable,
            Self::FetchFailed,
            Self::Consumed,
            Self::Completed,
            Self::Abandoned,
        ]
    }
}

impl fmt::Display for Retirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
