/// The unit of work that circulates through the crawl pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRecord {
    /// Absolute URL of the page
    pub url: String,

    /// Raw response body; empty until fetched
    pub content: Vec<u8>,

    /// True once the fetch stage has stored the body
    pub done: bool,
}

impl PageRecord {
    /// Creates an unfetched record for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: Vec::new(),
            done: false,
        }
    }
}
