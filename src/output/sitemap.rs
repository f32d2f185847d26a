//! Sitemap collection and rendering
//!
//! The collector rides along in the crawl ring as a pass-through stage and
//! remembers the URL of every record whose body was fetched. Once the ring has
//! drained it renders those URLs as a sitemaps.org `urlset` document.

use crate::crawler::{PipeContext, Stage};
use crate::state::PageRecord;
use async_trait::async_trait;
use std::io;
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc;

/// XML namespace of the sitemap protocol
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Collects fetched URLs and renders them as a sitemap
#[derive(Debug, Default)]
pub struct SiteMapCollector {
    urls: RwLock<Vec<String>>,
}

impl SiteMapCollector {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL to the map
    pub fn add(&self, url: impl Into<String>) {
        self.urls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.into());
    }

    /// Returns the recorded URLs in insertion order
    pub fn urls(&self) -> Vec<String> {
        self.urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded URLs
    pub fn len(&self) -> usize {
        self.urls.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the sitemap document
    ///
    /// Entries appear in insertion order. Only call this once the crawl has
    /// quiesced if the document should be complete.
    ///
    /// # Example
    ///
    /// ```
    /// use sitemapper::output::SiteMapCollector;
    ///
    /// let map = SiteMapCollector::new();
    /// map.add("http://localhost:8080/home");
    /// assert!(map.render().contains("<loc>http://localhost:8080/home</loc>"));
    /// ```
    pub fn render(&self) -> String {
        let urls = self.urls.read().unwrap_or_else(PoisonError::into_inner);

        let mut document = String::new();
        document.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        document.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NAMESPACE));
        for url in urls.iter() {
            document.push_str("\t<url>\n");
            document.push_str(&format!("\t\t<loc>{}</loc>\n", escape_xml(url)));
            document.push_str("\t</url>\n");
        }
        document.push_str("</urlset>\n");

        document
    }

    /// Writes the rendered sitemap to `writer`
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())?;
        writer.flush()
    }
}

#[async_trait]
impl Stage for SiteMapCollector {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    async fn pipe(
        &self,
        ctx: PipeContext,
        mut input: mpsc::Receiver<PageRecord>,
        output: mpsc::Sender<PageRecord>,
    ) {
        while let Some(record) = input.recv().await {
            if record.done {
                self.add(record.url.clone());
            }
            ctx.forward(&output, record).await;
        }
    }
}

/// Escapes the five XML special characters
fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::InFlight;
    use crate::output::CrawlStats;
    use std::sync::Arc;

    #[test]
    fn test_render_empty() {
        let map = SiteMapCollector::new();
        assert_eq!(
            map.render(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
             </urlset>\n"
        );
    }

    #[test]
    fn test_render_single_url() {
        let map = SiteMapCollector::new();
        map.add("http://localhost:8080/home");

        let document = map.render();
        assert_eq!(document.matches("<url>").count(), 1);
        assert_eq!(document.matches("<loc>").count(), 1);
        assert!(document.contains("\t<url>\n\t\t<loc>http://localhost:8080/home</loc>\n\t</url>\n"));
    }

    #[test]
    fn test_render_keeps_insertion_order() {
        let map = SiteMapCollector::new();
        map.add("http://localhost:8080/b");
        map.add("http://localhost:8080/a");

        let document = map.render();
        let b = document.find("/b</loc>").unwrap();
        let a = document.find("/a</loc>").unwrap();
        assert!(b < a);
        assert_eq!(map.urls(), vec!["http://localhost:8080/b", "http://localhost:8080/a"]);
    }

    #[test]
    fn test_render_escapes_query_separators() {
        let map = SiteMapCollector::new();
        map.add("http://localhost:8080/search?q=a&page=2");
        assert!(map
            .render()
            .contains("<loc>http://localhost:8080/search?q=a&amp;page=2</loc>"));
    }

    #[test]
    fn test_write_to() {
        let map = SiteMapCollector::new();
        map.add("http://localhost:8080/home");

        let mut buffer = Vec::new();
        map.write_to(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), map.render());
    }

    #[test]
    fn test_concurrent_adds() {
        let map = Arc::new(SiteMapCollector::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let map = Arc::clone(&map);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        map.add(format!("http://localhost/{}/{}", i, j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(map.len(), 400);
    }

    #[tokio::test]
    async fn test_pipe_records_only_fetched_pages() {
        let map = Arc::new(SiteMapCollector::new());
        let in_flight = InFlight::new();
        let ctx = PipeContext::new(in_flight.clone(), Arc::new(CrawlStats::new()));
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);

        let stage = Arc::clone(&map);
        let task = tokio::spawn(async move { stage.pipe(ctx, in_rx, out_tx).await });

        let mut fetched = PageRecord::new("http://localhost:8080/home");
        fetched.done = true;
        in_flight.add(2);
        in_tx.send(fetched).await.unwrap();
        in_tx.send(PageRecord::new("http://localhost:8080/about")).await.unwrap();
        drop(in_tx);

        // Both records are forwarded, nothing is retired
        assert!(out_rx.recv().await.unwrap().done);
        assert!(!out_rx.recv().await.unwrap().done);
        assert!(out_rx.recv().await.is_none());
        task.await.unwrap();

        assert_eq!(in_flight.count(), 2);
        assert_eq!(map.urls(), vec!["http://localhost:8080/home"]);
    }
}
