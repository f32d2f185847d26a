//! Same-host scoping for the crawl ring

use crate::crawler::{PipeContext, Stage};
use crate::state::{PageRecord, Retirement};
use crate::url::parse_authority;
use crate::UrlResult;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Stage that drops records whose host differs from the crawl origin
///
/// Hosts are compared case-sensitively by authority (host plus any port)
/// exactly as written, so `www.example.com`, `WWW.example.com`,
/// `www.example.com:80` and `example.com` are all different origins.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    origin_host: String,
}

impl ScopeFilter {
    /// Creates a filter scoped to the host of `origin_url`
    ///
    /// # Errors
    ///
    /// Returns an error if `origin_url` does not parse or has no host.
    ///
    /// # Example
    ///
    /// ```
    /// use sitemapper::crawler::ScopeFilter;
    ///
    /// let scope = ScopeFilter::new("http://localhost:8080/home").unwrap();
    /// assert_eq!(scope.origin_host(), "localhost:8080");
    /// assert!(ScopeFilter::new("localhost/home").is_err());
    /// ```
    pub fn new(origin_url: &str) -> UrlResult<Self> {
        let origin_host = parse_authority(origin_url)?.to_string();
        Ok(Self { origin_host })
    }

    /// Authority every admitted record must share
    pub fn origin_host(&self) -> &str {
        &self.origin_host
    }

    /// Checks whether `url` is on the crawl origin
    ///
    /// # Errors
    ///
    /// Returns an error if `url` does not parse or has no host.
    pub fn same_origin(&self, url: &str) -> UrlResult<bool> {
        Ok(parse_authority(url)? == self.origin_host)
    }
}

#[async_trait]
impl Stage for ScopeFilter {
    fn name(&self) -> &'static str {
        "scope"
    }

    async fn pipe(
        &self,
        ctx: PipeContext,
        mut input: mpsc::Receiver<PageRecord>,
        output: mpsc::Sender<PageRecord>,
    ) {
        while let Some(record) = input.recv().await {
            match self.same_origin(&record.url) {
                Ok(true) => ctx.forward(&output, record).await,
                Ok(false) => {
                    tracing::debug!(url = %record.url, origin = %self.origin_host, "Out of scope");
                    ctx.retire(record, Retirement::OutOfScope);
                }
                Err(e) => {
                    tracing::warn!(url = %record.url, "Cannot scope record: {}", e);
                    ctx.retire(record, Retirement::Unparsable);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::InFlight;
    use crate::output::CrawlStats;
    use crate::UrlError;
    use std::sync::Arc;

    #[test]
    fn test_origin_requires_host() {
        assert!(matches!(
            ScopeFilter::new("www.format.com"),
            Err(UrlError::Parse(_))
        ));
        assert!(matches!(
            ScopeFilter::new("mailto:someone@example.com"),
            Err(UrlError::MissingHost(_))
        ));
    }

    #[test]
    fn test_same_host_matches() {
        let scope = ScopeFilter::new("http://www.run-test.com/home").unwrap();
        assert_eq!(scope.same_origin("http://www.run-test.com/about"), Ok(true));
        assert_eq!(scope.same_origin("https://www.run-test.com/"), Ok(true));
    }

    #[test]
    fn test_other_hosts_do_not_match() {
        let scope = ScopeFilter::new("http://www.run-test.com/home").unwrap();
        assert_eq!(scope.same_origin("http://external1.com"), Ok(false));
        assert_eq!(scope.same_origin("http://run-test.com/home"), Ok(false));
        assert_eq!(scope.same_origin("http://www.run-test.com:8080/home"), Ok(false));
    }

    #[test]
    fn test_host_spelling_must_match_exactly() {
        let scope = ScopeFilter::new("http://www.run-test.com/home").unwrap();
        assert_eq!(scope.same_origin("http://WWW.RUN-TEST.COM/about"), Ok(false));
        assert_eq!(scope.same_origin("http://www.run-test.com:80/about"), Ok(false));
        assert_eq!(scope.same_origin("http://user@www.run-test.com/about"), Ok(true));
    }

    #[test]
    fn test_ftp_on_same_host_matches() {
        let scope = ScopeFilter::new("http://www.run-test.com/home").unwrap();
        assert_eq!(scope.same_origin("ftp://www.run-test.com"), Ok(true));
    }

    #[test]
    fn test_unparsable_url_is_an_error() {
        let scope = ScopeFilter::new("http://localhost/").unwrap();
        assert!(scope.same_origin("not a url").is_err());
    }

    #[tokio::test]
    async fn test_pipe_drops_foreign_and_broken_records() {
        let scope = Arc::new(ScopeFilter::new("http://localhost:8080/home").unwrap());
        let in_flight = InFlight::new();
        let stats = Arc::new(CrawlStats::new());
        let ctx = PipeContext::new(in_flight.clone(), Arc::clone(&stats));
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);

        let stage = Arc::clone(&scope);
        let task = tokio::spawn(async move { stage.pipe(ctx, in_rx, out_tx).await });

        in_flight.add(3);
        for url in ["http://localhost:8080/about", "http://LOCALHOST:8080/about", "::"] {
            in_tx.send(PageRecord::new(url)).await.unwrap();
        }
        drop(in_tx);

        assert_eq!(out_rx.recv().await.unwrap().url, "http://localhost:8080/about");
        assert!(out_rx.recv().await.is_none());
        task.await.unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(in_flight.count(), 1);
        assert_eq!(snapshot.retired(Retirement::OutOfScope), 1);
        assert_eq!(snapshot.retired(Retirement::Unparsable), 1);
    }
}
