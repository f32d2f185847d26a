//! HTML tokenization and link extraction
//!
//! This module handles turning fetched HTML into new crawl records:
//! - Flattening the parsed document into a token stream
//! - Extraction rules that pull a candidate link out of a single token
//! - Normalizing candidates against the page they were found on

use crate::config::{ExtractConfig, RuleKind};
use crate::crawler::{PipeContext, Stage};
use crate::state::{PageRecord, Retirement};
use crate::url::{normalize_link, DEFAULT_ACCEPTED_SCHEMES};
use async_trait::async_trait;
use scraper::{Html, Node};
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Kind of markup a token was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Doctype,
    StartTag,
    Text,
    Comment,
}

/// One item of a flattened HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Tag name for start tags, text for text and comments, name for doctypes
    pub data: String,
    /// Attributes in source order; empty for anything but start tags
    pub attrs: Vec<(String, String)>,
}

impl Token {
    /// Returns the value of attribute `key`, if present
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn is_start_tag(&self, name: &str) -> bool {
        self.kind == TokenKind::StartTag && self.data == name
    }
}

/// Flattens an HTML document into tokens in document order
///
/// Malformed markup is recovered the way browsers do; bytes that are not
/// valid UTF-8 are replaced.
pub fn tokenize(content: &[u8]) -> Vec<Token> {
    let document = Html::parse_document(&String::from_utf8_lossy(content));

    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Doctype(doctype) => Some(Token {
                kind: TokenKind::Doctype,
                data: doctype.name().to_string(),
                attrs: Vec::new(),
            }),
            Node::Element(element) => Some(Token {
                kind: TokenKind::StartTag,
                data: element.name().to_string(),
                attrs: element
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            }),
            Node::Text(text) => Some(Token {
                kind: TokenKind::Text,
                data: text.to_string(),
                attrs: Vec::new(),
            }),
            Node::Comment(comment) => Some(Token {
                kind: TokenKind::Comment,
                data: comment.to_string(),
                attrs: Vec::new(),
            }),
            _ => None,
        })
        .collect()
}

/// Pulls a candidate link out of a token
pub type ExtractionRule = fn(&Token) -> Option<String>;

/// `<img src>`
pub fn image_source(token: &Token) -> Option<String> {
    if !token.is_start_tag("img") {
        return None;
    }
    non_empty(token.attr("src"))
}

/// `<a href>`, including anchors marked `rel="nofollow"`
pub fn anchor_href(token: &Token) -> Option<String> {
    if !token.is_start_tag("a") {
        return None;
    }
    non_empty(token.attr("href"))
}

/// `<a href>`, skipping anchors marked `rel="nofollow"`
pub fn anchor_href_no_follow(token: &Token) -> Option<String> {
    let no_follow = token.attr("rel").is_some_and(|rel| {
        rel.split_whitespace()
            .any(|value| value.eq_ignore_ascii_case("nofollow"))
    });
    if no_follow {
        return None;
    }
    anchor_href(token)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl RuleKind {
    /// The extraction rule this variant names
    pub fn rule(self) -> ExtractionRule {
        match self {
            RuleKind::Image => image_source,
            RuleKind::AnchorNoFollow => anchor_href_no_follow,
            RuleKind::Anchor => anchor_href,
        }
    }
}

/// Stage that replaces each fetched page with one record per link on it
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    rules: Vec<ExtractionRule>,
    accepted_schemes: Vec<String>,
}

impl LinkExtractor {
    /// Creates an extractor that tries `rules` in order on every token
    pub fn new(rules: Vec<ExtractionRule>) -> Self {
        Self {
            rules,
            accepted_schemes: DEFAULT_ACCEPTED_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replaces the schemes kept as-is on absolute links
    pub fn with_accepted_schemes(mut self, schemes: Vec<String>) -> Self {
        self.accepted_schemes = schemes;
        self
    }

    /// Creates an extractor from the `[extract]` configuration section
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(config.rules.iter().map(|kind| kind.rule()).collect())
            .with_accepted_schemes(config.accepted_schemes.clone())
    }

    /// Extracts the absolute links found in `content`
    ///
    /// The first rule producing a value wins for each token. Candidates that
    /// cannot be normalized against `base` are skipped. Each link appears once,
    /// in order of first occurrence.
    ///
    /// # Example
    ///
    /// ```
    /// use sitemapper::config::RuleKind;
    /// use sitemapper::crawler::LinkExtractor;
    ///
    /// let extractor = LinkExtractor::new(vec![RuleKind::Anchor.rule()]);
    /// let links = extractor.extract("http://localhost", b"<a href=\"/about\">About</a>");
    /// assert_eq!(links, vec!["http://localhost/about"]);
    /// ```
    pub fn extract(&self, base: &str, content: &[u8]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for token in tokenize(content) {
            let Some(candidate) = self.rules.iter().find_map(|rule| rule(&token)) else {
                continue;
            };

            match normalize_link(base, &candidate, self.accepted_schemes.as_slice()) {
                Ok(link) => {
                    if seen.insert(link.clone()) {
                        links.push(link);
                    }
                }
                Err(e) => {
                    tracing::debug!(base = %base, candidate = %candidate, "Skipping link: {}", e);
                }
            }
        }

        links
    }
}

#[async_trait]
impl Stage for LinkExtractor {
    fn name(&self) -> &'static str {
        "extract"
    }

    async fn pipe(
        &self,
        ctx: PipeContext,
        mut input: mpsc::Receiver<PageRecord>,
        output: mpsc::Sender<PageRecord>,
    ) {
        while let Some(record) = input.recv().await {
            if !record.done {
                ctx.forward(&output, record).await;
                continue;
            }

            let links = self.extract(&record.url, &record.content);
            tracing::debug!(url = %record.url, links = links.len(), "Extracted links");

            // Children are registered before the parent leaves the ring
            ctx.register(links.len());
            ctx.stats().record_discovered(links.len());
            ctx.retire(record, Retirement::Consumed);

            for link in links {
                ctx.forward(&output, PageRecord::new(link)).await;
            }
        }
    }
}
