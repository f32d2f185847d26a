use serde::Deserialize;

/// Main configuration structure for Sitemapper
///
/// Every section is optional; a missing file or an empty file yields the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub pipeline: PipelineConfig,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// TCP connect (and TLS handshake) timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum wait for response headers in seconds
    #[serde(rename = "response-header-timeout-secs")]
    pub response_header_timeout_secs: u64,

    /// Overall request timeout in seconds, body included
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Idle connections kept per host
    #[serde(rename = "max-idle-per-host")]
    pub max_idle_per_host: usize,

    /// Requests the fetch stage runs at the same time
    pub concurrency: usize,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            response_header_timeout_secs: 10,
            request_timeout_secs: 15,
            max_idle_per_host: 1,
            concurrency: 4,
            user_agent: format!("sitemapper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Link extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Extraction rules, tried in order for every token
    pub rules: Vec<RuleKind>,

    /// Schemes accepted for absolute links
    #[serde(rename = "accepted-schemes")]
    pub accepted_schemes: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            rules: vec![RuleKind::Image, RuleKind::AnchorNoFollow],
            accepted_schemes: crate::url::DEFAULT_ACCEPTED_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// The extraction rule variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// `<img src>`
    Image,
    /// `<a href>`, skipping anchors marked `rel="nofollow"`
    AnchorNoFollow,
    /// `<a href>`, nofollow or not
    Anchor,
}

/// Pipeline wiring configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Buffer size of each inter-stage channel
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,

    /// Whether the same-host scope filter is wired in
    pub scope: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 8,
            scope: true,
        }
    }
}
