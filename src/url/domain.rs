use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the authority (host plus any port) exactly as written in `raw`
///
/// No normalization is applied: case is kept and an explicit default port
/// stays, so `http://WWW.Example.com:80/` yields `WWW.Example.com:80`. Any
/// `userinfo@` prefix is dropped.
///
/// # Arguments
///
/// * `raw` - The URL text to extract the authority from
///
/// # Returns
///
/// * `Some(&str)` - The authority
/// * `None` - If `raw` has no `scheme://authority` part
///
/// # Examples
///
/// ```
/// use sitemapper::url::extract_authority;
///
/// assert_eq!(extract_authority("http://localhost:8080/home"), Some("localhost:8080"));
/// assert_eq!(extract_authority("https://user@Example.com?q=1"), Some("Example.com"));
/// assert_eq!(extract_authority("mailto:admin@example.com"), None);
/// ```
pub fn extract_authority(raw: &str) -> Option<&str> {
    let (scheme, rest) = raw.trim().split_once("://")?;
    let valid_scheme = scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return None;
    }

    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let authority = &rest[..end];
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    (!authority.is_empty()).then_some(authority)
}

/// Validates `raw` as a URL with a host and returns its authority as written
///
/// # Errors
///
/// * `UrlError::Parse` - `raw` is not a valid URL
/// * `UrlError::MissingHost` - `raw` has no host
pub fn parse_authority(raw: &str) -> UrlResult<&str> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(raw.to_string()));
    }
    extract_authority(raw).ok_or_else(|| UrlError::MissingHost(raw.to_string()))
}
