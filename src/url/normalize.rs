use crate::url::extract_authority;
use crate::{UrlError, UrlResult};
use url::{ParseError, Url};

/// Schemes whose absolute links are kept as-is during extraction
pub const DEFAULT_ACCEPTED_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Normalizes a link found on a page into an absolute URL
///
/// # Normalization Steps
///
/// 1. Reject an empty candidate
/// 2. Parse the candidate; reject it if malformed
/// 3. An absolute candidate with an accepted scheme is returned unchanged;
///    any other absolute scheme (`mailto:`, `javascript:`, ...) is rejected
/// 4. Parse the base URL; reject if it has no host
/// 5. Trim a single leading and a single trailing `/` from the candidate and
///    recompose it as `<base-scheme>://<base-authority>/<candidate>`
///
/// Query strings and fragments on a relative candidate are carried over
/// verbatim since step 5 works on the whole relative string.
///
/// # Arguments
///
/// * `base` - URL of the page the link was found on
/// * `candidate` - The raw link value
/// * `accepted_schemes` - Schemes accepted for absolute links
///
/// # Returns
///
/// * `Ok(String)` - The absolute link
/// * `Err(UrlError)` - The link cannot be anchored
///
/// # Examples
///
/// ```
/// use sitemapper::url::{normalize_link, DEFAULT_ACCEPTED_SCHEMES};
///
/// let link = normalize_link("http://www.format.com", "/path-only", DEFAULT_ACCEPTED_SCHEMES).unwrap();
/// assert_eq!(link, "http://www.format.com/path-only");
///
/// let link = normalize_link("http://www.format.com", "?arg=ok", DEFAULT_ACCEPTED_SCHEMES).unwrap();
/// assert_eq!(link, "http://www.format.com/?arg=ok");
/// ```
pub fn normalize_link<S: AsRef<str>>(
    base: &str,
    candidate: &str,
    accepted_schemes: &[S],
) -> UrlResult<String> {
    let candidate = candidate.trim();

    // Step 1: Empty links carry nothing to follow
    if candidate.is_empty() {
        return Err(UrlError::Empty);
    }

    // Steps 2 & 3: Absolute links are kept verbatim when their scheme is accepted
    match Url::parse(candidate) {
        Ok(absolute) => {
            let scheme = absolute.scheme();
            if accepted_schemes
                .iter()
                .any(|accepted| accepted.as_ref().eq_ignore_ascii_case(scheme))
            {
                return Ok(candidate.to_string());
            }
            return Err(UrlError::UnsupportedScheme(scheme.to_string()));
        }
        Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => return Err(UrlError::Parse(format!("{}: {}", candidate, e))),
    }

    // Step 4: An incomplete base cannot anchor a relative link
    let base_url =
        Url::parse(base).map_err(|_| UrlError::MissingHost(base.to_string()))?;
    // The authority is reused as written so scoping sees the same spelling
    let authority = base_url
        .host_str()
        .filter(|host| !host.is_empty())
        .and_then(|_| extract_authority(base))
        .ok_or_else(|| UrlError::MissingHost(base.to_string()))?;

    // The relative part must still resolve against the base
    base_url
        .join(candidate)
        .map_err(|e| UrlError::Parse(format!("{}: {}", candidate, e)))?;

    // Step 5: Recompose from the base scheme and authority
    let trimmed = candidate.strip_prefix('/').unwrap_or(candidate);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    Ok(format!("{}://{}/{}", base_url.scheme(), authority, trimmed))
}
