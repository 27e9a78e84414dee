//! Endpoint normalization
//!
//! Endpoints arrive as bare strings like `example.com` or full URLs. Before a
//! probe is issued, every endpoint must carry an explicit scheme; `http://`
//! is prepended when none is present. The original string is never mutated,
//! a new one is returned.

use url::Url;

use crate::error::ProbeError;

/// Ensure an endpoint carries an explicit scheme
///
/// Prepends `http://` exactly once when the endpoint does not already start
/// with `http://` or `https://`.
///
/// # Examples
///
/// ```
/// use livecheck::probe::endpoint::normalize;
///
/// assert_eq!(normalize("example.com"), "http://example.com");
/// assert_eq!(normalize("https://ok.test"), "https://ok.test");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    }
}

/// Parse a normalized endpoint into a URL
///
/// Used by the prober to reject endpoints that cannot form a request target
/// without spending a network round trip on them.
///
/// # Errors
///
/// Returns `ProbeError::InvalidEndpoint` when the endpoint does not parse.
pub fn parse(normalized: &str) -> Result<Url, ProbeError> {
    Url::parse(normalized).map_err(|_| ProbeError::InvalidEndpoint(normalized.to_string()))
}
