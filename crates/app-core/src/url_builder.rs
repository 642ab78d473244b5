//! Deterministic query-string and URL construction.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Appends `params` to `base_url` as a percent-encoded query string.
///
/// Keys are emitted in the order given by the caller, and entries whose
/// value is `None` are omitted entirely. Pure string work, no I/O; the only
/// failure mode is a malformed `base_url`.
pub fn build(base_url: &str, params: &[(&str, Option<&str>)]) -> Result<String, UrlError> {
    let mut url = Url::parse(base_url)?;

    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            if let Some(value) = value {
                pairs.append_pair(key, value);
            }
        }
    }

    // query_pairs_mut leaves a dangling `?` when nothing was appended
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url.to_string())
}
