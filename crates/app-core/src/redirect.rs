//! Allow-list validation of client-supplied redirect targets.

use url::Url;

/// Returns true only for a well-formed absolute URL with a host whose scheme
/// is in `allowed_schemes`. Unparseable input, relative references, and
/// host-less URLs are all "not allowed"; this never panics or errors.
///
/// Every redirect a session token could be delivered to must pass through
/// here first.
pub fn is_allowed(candidate: &str, allowed_schemes: &[String]) -> bool {
    match Url::parse(candidate) {
        Ok(url) => url.has_host() && allowed_schemes.iter().any(|scheme| scheme == url.scheme()),
        Err(_) => false,
    }
}
