//! The delivery decision for a freshly signed session token.

use url::Url;

use crate::redirect;

/// Query parameter carrying the session token on an external redirect.
pub const TOKEN_PARAM: &str = "jwt";

/// How a session token reaches the client after a successful signin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPlan {
    /// Redirect to a validated external target with the token appended as a
    /// query parameter.
    Redirect { location: String },
    /// Set the token as an http-only cookie and redirect to the default
    /// landing path.
    Cookie { token: String, location: String },
}

/// Decides where a session token goes. Pure; callers own the side effects
/// (setting cookies, clearing the stored redirect target on every attempt).
///
/// The token is only ever appended to a target that passed
/// [`redirect::is_allowed`]; anything else falls back to the cookie plan.
pub fn plan_delivery(
    token: &str,
    redirect_candidate: Option<&str>,
    allowed_schemes: &[String],
    default_path: &str,
) -> DeliveryPlan {
    if let Some(candidate) = redirect_candidate {
        if redirect::is_allowed(candidate, allowed_schemes) {
            if let Ok(mut location) = Url::parse(candidate) {
                location.query_pairs_mut().append_pair(TOKEN_PARAM, token);
                return DeliveryPlan::Redirect { location: location.to_string() };
            }
        }
    }

    DeliveryPlan::Cookie { token: token.to_string(), location: default_path.to_string() }
}
