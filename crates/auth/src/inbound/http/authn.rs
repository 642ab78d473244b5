use app_core::error::AppError;
use app_core::extractors::{AppForm, AppPath, AppQuery};
use app_core::session::{self, DeliveryPlan};
use axum::Json;
use axum::debug_handler;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use tower_cookies::cookie::{SameSite, time};
use tower_cookies::{Cookie, Cookies};

use crate::domain::inout::prelude::*;
use crate::inbound::model::prelude::*;
use crate::inbound::state::AuthState;

/// Stores the signin redirect target between the page load and the signin
/// attempt. Single-shot: cleared on every attempt, success or failure.
const COOKIE_REDIRECT_URI: &str = "redirect_uri";
const COOKIE_OAUTH_STATE: &str = "__oauth_state";

const OAUTH_STATE_TTL_MINUTES: i64 = 5;

const SIGNIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <h1>Sign in</h1>
    <form method="post" action="/auth/signin">
      <input type="email" name="email" placeholder="Email" required>
      <input type="password" name="password" placeholder="Password" required>
      <button type="submit">Sign in</button>
    </form>
    <p><a href="/auth/signin/google">Sign in with Google</a></p>
    <p><a href="/auth/signup">Create an account</a></p>
  </body>
</html>"#;

const SIGNUP_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <h1>Sign up</h1>
    <form method="post" action="/auth/signup">
      <input type="text" name="username" placeholder="Username" required>
      <input type="email" name="email" placeholder="Email" required>
      <input type="password" name="password" placeholder="Password" required>
      <button type="submit">Sign up</button>
    </form>
  </body>
</html>"#;

/// Reads the stored redirect target and clears it, before the outcome of
/// the attempt is known.
fn take_redirect_target(cookies: &Cookies) -> Option<String> {
    let target = cookies.get(COOKIE_REDIRECT_URI).map(|c| c.value().to_string());

    if target.is_some() {
        cookies.remove(Cookie::build((COOKIE_REDIRECT_URI, "")).path("/").build());
    }

    target
}

/// A 302 Found redirect. The browser follows cross-origin signin redirects
/// with a GET regardless of the originating method.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Applies the delivery decision for a signed session token: redirect with
/// the token as a query parameter when the stored target passes the scheme
/// allow-list, otherwise an http-only cookie plus the default landing path.
fn deliver(state: &AuthState, cookies: &Cookies, token: String, target: Option<String>) -> Result<Response, AppError> {
    let allowed_schemes: Vec<String> = state.config.get("session.allowed_redirect_schemes")?;
    let default_path: String = state.config.get("session.default_redirect")?;

    match session::plan_delivery(&token, target.as_deref(), &allowed_schemes, &default_path) {
        DeliveryPlan::Redirect { location } => Ok(found(&location)),
        DeliveryPlan::Cookie { token, location } => {
            let cookie_name: String = state.config.get("session.cookie_name")?;

            let cookie = Cookie::build((cookie_name, token))
                .http_only(true)
                .path("/")
                .same_site(SameSite::Lax)
                .build();
            cookies.add(cookie);

            Ok(found(&location))
        },
    }
}

#[debug_handler]
pub async fn signin_page(cookies: Cookies, AppQuery(query): AppQuery<SigninPageQuery>) -> impl IntoResponse {
    if let Some(target) = query.redirect_uri {
        let cookie = Cookie::build((COOKIE_REDIRECT_URI, target))
            .http_only(true)
            .path("/")
            .same_site(SameSite::Lax)
            .build();
        cookies.add(cookie);
    }

    Html(SIGNIN_PAGE)
}

#[debug_handler]
pub async fn signup_page() -> impl IntoResponse {
    Html(SIGNUP_PAGE)
}

#[debug_handler]
pub async fn signup(State(state): State<AuthState>, AppForm(req): AppForm<SignupRequest>) -> impl IntoResponse {
    state
        .authn
        .signup(SignupInput { username: req.username, email: req.email, password: req.password })
        .await
        .map(|output| Json(SignupResponse { success: output.success, message: output.message }))
}

#[debug_handler]
pub async fn verify_email(
    State(state): State<AuthState>,
    AppQuery(query): AppQuery<VerifyEmailRequest>,
) -> impl IntoResponse {
    state
        .authn
        .verify(VerifyInput { user_id: query.user_id, token: query.token })
        .await
        .map(|output| Json(VerifyEmailResponse { success: output.success, message: output.message }))
}

#[debug_handler]
pub async fn signin(
    State(state): State<AuthState>,
    cookies: Cookies,
    AppForm(req): AppForm<SigninRequest>,
) -> Result<Response, AppError> {
    let target = take_redirect_target(&cookies);

    let output = state
        .authn
        .signin(SigninInput { email: req.email, password: req.password })
        .await?;

    deliver(&state, &cookies, output.token, target)
}

#[debug_handler]
pub async fn oauth_authorize(
    State(state): State<AuthState>,
    cookies: Cookies,
    AppPath(provider): AppPath<String>,
) -> Result<Response, AppError> {
    let output = state.authn.authorize_provider(ProviderAuthorizeInput { provider }).await?;

    let cookie = Cookie::build((COOKIE_OAUTH_STATE, output.state))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::minutes(OAUTH_STATE_TTL_MINUTES))
        .same_site(SameSite::Lax)
        .build();
    cookies.add(cookie);

    Ok(found(&output.url))
}

#[debug_handler]
pub async fn oauth_callback(
    State(state): State<AuthState>,
    cookies: Cookies,
    AppPath(provider): AppPath<String>,
    AppQuery(query): AppQuery<CallbackRequest>,
) -> Result<Response, AppError> {
    let target = take_redirect_target(&cookies);

    if let Some(err) = query.error {
        return Err(AppError::Forbidden(format!("OAuth authentication failed: {err}")));
    }

    let code = query
        .code
        .ok_or_else(|| AppError::Forbidden("Missing authorization code".to_string()))?;

    let state_cookie = cookies
        .get(COOKIE_OAUTH_STATE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Forbidden("OAuth session expired or invalid".to_string()))?;

    cookies.remove(Cookie::build((COOKIE_OAUTH_STATE, "")).path("/").build());

    if query.state.as_deref() != Some(state_cookie.as_str()) {
        return Err(AppError::Forbidden("OAuth state mismatch".to_string()));
    }

    let output = state.authn.signin_via_provider(ProviderSigninInput { provider, code }).await?;

    deliver(&state, &cookies, output.token, target)
}
