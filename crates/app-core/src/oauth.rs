//! The OAuth 2.0 authorization-code flow against third-party identity
//! providers.
//!
//! Each provider is an independent implementation of the same capability
//! contract, holding its own credential set; providers are looked up by name
//! from a [`ProviderRegistry`] at call time. Exchange and profile calls are
//! single round trips with a bounded timeout and no retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::{Client, header};
use serde::Deserialize;
use thiserror::Error;

use crate::url_builder::{self, UrlError};

const STATE_NONCE_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token exchange failed with status {0}")]
    TokenExchange(u16),

    #[error("Token response is missing an access token")]
    MalformedTokenResponse,

    #[error("Profile request failed with status {0}")]
    ProfileFetch(u16),

    #[error("Profile response is missing required fields")]
    ProfileParse,

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
}

/// One provider's immutable configuration.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_base_url: String,
    pub token_base_url: String,
    pub profile_base_url: String,
    pub redirect_url: String,
}

/// The authorize URL plus the state nonce embedded in it. The nonce is
/// freshly generated per attempt; the caller round-trips it through the
/// provider callback to reject forged callbacks.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub url: String,
    pub state: String,
}

/// Tokens from a single code exchange. Never persisted here; handed straight
/// to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthTokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in_secs: Option<u64>,
}

/// Provider-agnostic profile shape normalized from heterogeneous payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn into_token_set(self) -> Result<OAuthTokenSet, OAuthError> {
        let access_token = self.access_token.ok_or(OAuthError::MalformedTokenResponse)?;

        Ok(OAuthTokenSet { access_token, refresh_token: self.refresh_token, expires_in_secs: self.expires_in })
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Builds the provider's authorize URL with a fresh state nonce.
    fn authorize(&self) -> Result<AuthorizeRequest, OAuthError>;

    /// Builds the token endpoint URL for a given authorization code.
    fn token_url(&self, code: &str) -> Result<String, OAuthError>;

    /// Exchanges an authorization code for a token set. One POST; a non-2xx
    /// response, a timeout, or a payload without `access_token` fails the
    /// exchange with no further calls.
    async fn exchange_code(&self, code: &str) -> Result<OAuthTokenSet, OAuthError>;

    /// Fetches the user's profile with the given access token and normalizes
    /// it to [`ProviderProfile`].
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError>;
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_NONCE_LEN)
        .map(char::from)
        .collect()
}

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_PROFILE_URL: &str = "https://people.googleapis.com/v1/people/me";
const GOOGLE_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.profile";
const GOOGLE_PERSON_FIELDS: &str = "photos,names";

#[derive(Debug)]
pub struct GoogleProvider {
    credentials: ProviderCredentials,
    http: Client,
}

impl GoogleProvider {
    pub fn new(client_id: String, client_secret: String, redirect_url: String, timeout: Duration) -> Result<Self, OAuthError> {
        Self::with_credentials(
            ProviderCredentials {
                client_id,
                client_secret,
                authorize_base_url: GOOGLE_AUTHORIZE_URL.to_string(),
                token_base_url: GOOGLE_TOKEN_URL.to_string(),
                profile_base_url: GOOGLE_PROFILE_URL.to_string(),
                redirect_url,
            },
            timeout,
        )
    }

    pub fn with_credentials(credentials: ProviderCredentials, timeout: Duration) -> Result<Self, OAuthError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { credentials, http })
    }

    fn authorize_url_with_state(&self, state: &str) -> Result<String, OAuthError> {
        // access_type=offline asks Google to include a refresh token in the
        // exchange response
        url_builder::build(
            &self.credentials.authorize_base_url,
            &[
                ("client_id", Some(self.credentials.client_id.as_str())),
                ("response_type", Some("code")),
                ("redirect_uri", Some(self.credentials.redirect_url.as_str())),
                ("access_type", Some("offline")),
                ("scope", Some(GOOGLE_SCOPE)),
                ("state", Some(state)),
            ],
        )
        .map_err(OAuthError::from)
    }
}

fn parse_google_profile(value: &serde_json::Value) -> Result<ProviderProfile, OAuthError> {
    // resourceName is a compound like "people/102938"; the opaque identity is
    // the segment after the first separator
    let external_id = value
        .get("resourceName")
        .and_then(|v| v.as_str())
        .and_then(|name| name.split('/').nth(1))
        .filter(|id| !id.is_empty())
        .ok_or(OAuthError::ProfileParse)?;

    let display_name = value
        .pointer("/names/0/displayName")
        .and_then(|v| v.as_str())
        .ok_or(OAuthError::ProfileParse)?;

    let avatar_url = value.pointer("/photos/0/url").and_then(|v| v.as_str()).map(str::to_owned);

    Ok(ProviderProfile { external_id: external_id.to_owned(), display_name: display_name.to_owned(), avatar_url })
}

#[async_trait::async_trait]
impl OAuthProvider for GoogleProvider {
    fn authorize(&self) -> Result<AuthorizeRequest, OAuthError> {
        let state = random_state();
        let url = self.authorize_url_with_state(&state)?;

        Ok(AuthorizeRequest { url, state })
    }

    fn token_url(&self, code: &str) -> Result<String, OAuthError> {
        url_builder::build(
            &self.credentials.token_base_url,
            &[
                ("client_id", Some(self.credentials.client_id.as_str())),
                ("client_secret", Some(self.credentials.client_secret.as_str())),
                ("code", Some(code)),
                ("grant_type", Some("authorization_code")),
                ("redirect_uri", Some(self.credentials.redirect_url.as_str())),
            ],
        )
        .map_err(OAuthError::from)
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokenSet, OAuthError> {
        let endpoint = self.token_url(code)?;

        let response = self
            .http
            .post(&endpoint)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "provider token exchange failed");
            return Err(OAuthError::TokenExchange(status.as_u16()));
        }

        let payload: TokenResponse = response.json().await?;
        payload.into_token_set()
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError> {
        let endpoint =
            url_builder::build(&self.credentials.profile_base_url, &[("personFields", Some(GOOGLE_PERSON_FIELDS))])?;

        let response = self.http.get(&endpoint).bearer_auth(access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "provider profile request failed");
            return Err(OAuthError::ProfileFetch(status.as_u16()));
        }

        let payload: serde_json::Value = response.json().await?;
        parse_google_profile(&payload)
    }
}

/// Name-keyed lookup table of configured providers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn OAuthProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self { providers: HashMap::new() }
    }

    pub fn register(&mut self, name: &str, provider: Arc<dyn OAuthProvider>) {
        self.providers.insert(name.to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn OAuthProvider>, OAuthError> {
        self.providers
            .get(name)
            .ok_or_else(|| OAuthError::ProviderNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}
