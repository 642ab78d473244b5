//! Session token signing for authenticated users.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token format or signature")]
    InvalidToken,

    #[error("Failed to create token")]
    TokenCreation,
}

/// The public profile fields that get signed into a session token.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProfile {
    pub user_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub jti: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionSigner: Send + Sync {
    fn sign(&self, profile: SessionProfile) -> Result<String, JwtError>;
    fn verify(&self, token: &str) -> Result<SessionClaims, JwtError>;
}

pub struct JwtConfig {
    pub secret: String,
    pub expiry_secs: i64,
    pub issuer: String,
}

/// HS512 signer over a single secret supplied once at construction.
pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl SessionSigner for JwtService {
    fn sign(&self, profile: SessionProfile) -> Result<String, JwtError> {
        let now = Utc::now();
        let exp = (now + Duration::seconds(self.config.expiry_secs)).timestamp() as usize;

        let claims = SessionClaims {
            sub: profile.user_id,
            username: profile.username,
            avatar_url: profile.avatar_url,
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
            exp,
            iat: now.timestamp() as usize,
        };

        let header = Header::new(Algorithm::HS512);
        encode(&header, &claims, &EncodingKey::from_secret(self.config.secret.as_ref()))
            .map_err(|_| JwtError::TokenCreation)
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<SessionClaims>(token, &DecodingKey::from_secret(self.config.secret.as_ref()), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken,
            })
    }
}
