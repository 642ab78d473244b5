//! Centralized error handling for the Axum application.
//!
//! Every failure a handler can produce converges on [`AppError`], whose
//! `IntoResponse` impl owns the error-to-status mapping. Infrastructure
//! failures are logged in full here and answered with a generic message;
//! upstream provider bodies are never echoed to the client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use super::config::ConfigError;
use super::jwt::JwtError;
use super::mail::MailerError;
use super::oauth::OAuthError;
use super::password::HashingError;
use super::url_builder::UrlError;

const INTERNAL_MSG: &str = "An internal server error occurred";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Validation failed")]
    ValidationStr(String),

    #[error("Invalid request format: {0}")]
    RequestFormat(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Internal Libraries
    #[error("Config operation failed")]
    Config(#[from] ConfigError),

    #[error("JWT operation failed")]
    Jwt(#[from] JwtError),

    #[error("Mail operation failed")]
    Mail(#[from] MailerError),

    #[error("OAuth operation failed")]
    OAuth(#[from] OAuthError),

    #[error("Password Hashing operation failed")]
    Hashing(#[from] HashingError),

    #[error("URL construction failed")]
    Url(#[from] UrlError),

    #[error("An internal server error occurred")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Validation(err) => {
                let details = json!(err.field_errors());
                (StatusCode::BAD_REQUEST, "Validation failed".to_string(), Some(details))
            },
            AppError::ValidationStr(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::RequestFormat(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::InvalidCredentials(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::InvalidToken(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),

            // Internal Libraries
            AppError::Config(err) => {
                tracing::error!("Config getter error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MSG.to_string(), None)
            },
            AppError::Jwt(err) => {
                tracing::error!("JWT error: {:?}", err);
                let (status, message) = match err {
                    JwtError::TokenExpired | JwtError::InvalidToken => (StatusCode::UNAUTHORIZED, err.to_string()),
                    JwtError::TokenCreation => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MSG.to_string()),
                };
                (status, message, None)
            },
            AppError::Mail(err) => {
                tracing::error!("Mail server error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MSG.to_string(), None)
            },
            AppError::OAuth(err) => {
                tracing::error!("OAuth error: {:?}", err);
                let (status, message) = match err {
                    OAuthError::ProviderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),

                    OAuthError::Http(_)
                    | OAuthError::TokenExchange(_)
                    | OAuthError::MalformedTokenResponse
                    | OAuthError::ProfileFetch(_)
                    | OAuthError::ProfileParse => (StatusCode::BAD_GATEWAY, "OAuth provider unavailable".to_string()),

                    OAuthError::InvalidUrl(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MSG.to_string()),
                };
                (status, message, None)
            },
            AppError::Hashing(err) => {
                tracing::error!("Password hashing error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MSG.to_string(), None)
            },
            AppError::Url(err) => {
                tracing::error!("URL construction error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MSG.to_string(), None)
            },
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MSG.to_string(), None),
        };

        (status, Json(ErrorResponse { message, details })).into_response()
    }
}
