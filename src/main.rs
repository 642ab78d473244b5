//! The binary entry point for the authentication gateway.

use std::sync::Arc;
use std::time::Duration;

use app_core::config::Config;
use app_core::jwt::{JwtConfig, JwtService, SessionSigner};
use app_core::mail::smtp::SmtpMailer;
use app_core::middleware::request_response_logger;
use app_core::oauth::{GoogleProvider, ProviderRegistry};
use app_core::password::{Argon2Hasher, Hasher};
use axum::http::StatusCode;
use axum::{Json, Router, middleware, routing};
use tokio::signal;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(fmt::format::FmtSpan::CLOSE),
        )
        .init();

    if let Err(err) = run().await {
        panic!("❌ Application failed to start: {err}");
    }
}

/// Initializes all dependencies and starts the web server.
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(Config::load("config/config.yaml")?);

    // Initialize mail connection.
    let mail_host = config.get::<String>("mail.host")?;
    let mail_port = config.get::<u16>("mail.port")?;
    let mail_from = config.get::<String>("mail.from")?;
    let smtp_mail = Arc::new(SmtpMailer::new(mail_host.as_ref(), mail_port, mail_from));

    // Initialize the Argon2id hasher.
    let hasher: Arc<dyn Hasher> = Arc::new(Argon2Hasher::new());

    // Instantiate the session signer with all required config values.
    let signer: Arc<dyn SessionSigner> = Arc::new(JwtService::new(JwtConfig {
        secret: config.get("session.secret")?,
        expiry_secs: config.get("session.token_expiry_secs")?,
        issuer: config.get("session.issuer")?,
    }));

    // Initialize the provider registry.
    let provider_timeout = Duration::from_secs(config.get::<u64>("provider.timeout_secs")?);
    let mut providers = ProviderRegistry::new();
    let google_client_id = config.get::<String>("oauth.google.client_id").unwrap_or_default();
    if !google_client_id.is_empty() {
        let client_secret = config.get("oauth.google.client_secret")?;
        let redirect_uri = config.get("oauth.google.redirect_uri")?;
        let google = GoogleProvider::new(google_client_id, client_secret, redirect_uri, provider_timeout)?;
        providers.register("google", Arc::new(google));
    }

    // Initialize auth module
    let auth_state = auth::new(auth::Dependency {
        config: config.clone(),
        hasher,
        signer,
        mail: smtp_mail,
        providers,
        repo: Arc::new(auth::InMemoryUserRepository::new()),
    });

    // Create the Router and Middlewares
    let timeout_secs = Duration::from_secs(config.get::<u64>("server.timeout_secs")?);
    let app = Router::new()
        .merge(auth::create_router(auth_state))
        .route(
            "/",
            routing::get(|| async { Json(serde_json::json!({"message": "Hello from Authgate"})) }),
        )
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"message": "Endpoint not found"})),
            )
        })
        .method_not_allowed_fallback(|| async {
            (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(serde_json::json!({"message": "Method not allowed"})),
            )
        })
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_response_logger))
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any)) // Enables CORS for all origins
                .layer(TimeoutLayer::new(timeout_secs)), // Adds a request timeout
        );

    let server_address = config.get::<String>("server.address")?;
    let listener = tokio::net::TcpListener::bind(&server_address).await?;

    tracing::info!("🚀 listening on {}", listener.local_addr()?);

    // Create a broadcast channel to signal shutdown to all application components.
    // Spawn a task to listen for shutdown signals (Ctrl+C and SIGTERM).
    let (shutdown_tx, _) = broadcast::channel(1);
    spawn_shutdown_listener(shutdown_tx.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_tx.subscribe().recv().await.ok();
            tracing::info!("🛑 Server is shutting down gracefully...");
        })
        .await?;

    Ok(())
}

/// Spawns a background task to listen for system shutdown signals.
fn spawn_shutdown_listener(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("🔻 Received SIGINT (Ctrl+C)")},
            _ = terminate => { tracing::info!("🔻 Received SIGTERM")},
        }

        // Send the shutdown signal to all parts of the application.
        if shutdown_tx.send(()).is_err() {
            tracing::error!("Failed to send shutdown signal");
        }
    });
}
