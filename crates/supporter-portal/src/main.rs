// Supporter portal server: Patreon and YouTube sign-in with a signed
// cookie session and a live-rendered profile page.

mod config;
mod pages;
mod providers;
mod routes;
mod session;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;
use providers::{PatreonService, YouTubeService};
use routes::AppState;
use session::SessionTokenService;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is a local development convenience; a missing file is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "supporter_portal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        environment = ?config.environment,
        port = config.port,
        "Configuration loaded"
    );

    // One HTTP client shared by both provider services.
    let http = reqwest::Client::new();

    let state = AppState {
        session: Arc::new(SessionTokenService::new(&config.session)),
        patreon: Arc::new(
            PatreonService::new(config.patreon, http.clone())
                .context("Invalid Patreon configuration")?,
        ),
        youtube: Arc::new(
            YouTubeService::new(config.youtube, http).context("Invalid YouTube configuration")?,
        ),
    };

    let app = routes::routes(state);

    // CORS only matters when the pages are served from a different origin.
    // Example: CORS_ALLOWED_ORIGINS="http://localhost:5000,https://example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    let app = if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
                .allow_credentials(true),
        )
    };

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
