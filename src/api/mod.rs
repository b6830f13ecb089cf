//! HTTP API — Axum server for fraud screening and credit decisions.
//!
//! Health and service info sit at the root; everything else is mounted
//! under the configured API prefix. CORS origins come from config.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::future::Future;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use routes::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let prefix = server.api_prefix.trim_end_matches('/');

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        // Versioned API
        .route(prefix, get(routes::api_root))
        .route(&format!("{prefix}/"), get(routes::api_root))
        .route(
            &format!("{prefix}/risk/analyze-transactions"),
            post(routes::analyze_transactions),
        )
        .route(
            &format!("{prefix}/risk/benford-expected"),
            get(routes::benford_expected),
        )
        .route(
            &format!("{prefix}/risk/quick-fraud-check"),
            post(routes::quick_fraud_check),
        )
        .route(
            &format!("{prefix}/credit/evaluate"),
            post(routes::evaluate_credit),
        )
        .route(
            &format!("{prefix}/credit/demo/:scenario"),
            get(routes::credit_demo),
        )
        .layer(cors_layer(&server.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(state: AppState, server: &ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state, server);
    let addr = server.bind_addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, prefix = %server.api_prefix, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
