//! Deterministic merchant data and router helpers shared by the suites.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use streamcredit::api::{build_router, routes::ApiState};
use streamcredit::config::AppConfig;
use streamcredit::types::TransactionRecord;

/// Amounts spread evenly in log space over three decades, one record per
/// (month, amount) pair. Follows Benford's Law closely.
pub fn benford_records(months: u32, per_month: usize, scale: f64) -> Vec<TransactionRecord> {
    let n = months as usize * per_month;
    (0..n)
        .map(|i| {
            let month = (i % months as usize) as u32 + 1;
            let amount = scale * 10f64.powf(3.0 * (i as f64 + 0.5) / n as f64);
            TransactionRecord::new(format!("2025-{month:02}-15"), amount)
        })
        .collect()
}

/// Evenly spaced amounts in `[lo, hi)`, spread over twelve months.
pub fn uniform_records(n: usize, lo: f64, hi: f64) -> Vec<TransactionRecord> {
    (0..n)
        .map(|i| {
            let amount = lo + (hi - lo) * (i as f64 + 0.5) / n as f64;
            TransactionRecord::new(format!("2025-{:02}-10", i % 12 + 1), amount)
        })
        .collect()
}

pub fn app(cfg: &AppConfig) -> Router {
    build_router(Arc::new(ApiState::new(cfg)), &cfg.server)
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

pub async fn post(app: Router, uri: &str, body: &serde_json::Value) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 10_000_000).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
