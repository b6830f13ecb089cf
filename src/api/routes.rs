//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ApiState>`; it holds
//! only immutable engines, so handlers never lock.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::credit::CreditDecisionEngine;
use crate::fraud::benford::BenfordExpectation;
use crate::fraud::{
    validate_significance_level, BenfordFraudDetector, DigitDetail, DigitOneAnalysis,
    FraudVerdict, RedFlags, Severity,
};
use crate::generator::{self, MerchantProfile};
use crate::types::{lenient_records, CreditDecision, CreditError, TransactionRecord};

/// Months of synthetic history behind each demo scenario.
pub const DEMO_MONTHS: u32 = 12;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub engine: CreditDecisionEngine,
    /// Detector built from the configured fraud settings.
    pub detector: BenfordFraudDetector,
    pub api_prefix: String,
}

impl ApiState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            engine: CreditDecisionEngine::new(config.credit, config.fraud),
            detector: BenfordFraudDetector::new(config.fraud),
            api_prefix: config.server.api_prefix.clone(),
        }
    }
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by handlers, rendered as `{ "error": ..., "status": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<CreditError> for ApiError {
    fn from(err: CreditError) -> Self {
        match err {
            CreditError::UnknownScenario(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// Unreadable or mistyped request bodies are validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self, "Request rejected");
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub transactions: Vec<f64>,
    /// Falls back to the configured α when absent.
    #[serde(default)]
    pub significance_level: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub chi_square_stat: f64,
    pub p_value: f64,
    pub is_fraud: bool,
    pub red_flags: RedFlags,
    pub digit_1_analysis: DigitOneAnalysis,
    pub details: Vec<DigitDetail>,
    pub total_transactions: u64,
    pub significance_level: f64,
    pub fraud_probability: f64,
    pub severity: Severity,
    pub interpretation: String,
}

impl From<&FraudVerdict> for AnalyzeResponse {
    fn from(v: &FraudVerdict) -> Self {
        let d1 = v.digit_1_analysis;
        Self {
            chi_square_stat: round_to(v.chi_square_stat, 4),
            p_value: round_to(v.p_value, 4),
            is_fraud: v.is_fraud,
            red_flags: v.red_flags,
            digit_1_analysis: DigitOneAnalysis {
                observed_percentage: round_to(d1.observed_percentage, 2),
                expected_percentage: round_to(d1.expected_percentage, 2),
                ..d1
            },
            details: v
                .details
                .iter()
                .map(|row| DigitDetail {
                    digit: row.digit,
                    observed_count: row.observed_count,
                    expected_count: round_to(row.expected_count, 2),
                    observed_percentage: round_to(row.observed_percentage, 2),
                    expected_percentage: round_to(row.expected_percentage, 2),
                    deviation: round_to(row.deviation, 2),
                })
                .collect(),
            total_transactions: v.total_transactions,
            significance_level: v.significance_level,
            fraud_probability: round_to(v.fraud_probability(), 2),
            severity: v.severity,
            interpretation: interpret(v),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickCheckResponse {
    pub is_fraud: bool,
    pub confidence: f64,
    pub interpretation: String,
    pub total_analyzed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpectedFrequency {
    pub probability: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenfordExpectedResponse {
    pub law: &'static str,
    pub formula: &'static str,
    pub expected_frequencies: BTreeMap<String, ExpectedFrequency>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    #[serde(deserialize_with = "lenient_records")]
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoResponse {
    pub scenario: String,
    pub total_orders: usize,
    #[serde(flatten)]
    pub decision: CreditDecision,
}

// ---------------------------------------------------------------------------
// Presentation helpers
// ---------------------------------------------------------------------------

fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

/// Human-readable summary of a verdict, keyed on its severity tier.
pub fn interpret(v: &FraudVerdict) -> String {
    if let Some(reason) = v.no_data {
        return reason.to_string();
    }

    let p = v.p_value;
    let d1 = &v.digit_1_analysis;
    let pct = d1.observed_percentage;
    let (min, max) = (d1.threshold_min, d1.threshold_max);

    match v.severity {
        Severity::Critical => format!(
            "CRITICAL: Multiple fraud indicators detected - Chi-square test failed (p={p:.4}) \
             AND Digit-1 outside threshold ({pct:.2}% not in [{min}%, {max}%])"
        ),
        Severity::RedFlagLow => format!(
            "RED FLAG: Digit-1 suspiciously low ({pct:.2}% < {min}%) - \
             Possible fabricated data or selective reporting"
        ),
        Severity::RedFlagHigh => format!(
            "RED FLAG: Digit-1 suspiciously high ({pct:.2}% > {max}%) - \
             Possible data manipulation or rounding bias"
        ),
        Severity::Strong => format!(
            "Strong statistical deviation from Benford (p={p:.4}) - Investigation required"
        ),
        Severity::Moderate => format!(
            "Moderate statistical deviation from Benford (p={p:.4}) - Review recommended"
        ),
        Severity::Weak => {
            format!("Weak statistical deviation from Benford (p={p:.4}) - Monitor closely")
        }
        Severity::Clean if v.is_fraud => format!(
            "Flagged by additional rule(s): {} - Benford tests passed (p={p:.4})",
            v.extra_violations().join(", ")
        ),
        Severity::Clean => format!(
            "Data follows Benford's Law - No fraud detected (p={p:.4}, Digit-1={pct:.2}%)"
        ),
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /
pub async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "StreamCredit",
        "version": env!("CARGO_PKG_VERSION"),
        "api": state.api_prefix,
    }))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// GET {prefix}/
pub async fn api_root() -> Json<serde_json::Value> {
    Json(json!({ "message": "StreamCredit API v1" }))
}

/// POST {prefix}/risk/analyze-transactions
pub async fn analyze_transactions(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(req) = payload?;
    if req.transactions.is_empty() {
        return Err(ApiError::BadRequest(
            "transactions must contain at least one amount".into(),
        ));
    }

    let config = *state.detector.config();
    let alpha = req.significance_level.unwrap_or(config.significance_level);
    let alpha = validate_significance_level(alpha)?;

    let verdict = BenfordFraudDetector::with_significance_level(config, alpha)
        .analyze(&req.transactions);
    if let Some(reason) = verdict.no_data {
        return Err(CreditError::NoData(reason.to_string()).into());
    }

    info!(
        submitted = req.transactions.len(),
        analyzed = verdict.total_transactions,
        is_fraud = verdict.is_fraud,
        severity = %verdict.severity,
        "Transactions analyzed"
    );

    Ok(Json(AnalyzeResponse::from(&verdict)))
}

/// GET {prefix}/risk/benford-expected
pub async fn benford_expected() -> Json<BenfordExpectedResponse> {
    let expected_frequencies = BenfordExpectation::get()
        .iter()
        .map(|(digit, p)| {
            (
                digit.to_string(),
                ExpectedFrequency {
                    probability: round_to(p, 4),
                    percentage: round_to(p * 100.0, 2),
                },
            )
        })
        .collect();

    Json(BenfordExpectedResponse {
        law: "Benford's Law",
        formula: "P(d) = log10(1 + 1/d)",
        expected_frequencies,
    })
}

/// POST {prefix}/risk/quick-fraud-check
///
/// Empty input is not an error here: it returns the neutral verdict.
pub async fn quick_fraud_check(
    State(state): State<AppState>,
    payload: Result<Json<Vec<f64>>, JsonRejection>,
) -> Result<Json<QuickCheckResponse>, ApiError> {
    let Json(amounts) = payload?;
    let verdict = state.detector.analyze(&amounts);
    info!(
        analyzed = verdict.total_transactions,
        is_fraud = verdict.is_fraud,
        "Quick fraud check"
    );

    Ok(Json(QuickCheckResponse {
        is_fraud: verdict.is_fraud,
        confidence: round_to(verdict.fraud_probability(), 2),
        interpretation: interpret(&verdict),
        total_analyzed: verdict.total_transactions,
    }))
}

/// POST {prefix}/credit/evaluate
pub async fn evaluate_credit(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<CreditDecision>, ApiError> {
    let Json(req) = payload?;
    let decision = state.engine.calculate_score(&req.transactions);
    info!(
        decision = %decision.decision,
        score = decision.score,
        credit_limit = %decision.credit_limit,
        transactions = decision.total_transactions,
        "Credit evaluated"
    );
    Ok(Json(decision))
}

/// GET {prefix}/credit/demo/:scenario
pub async fn credit_demo(
    State(state): State<AppState>,
    Path(scenario): Path<String>,
) -> Result<Json<DemoResponse>, ApiError> {
    let profile: MerchantProfile = scenario.parse()?;
    let records = generator::generate_mock_data(DEMO_MONTHS, profile);
    let decision = state.engine.calculate_score(&records);

    info!(
        %profile,
        orders = records.len(),
        decision = %decision.decision,
        "Demo scenario evaluated"
    );

    Ok(Json(DemoResponse {
        scenario: profile.to_string(),
        total_orders: records.len(),
        decision,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
