//! Shared types for StreamCredit.
//!
//! Transaction records come in from the boundary, revenue metrics and
//! credit decisions go out. Everything here is built fresh per call and
//! never patched after construction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::fraud::FraudVerdict;

/// Date layout used by every upstream transaction source.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Transaction records
// ---------------------------------------------------------------------------

/// Amount as it arrives on the wire: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    /// Parse into a finite float. NaN, infinities and non-numeric text yield `None`.
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            RawAmount::Number(n) => *n,
            RawAmount::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

/// One ledger entry (e.g. a Shopify order).
///
/// Date and amount are independently optional. Accessors return `None`
/// for missing or malformed fields, and computations that need a field
/// skip records where it is absent. A field of the wrong JSON type
/// deserializes to `None` instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Option<RawAmount>,
    /// Opaque; numeric ids are kept as their decimal text.
    #[serde(default, deserialize_with = "opaque_id", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "opaque_id", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u32>,
}

/// Any value that does not fit `T` becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Deserialize a record list where an entry that is not an object
/// becomes an empty record. It still counts toward the batch size.
pub fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<TransactionRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .collect())
}

impl TransactionRecord {
    /// Minimal record with just a date and an amount.
    pub fn new(date: impl Into<String>, amount: f64) -> Self {
        Self {
            date: Some(date.into()),
            amount: Some(RawAmount::Number(amount)),
            ..Default::default()
        }
    }

    /// Calendar day of the transaction, if present and well-formed.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
    }

    /// Transaction amount, if present and a finite number.
    pub fn amount(&self) -> Option<f64> {
        self.amount.as_ref()?.parse()
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.date.as_deref().unwrap_or("?");
        match self.amount() {
            Some(a) => write!(f, "{date} ${a:.2}")?,
            None => write!(f, "{date} $?")?,
        }
        if let Some(id) = &self.order_id {
            write!(f, " [{id}]")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Revenue metrics
// ---------------------------------------------------------------------------

/// Monthly average revenue and average order value of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetrics {
    pub monthly_avg_revenue: f64,
    pub avg_order_value: f64,
}

impl fmt::Display for RevenueMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAR=${:.2} AOV=${:.2}",
            self.monthly_avg_revenue, self.avg_order_value
        )
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Final credit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approved => write!(f, "Approved"),
            Decision::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Risk tier attached to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

// ---------------------------------------------------------------------------
// Credit decision
// ---------------------------------------------------------------------------

/// Output of the credit decision engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditDecision {
    /// One of 0 (fraud), 400 (rejected), 750 (approved).
    pub score: u32,
    pub decision: Decision,
    pub credit_limit: Decimal,
    pub monthly_avg_revenue: Decimal,
    pub avg_order_value: Decimal,
    /// Number of records submitted, including malformed ones.
    pub total_transactions: usize,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    /// `None` only when no records were submitted at all.
    pub fraud_check: Option<FraudVerdict>,
}

impl fmt::Display for CreditDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} score={} limit=${} risk={} | MAR=${} AOV=${} | txns={}",
            self.decision,
            self.score,
            self.credit_limit,
            self.risk_level,
            self.monthly_avg_revenue,
            self.avg_order_value,
            self.total_transactions,
        )
    }
}

impl CreditDecision {
    pub fn is_approved(&self) -> bool {
        self.decision == Decision::Approved
    }

    /// Whether the embedded fraud verdict flagged the batch.
    pub fn is_fraud(&self) -> bool {
        self.fraud_check.as_ref().is_some_and(|v| v.is_fraud)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for StreamCredit.
///
/// The scoring core never fails; these are raised by configuration
/// validation and the request boundary.
#[derive(Debug, thiserror::Error)]
pub enum CreditError {
    #[error("Significance level {0} outside accepted range (0.001, 0.1]")]
    InvalidSignificanceLevel(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown demo scenario: {0}")]
    UnknownScenario(String),

    #[error("No data: {0}")]
    NoData(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
