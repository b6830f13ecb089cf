//! Synthetic Shopify-style transaction data.
//!
//! Healthy merchants get log-normal order values (which follow Benford's
//! Law) with a rising monthly trend. Suspicious merchants get uniform order
//! values and erratic volume. Used by the demo endpoint and by tests.

use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::types::{CreditError, RawAmount, TransactionRecord, DATE_FORMAT};

/// Days per synthetic "month".
const DAYS_PER_MONTH: i64 = 30;

/// Kind of merchant to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MerchantProfile {
    /// Log-normal amounts, growing volume and revenue.
    Healthy,
    /// Uniform amounts, volatile volume.
    Suspicious,
}

impl fmt::Display for MerchantProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerchantProfile::Healthy => write!(f, "healthy"),
            MerchantProfile::Suspicious => write!(f, "suspicious"),
        }
    }
}

/// Case-insensitive; accepts a few aliases used by the frontend.
impl FromStr for MerchantProfile {
    type Err = CreditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "healthy" | "honest" => Ok(MerchantProfile::Healthy),
            "suspicious" | "fraud" | "fraudulent" => Ok(MerchantProfile::Suspicious),
            _ => Err(CreditError::UnknownScenario(s.to_string())),
        }
    }
}

/// Generate `months` months of transactions ending around `today`,
/// sorted by date.
pub fn generate_transactions<R: Rng + ?Sized>(
    months: u32,
    profile: MerchantProfile,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<TransactionRecord> {
    let start = today - Duration::days(DAYS_PER_MONTH * months as i64);
    let mut records = Vec::new();

    for month in 0..months {
        match profile {
            MerchantProfile::Healthy => healthy_month(month, start, rng, &mut records),
            MerchantProfile::Suspicious => suspicious_month(month, start, rng, &mut records),
        }
    }

    records.sort_by(|a, b| a.date.cmp(&b.date));

    debug!(
        months,
        %profile,
        transactions = records.len(),
        "Synthetic transactions generated"
    );

    records
}

/// Same as [`generate_transactions`], dated from today with a thread-local RNG.
pub fn generate_mock_data(months: u32, profile: MerchantProfile) -> Vec<TransactionRecord> {
    generate_transactions(
        months,
        profile,
        Utc::now().date_naive(),
        &mut rand::thread_rng(),
    )
}

fn healthy_month<R: Rng + ?Sized>(
    month: u32,
    start: NaiveDate,
    rng: &mut R,
    out: &mut Vec<TransactionRecord>,
) {
    let m = month as f64;
    let count = (100.0 + 10.0 * m + normal(rng, 0.0, 20.0)).max(50.0) as usize;
    let growth = 1.0 + 0.05 * m;

    for _ in 0..count {
        let amount = round_cents(log_normal(rng, 4.5, 1.2) * growth).max(10.0);
        let product_count = (log_normal(rng, 0.5, 0.5) as u32 + 1).min(5);
        out.push(record(month, start, amount, product_count, rng));
    }
}

fn suspicious_month<R: Rng + ?Sized>(
    month: u32,
    start: NaiveDate,
    rng: &mut R,
    out: &mut Vec<TransactionRecord>,
) {
    let count = rng.gen_range(20.0..200.0) as usize;
    for _ in 0..count {
        let amount = round_cents(rng.gen_range(10.0..500.0));
        let product_count = rng.gen_range(1..10);
        out.push(record(month, start, amount, product_count, rng));
    }
}

fn record<R: Rng + ?Sized>(
    month: u32,
    start: NaiveDate,
    amount: f64,
    product_count: u32,
    rng: &mut R,
) -> TransactionRecord {
    let offset = DAYS_PER_MONTH * month as i64 + rng.gen_range(0..DAYS_PER_MONTH);
    let date = start + Duration::days(offset);
    TransactionRecord {
        date: Some(date.format(DATE_FORMAT).to_string()),
        amount: Some(RawAmount::Number(amount)),
        order_id: Some(format!("ORD_{}", rng.gen_range(10000..100000))),
        customer_id: Some(format!("CUST_{}", rng.gen_range(1000..10000))),
        product_count: Some(product_count),
    }
}

fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    mean + std_dev * z
}

fn log_normal<R: Rng + ?Sized>(rng: &mut R, mu: f64, sigma: f64) -> f64 {
    normal(rng, mu, sigma).exp()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
