//! Revenue metrics: monthly average revenue (MAR) and average order value (AOV).

use chrono::Datelike;
use std::collections::BTreeMap;

use crate::types::{RevenueMetrics, TransactionRecord};

/// Average of per-month revenue over the months actually observed.
///
/// Records missing a parseable date or amount are skipped. A batch with
/// activity in 3 of 12 requested months averages over 3. Returns 0.0 when
/// no record survives.
pub fn compute_mar(records: &[TransactionRecord]) -> f64 {
    // Ordered map keeps the summation order stable between calls.
    let mut monthly: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for rec in records {
        let (Some(date), Some(amount)) = (rec.date(), rec.amount()) else {
            continue;
        };
        *monthly.entry((date.year(), date.month())).or_insert(0.0) += amount;
    }

    if monthly.is_empty() {
        return 0.0;
    }
    monthly.values().sum::<f64>() / monthly.len() as f64
}

/// Mean of every parseable positive amount in the batch (not grouped by month).
///
/// Returns 0.0 when no record survives.
pub fn compute_aov(records: &[TransactionRecord]) -> f64 {
    let (total, count) = records
        .iter()
        .filter_map(TransactionRecord::amount)
        .filter(|a| *a > 0.0)
        .fold((0.0, 0usize), |(sum, n), a| (sum + a, n + 1));

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

impl RevenueMetrics {
    pub fn from_records(records: &[TransactionRecord]) -> Self {
        Self {
            monthly_avg_revenue: compute_mar(records),
            avg_order_value: compute_aov(records),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
