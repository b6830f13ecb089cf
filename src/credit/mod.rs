//! Credit decision engine.
//!
//! Combines revenue metrics with the Benford fraud verdict into a score,
//! a decision, a credit limit and a risk level.
//!
//! Rules, in order:
//! - No records → Rejected, score 400, risk High.
//! - Fraud flagged → score 0, Rejected, regardless of revenue.
//! - MAR > $5,000 AND AOV > $30 → score 750, Approved.
//! - Otherwise → score 400, Rejected.
//!
//! Approved limits are 2 × MAR, capped at $10,000.

pub mod metrics;

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fraud::{BenfordFraudDetector, FraudConfig, FraudVerdict};
use crate::types::{CreditDecision, Decision, RevenueMetrics, RiskLevel, TransactionRecord};

pub const SCORE_APPROVED: u32 = 750;
pub const SCORE_REJECTED: u32 = 400;
pub const SCORE_FRAUD: u32 = 0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Revenue thresholds and credit-limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditPolicy {
    /// MAR must be strictly above this to approve.
    pub mar_threshold: Decimal,
    /// AOV must be strictly above this to approve.
    pub aov_threshold: Decimal,
    /// Credit limit = multiplier × MAR.
    pub credit_multiplier: Decimal,
    /// Hard cap on any credit limit.
    pub max_credit_limit: Decimal,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            mar_threshold: dec!(5000),
            aov_threshold: dec!(30),
            credit_multiplier: dec!(2),
            max_credit_limit: dec!(10000),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Deterministic rule pipeline from transaction records to a credit decision.
pub struct CreditDecisionEngine {
    policy: CreditPolicy,
    detector: BenfordFraudDetector,
}

impl Default for CreditDecisionEngine {
    fn default() -> Self {
        Self::new(CreditPolicy::default(), FraudConfig::default())
    }
}

impl CreditDecisionEngine {
    pub fn new(policy: CreditPolicy, fraud: FraudConfig) -> Self {
        Self {
            policy,
            detector: BenfordFraudDetector::new(fraud),
        }
    }

    pub fn policy(&self) -> &CreditPolicy {
        &self.policy
    }

    /// Score a merchant from its transaction history.
    pub fn calculate_score(&self, records: &[TransactionRecord]) -> CreditDecision {
        if records.is_empty() {
            debug!("No transaction data, rejecting");
            return CreditDecision {
                score: SCORE_REJECTED,
                decision: Decision::Rejected,
                credit_limit: Decimal::ZERO,
                monthly_avg_revenue: Decimal::ZERO,
                avg_order_value: Decimal::ZERO,
                total_transactions: 0,
                risk_level: RiskLevel::High,
                reasons: vec!["No transaction data provided".to_string()],
                fraud_check: None,
            };
        }

        // Metrics first, so every outcome reports the true figures.
        let metrics = RevenueMetrics::from_records(records);
        let mar = to_money(metrics.monthly_avg_revenue);
        let aov = to_money(metrics.avg_order_value);

        let amounts: Vec<f64> = records
            .iter()
            .filter_map(TransactionRecord::amount)
            .filter(|a| *a > 0.0)
            .collect();
        let verdict = self.detector.analyze(&amounts);

        let decision = if verdict.is_fraud {
            self.reject_for_fraud(records.len(), mar, aov, verdict)
        } else {
            self.apply_thresholds(records.len(), mar, aov, verdict)
        };

        debug!(
            decision = %decision.decision,
            score = decision.score,
            credit_limit = %decision.credit_limit,
            mar = %decision.monthly_avg_revenue,
            aov = %decision.avg_order_value,
            risk = %decision.risk_level,
            transactions = decision.total_transactions,
            "Credit decision rendered"
        );

        decision
    }

    /// Fraud overrides revenue strength unconditionally.
    fn reject_for_fraud(
        &self,
        total: usize,
        mar: Decimal,
        aov: Decimal,
        verdict: FraudVerdict,
    ) -> CreditDecision {
        let mut reasons = vec!["Fraud detected".to_string()];
        if verdict.red_flags.chi_square_violation {
            reasons.push(format!(
                "Statistical anomaly detected in transaction distribution (p={:.4})",
                verdict.p_value
            ));
        }
        if verdict.red_flags.digit_1_threshold_violation {
            let d1 = &verdict.digit_1_analysis;
            reasons.push(format!(
                "Digit-1 frequency suspicious ({:.2}% outside {}-{}% range)",
                d1.observed_percentage, d1.threshold_min, d1.threshold_max
            ));
        }
        for rule in verdict.extra_violations() {
            reasons.push(format!("Flagged by rule: {rule}"));
        }

        debug!(reasons = ?reasons, "Rejected for fraud");

        CreditDecision {
            score: SCORE_FRAUD,
            decision: Decision::Rejected,
            credit_limit: Decimal::ZERO,
            monthly_avg_revenue: mar.round_dp(2),
            avg_order_value: aov.round_dp(2),
            total_transactions: total,
            risk_level: assess_risk(SCORE_FRAUD, true),
            reasons,
            fraud_check: Some(verdict),
        }
    }

    /// MAR and AOV thresholds. Both sub-conditions are always reported.
    /// Comparisons use the cent-rounded figures that the reasons print.
    fn apply_thresholds(
        &self,
        total: usize,
        mar: Decimal,
        aov: Decimal,
        verdict: FraudVerdict,
    ) -> CreditDecision {
        let p = &self.policy;
        let mar = mar.round_dp(2);
        let aov = aov.round_dp(2);
        let mar_ok = mar > p.mar_threshold;
        let aov_ok = aov > p.aov_threshold;

        let mut reasons = Vec::with_capacity(3);
        reasons.push(if mar_ok {
            format!("Strong revenue: MAR ${:.2} > ${:.2}", mar, p.mar_threshold)
        } else {
            format!("Insufficient revenue: MAR ${:.2} <= ${:.2}", mar, p.mar_threshold)
        });
        reasons.push(if aov_ok {
            format!("Healthy AOV: ${:.2} > ${:.2}", aov, p.aov_threshold)
        } else {
            format!("Low order value: AOV ${:.2} <= ${:.2}", aov, p.aov_threshold)
        });

        let (score, decision) = if mar_ok && aov_ok {
            (SCORE_APPROVED, Decision::Approved)
        } else {
            (SCORE_REJECTED, Decision::Rejected)
        };

        let credit_limit = self.credit_limit(mar, decision);
        if decision == Decision::Approved {
            reasons.push(format!(
                "Credit limit: ${:.2} ({}x MAR, capped at ${:.2})",
                credit_limit, p.credit_multiplier, p.max_credit_limit
            ));
        }

        CreditDecision {
            score,
            decision,
            credit_limit,
            monthly_avg_revenue: mar,
            avg_order_value: aov,
            total_transactions: total,
            risk_level: assess_risk(score, verdict.is_fraud),
            reasons,
            fraud_check: Some(verdict),
        }
    }

    /// min(multiplier × MAR, cap) when approved, else zero.
    fn credit_limit(&self, mar: Decimal, decision: Decision) -> Decimal {
        if decision != Decision::Approved {
            return Decimal::ZERO;
        }
        let raw = mar
            .checked_mul(self.policy.credit_multiplier)
            .unwrap_or(self.policy.max_credit_limit);
        raw.min(self.policy.max_credit_limit)
            .max(Decimal::ZERO)
            .round_dp(2)
    }
}

/// High for fraud or a zero score, Low for an approval-grade score, else Medium.
fn assess_risk(score: u32, is_fraud: bool) -> RiskLevel {
    if score == SCORE_FRAUD || is_fraud {
        RiskLevel::High
    } else if score >= SCORE_APPROVED {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

/// Convert a float metric to `Decimal`, saturating values Decimal can't hold.
fn to_money(value: f64) -> Decimal {
    match Decimal::from_f64(value) {
        Some(d) => d,
        None if value > 0.0 => Decimal::MAX,
        None if value < 0.0 => Decimal::MIN,
        None => Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
