//! Generator → fraud detector → credit engine, without HTTP.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal_macros::dec;

use streamcredit::credit::{CreditDecisionEngine, CreditPolicy, SCORE_FRAUD};
use streamcredit::fraud::{BenfordFraudDetector, FraudConfig, Severity};
use streamcredit::generator::{generate_transactions, MerchantProfile};
use streamcredit::types::{Decision, RevenueMetrics, RiskLevel, TransactionRecord};

use crate::fixtures::{benford_records, uniform_records};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

fn generated(profile: MerchantProfile, seed: u64) -> Vec<TransactionRecord> {
    generate_transactions(12, profile, today(), &mut StdRng::seed_from_u64(seed))
}

#[test]
fn test_suspicious_merchant_rejected_for_fraud() {
    let records = generated(MerchantProfile::Suspicious, 42);
    let d = CreditDecisionEngine::default().calculate_score(&records);

    assert!(d.is_fraud());
    assert_eq!(d.score, SCORE_FRAUD);
    assert_eq!(d.decision, Decision::Rejected);
    assert_eq!(d.risk_level, RiskLevel::High);
    assert_eq!(d.credit_limit, dec!(0));
    assert_eq!(d.reasons[0], "Fraud detected");
    assert_eq!(d.total_transactions, records.len());
}

#[test]
fn test_healthy_merchant_revenue_clears_thresholds() {
    let records = generated(MerchantProfile::Healthy, 7);
    let metrics = RevenueMetrics::from_records(&records);
    assert!(metrics.monthly_avg_revenue > 5000.0, "{metrics}");
    assert!(metrics.avg_order_value > 30.0, "{metrics}");

    // With revenue strong, only the fraud screen can reject.
    let d = CreditDecisionEngine::default().calculate_score(&records);
    assert_eq!(d.is_approved(), !d.is_fraud());
    if d.is_approved() {
        assert_eq!(d.credit_limit, dec!(10000));
        assert_eq!(d.risk_level, RiskLevel::Low);
    }
}

#[test]
fn test_generated_batches_are_reproducible() {
    let engine = CreditDecisionEngine::default();
    let a = engine.calculate_score(&generated(MerchantProfile::Healthy, 99));
    let b = engine.calculate_score(&generated(MerchantProfile::Healthy, 99));
    assert_eq!(a, b);
}

#[test]
fn test_benford_merchant_approved_with_capped_limit() {
    let records = benford_records(12, 100, 20.0);
    let d = CreditDecisionEngine::default().calculate_score(&records);

    assert_eq!(d.decision, Decision::Approved);
    assert_eq!(d.score, 750);
    assert_eq!(d.credit_limit, dec!(10000));
    assert_eq!(d.fraud_check.as_ref().unwrap().severity, Severity::Clean);
    assert!(d.reasons.iter().any(|r| r.starts_with("Credit limit")));
}

#[test]
fn test_uniform_merchant_critical() {
    let records = uniform_records(1200, 100.0, 1000.0);
    let d = CreditDecisionEngine::default().calculate_score(&records);
    let verdict = d.fraud_check.as_ref().unwrap();

    assert_eq!(verdict.severity, Severity::Critical);
    assert!(verdict.red_flags.chi_square_violation);
    assert!(verdict.red_flags.digit_1_threshold_violation);
    assert_eq!(d.score, SCORE_FRAUD);
}

#[test]
fn test_relaxed_policy_approves_small_merchant() {
    // $0.50 to $500 over a year: MAR around $3,600.
    let records = benford_records(12, 50, 0.5);
    let strict = CreditDecisionEngine::default().calculate_score(&records);
    assert_eq!(strict.decision, Decision::Rejected);
    assert_eq!(strict.risk_level, RiskLevel::Medium);

    let relaxed = CreditPolicy {
        mar_threshold: dec!(500),
        aov_threshold: dec!(10),
        ..CreditPolicy::default()
    };
    let d = CreditDecisionEngine::new(relaxed, FraudConfig::default()).calculate_score(&records);
    assert_eq!(d.decision, Decision::Approved);
    assert!(d.credit_limit < dec!(10000));
    assert!((d.credit_limit - d.monthly_avg_revenue * dec!(2)).abs() <= dec!(0.01));
}

#[test]
fn test_detector_agrees_with_engine_verdict() {
    let records = generated(MerchantProfile::Suspicious, 3);
    let amounts: Vec<f64> = records
        .iter()
        .filter_map(TransactionRecord::amount)
        .filter(|a| *a > 0.0)
        .collect();
    let direct = BenfordFraudDetector::default().analyze(&amounts);
    let d = CreditDecisionEngine::default().calculate_score(&records);
    assert_eq!(d.fraud_check.as_ref(), Some(&direct));
}
