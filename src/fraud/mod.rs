//! Benford's Law fraud screening.
//!
//! Builds a leading-digit histogram from transaction amounts, compares it
//! to the Benford distribution with a chi-square test, checks the share of
//! leading 1s against a fixed band, and flags fraud if either rule fires.
//! Flagging on either rule trades false positives for recall.

pub mod benford;
pub mod chi_square;
pub mod digits;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::types::CreditError;
use benford::BenfordExpectation;
use digits::DigitHistogram;
use rules::{
    BandDeviation, ChiSquareRule, DigitOneRule, FraudRule, RuleContext, RuleDetail, RuleOutcome,
    CHI_SQUARE_RULE, DIGIT_ONE_RULE,
};

/// Default significance level α.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Accepted α range, exclusive below and inclusive above.
pub const MIN_SIGNIFICANCE_LEVEL: f64 = 0.001;
pub const MAX_SIGNIFICANCE_LEVEL: f64 = 0.1;

/// p-value cut-offs for the chi-square-only severity sub-tiers.
const STRONG_P_VALUE: f64 = 0.001;
const MODERATE_P_VALUE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Detector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudConfig {
    /// α for the chi-square rule. Validated upstream to (0.001, 0.1].
    pub significance_level: f64,
    /// Lower edge of the accepted digit-1 band (percent, inclusive).
    pub digit_one_min_pct: f64,
    /// Upper edge of the accepted digit-1 band (percent, inclusive).
    pub digit_one_max_pct: f64,
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            digit_one_min_pct: rules::DIGIT_ONE_MIN_PCT,
            digit_one_max_pct: rules::DIGIT_ONE_MAX_PCT,
        }
    }
}

/// Check α against (0.001, 0.1]. Used by config loading and request validation;
/// the detector itself accepts whatever it is given.
pub fn validate_significance_level(alpha: f64) -> Result<f64, CreditError> {
    if alpha > MIN_SIGNIFICANCE_LEVEL && alpha <= MAX_SIGNIFICANCE_LEVEL {
        Ok(alpha)
    } else {
        Err(CreditError::InvalidSignificanceLevel(alpha))
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Why a verdict carries no statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    /// The input sequence was empty.
    NoTransactions,
    /// Every amount was zero, negative or not finite.
    NoValidAmounts,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::NoTransactions => write!(f, "No transactions provided"),
            NoDataReason::NoValidAmounts => {
                write!(f, "No valid transactions (all zero or negative)")
            }
        }
    }
}

/// Structured severity of a verdict, in rising order of concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Clean,
    Weak,
    Moderate,
    Strong,
    RedFlagLow,
    RedFlagHigh,
    Critical,
}

impl Severity {
    /// Precedence: both rules → critical; digit-1 only → red flag by side;
    /// chi-square only → strength by p-value; neither → clean.
    fn classify(chi_square: bool, digit_one: Option<BandDeviation>, p_value: f64) -> Self {
        match (chi_square, digit_one) {
            (true, Some(_)) => Severity::Critical,
            (false, Some(BandDeviation::Low)) => Severity::RedFlagLow,
            (false, Some(BandDeviation::High)) => Severity::RedFlagHigh,
            (true, None) if p_value < STRONG_P_VALUE => Severity::Strong,
            (true, None) if p_value < MODERATE_P_VALUE => Severity::Moderate,
            (true, None) => Severity::Weak,
            (false, None) => Severity::Clean,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Clean => write!(f, "clean"),
            Severity::Weak => write!(f, "weak"),
            Severity::Moderate => write!(f, "moderate"),
            Severity::Strong => write!(f, "strong"),
            Severity::RedFlagLow => write!(f, "red-flag-low"),
            Severity::RedFlagHigh => write!(f, "red-flag-high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Per-rule violation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RedFlags {
    pub chi_square_violation: bool,
    pub digit_1_threshold_violation: bool,
}

/// Observed vs expected share of leading 1s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DigitOneAnalysis {
    pub observed_percentage: f64,
    pub expected_percentage: f64,
    pub threshold_min: f64,
    pub threshold_max: f64,
    pub is_within_threshold: bool,
}

/// One diagnostic row per digit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DigitDetail {
    pub digit: u8,
    pub observed_count: u64,
    pub expected_count: f64,
    pub observed_percentage: f64,
    pub expected_percentage: f64,
    /// observed_percentage − expected_percentage
    pub deviation: f64,
}

/// Outcome of one fraud analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudVerdict {
    pub chi_square_stat: f64,
    pub p_value: f64,
    pub is_fraud: bool,
    pub red_flags: RedFlags,
    pub digit_1_analysis: DigitOneAnalysis,
    /// Nine rows, or empty for a no-data sentinel.
    pub details: Vec<DigitDetail>,
    /// Number of valid (positive, finite) amounts analysed.
    pub total_transactions: u64,
    pub significance_level: f64,
    pub severity: Severity,
    /// Every rule evaluated, in order.
    pub rule_outcomes: Vec<RuleOutcome>,
    /// Set when there was nothing to analyse.
    pub no_data: Option<NoDataReason>,
}

impl FraudVerdict {
    /// Neutral, non-fraud verdict for degenerate input.
    fn no_data(reason: NoDataReason, config: &FraudConfig) -> Self {
        FraudVerdict {
            chi_square_stat: 0.0,
            p_value: 1.0,
            is_fraud: false,
            red_flags: RedFlags::default(),
            digit_1_analysis: DigitOneAnalysis {
                observed_percentage: 0.0,
                expected_percentage: BenfordExpectation::get().percentage(1),
                threshold_min: config.digit_one_min_pct,
                threshold_max: config.digit_one_max_pct,
                is_within_threshold: true,
            },
            details: Vec::new(),
            total_transactions: 0,
            significance_level: config.significance_level,
            severity: Severity::Clean,
            rule_outcomes: Vec::new(),
            no_data: Some(reason),
        }
    }

    /// Confidence of fraud as a percentage: 100 × (1 − p).
    pub fn fraud_probability(&self) -> f64 {
        (1.0 - self.p_value) * 100.0
    }

    pub fn is_no_data(&self) -> bool {
        self.no_data.is_some()
    }

    /// Which side of the digit-1 band was breached, if any.
    pub fn digit_one_deviation(&self) -> Option<BandDeviation> {
        self.rule_outcomes.iter().find_map(|o| match o.detail {
            RuleDetail::DigitOne { deviation, .. } if o.rule == DIGIT_ONE_RULE => deviation,
            _ => None,
        })
    }

    /// Names of extra rules that fired.
    pub fn extra_violations(&self) -> Vec<&'static str> {
        self.rule_outcomes
            .iter()
            .filter(|o| o.violated && o.rule != CHI_SQUARE_RULE && o.rule != DIGIT_ONE_RULE)
            .map(|o| o.rule)
            .collect()
    }
}

impl fmt::Display for FraudVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = self.no_data {
            return write!(f, "no data: {reason}");
        }
        write!(
            f,
            "fraud={} severity={} χ²={:.4} p={:.4} digit1={:.2}% n={}",
            self.is_fraud,
            self.severity,
            self.chi_square_stat,
            self.p_value,
            self.digit_1_analysis.observed_percentage,
            self.total_transactions,
        )
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Benford's Law fraud detector.
///
/// Holds only immutable configuration; `analyze` may be called from any
/// number of threads at once.
pub struct BenfordFraudDetector {
    config: FraudConfig,
    rules: Vec<Box<dyn FraudRule>>,
}

impl Default for BenfordFraudDetector {
    fn default() -> Self {
        Self::new(FraudConfig::default())
    }
}

impl BenfordFraudDetector {
    pub fn new(config: FraudConfig) -> Self {
        let rules: Vec<Box<dyn FraudRule>> = vec![
            Box::new(ChiSquareRule {
                significance_level: config.significance_level,
            }),
            Box::new(DigitOneRule {
                min_pct: config.digit_one_min_pct,
                max_pct: config.digit_one_max_pct,
            }),
        ];
        Self { config, rules }
    }

    /// Same band, different α.
    pub fn with_significance_level(config: FraudConfig, significance_level: f64) -> Self {
        Self::new(FraudConfig {
            significance_level,
            ..config
        })
    }

    /// Append an extra rule; it is OR-ed with the built-in ones.
    pub fn with_rule(mut self, rule: Box<dyn FraudRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn config(&self) -> &FraudConfig {
        &self.config
    }

    /// Analyse a batch of amounts against Benford's Law.
    ///
    /// Never fails: empty input, or input with no positive finite amounts,
    /// yields a neutral verdict with `no_data` set.
    pub fn analyze(&self, amounts: &[f64]) -> FraudVerdict {
        if amounts.is_empty() {
            return FraudVerdict::no_data(NoDataReason::NoTransactions, &self.config);
        }

        let histogram = DigitHistogram::from_amounts(amounts.iter().copied());
        let total = histogram.total();
        if total == 0 {
            return FraudVerdict::no_data(NoDataReason::NoValidAmounts, &self.config);
        }

        let table = BenfordExpectation::get();
        let expected: Vec<f64> = (1..=9u8).map(|d| table.expected_count(d, total)).collect();

        let chi_square_stat = chi_square::statistic(histogram.counts(), &expected);
        let p_value = chi_square::p_value(chi_square_stat, chi_square::DEGREES_OF_FREEDOM);
        let digit_one_pct = histogram.percentage(1);

        let ctx = RuleContext {
            histogram: &histogram,
            chi_square_stat,
            p_value,
        };
        let rule_outcomes = rules::evaluate_all(&self.rules, &ctx);
        let is_fraud = rules::any_violated(&rule_outcomes);

        // Red flags and severity track the built-in rules only. Extra rules
        // still contribute to `is_fraud`.
        let mut red_flags = RedFlags::default();
        let mut digit_one_side = None;
        for outcome in &rule_outcomes {
            match outcome.rule {
                CHI_SQUARE_RULE => red_flags.chi_square_violation |= outcome.violated,
                DIGIT_ONE_RULE => {
                    red_flags.digit_1_threshold_violation |= outcome.violated;
                    if let RuleDetail::DigitOne { deviation, .. } = outcome.detail {
                        digit_one_side = digit_one_side.or(deviation);
                    }
                }
                _ => {}
            }
        }

        let severity = Severity::classify(red_flags.chi_square_violation, digit_one_side, p_value);

        let details = (1..=9u8)
            .zip(&expected)
            .map(|(digit, expected_count)| {
                let observed_percentage = histogram.percentage(digit);
                let expected_percentage = table.percentage(digit);
                DigitDetail {
                    digit,
                    observed_count: histogram.count(digit),
                    expected_count: *expected_count,
                    observed_percentage,
                    expected_percentage,
                    deviation: observed_percentage - expected_percentage,
                }
            })
            .collect();

        debug!(
            total,
            chi_square = format!("{chi_square_stat:.4}"),
            p_value = format!("{p_value:.4}"),
            digit_one = format!("{digit_one_pct:.2}%"),
            chi_square_violation = red_flags.chi_square_violation,
            digit_one_violation = red_flags.digit_1_threshold_violation,
            %severity,
            "Benford analysis complete"
        );

        FraudVerdict {
            chi_square_stat,
            p_value,
            is_fraud,
            red_flags,
            digit_1_analysis: DigitOneAnalysis {
                observed_percentage: digit_one_pct,
                expected_percentage: table.percentage(1),
                threshold_min: self.config.digit_one_min_pct,
                threshold_max: self.config.digit_one_max_pct,
                is_within_threshold: !red_flags.digit_1_threshold_violation,
            },
            details,
            total_transactions: total,
            significance_level: self.config.significance_level,
            severity,
            rule_outcomes,
            no_data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
