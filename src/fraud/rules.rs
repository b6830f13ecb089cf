//! Independent fraud rules and the reducer that combines them.
//!
//! Each rule looks at the same precomputed statistics and reports a
//! boolean plus its own diagnostic payload, tagged with the rule's name.
//! The overall flag is the OR of every rule, so any rule alone is enough
//! to flag a batch.

use serde::Serialize;
use std::fmt;
use tracing::trace;

use super::digits::DigitHistogram;

/// Business constants for the digit-1 band, as percentages.
pub const DIGIT_ONE_MIN_PCT: f64 = 25.0;
pub const DIGIT_ONE_MAX_PCT: f64 = 35.0;

/// Names of the built-in rules.
pub const CHI_SQUARE_RULE: &str = "chi_square";
pub const DIGIT_ONE_RULE: &str = "digit_one";

/// Statistics shared by every rule for a single analysis run.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Observed leading-digit counts of the valid amounts.
    pub histogram: &'a DigitHistogram,
    pub chi_square_stat: f64,
    pub p_value: f64,
}

/// Which side of the digit-1 band an observation fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandDeviation {
    Low,
    High,
}

/// Rule-specific diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleDetail {
    ChiSquare {
        statistic: f64,
        p_value: f64,
        significance_level: f64,
    },
    DigitOne {
        observed_pct: f64,
        min_pct: f64,
        max_pct: f64,
        deviation: Option<BandDeviation>,
    },
    /// Free-form payload for rules added with `BenfordFraudDetector::with_rule`.
    Custom { message: String },
}

/// Result of evaluating one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    /// `FraudRule::name` of the rule that produced this outcome.
    pub rule: &'static str,
    pub violated: bool,
    #[serde(flatten)]
    pub detail: RuleDetail,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.violated { "VIOLATED" } else { "ok" };
        match &self.detail {
            RuleDetail::ChiSquare { p_value, significance_level, .. } => {
                write!(f, "chi-square p={p_value:.4} α={significance_level} [{status}]")
            }
            RuleDetail::DigitOne { observed_pct, min_pct, max_pct, .. } => {
                write!(f, "digit-1 {observed_pct:.2}% in [{min_pct}, {max_pct}] [{status}]")
            }
            RuleDetail::Custom { message } => write!(f, "{}: {message} [{status}]", self.rule),
        }
    }
}

/// A single fraud heuristic.
pub trait FraudRule: Send + Sync {
    /// Short identifier, unique per detector. Used in logs and to key red flags.
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome;
}

// ---------------------------------------------------------------------------
// Chi-square rule
// ---------------------------------------------------------------------------

/// Violated when the goodness-of-fit p-value falls below α.
#[derive(Debug, Clone, Copy)]
pub struct ChiSquareRule {
    pub significance_level: f64,
}

impl FraudRule for ChiSquareRule {
    fn name(&self) -> &'static str {
        CHI_SQUARE_RULE
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        RuleOutcome {
            rule: self.name(),
            violated: ctx.p_value < self.significance_level,
            detail: RuleDetail::ChiSquare {
                statistic: ctx.chi_square_stat,
                p_value: ctx.p_value,
                significance_level: self.significance_level,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Digit-1 rule
// ---------------------------------------------------------------------------

/// Violated when the share of leading 1s leaves the closed band [min, max].
#[derive(Debug, Clone, Copy)]
pub struct DigitOneRule {
    pub min_pct: f64,
    pub max_pct: f64,
}

impl Default for DigitOneRule {
    fn default() -> Self {
        Self {
            min_pct: DIGIT_ONE_MIN_PCT,
            max_pct: DIGIT_ONE_MAX_PCT,
        }
    }
}

impl FraudRule for DigitOneRule {
    fn name(&self) -> &'static str {
        DIGIT_ONE_RULE
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let pct = ctx.histogram.percentage(1);
        let deviation = if pct < self.min_pct {
            Some(BandDeviation::Low)
        } else if pct > self.max_pct {
            Some(BandDeviation::High)
        } else {
            None
        };

        RuleOutcome {
            rule: self.name(),
            violated: deviation.is_some(),
            detail: RuleDetail::DigitOne {
                observed_pct: pct,
                min_pct: self.min_pct,
                max_pct: self.max_pct,
                deviation,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Evaluate every rule in order.
pub fn evaluate_all(rules: &[Box<dyn FraudRule>], ctx: &RuleContext<'_>) -> Vec<RuleOutcome> {
    rules
        .iter()
        .map(|rule| {
            let outcome = rule.evaluate(ctx);
            trace!(rule = rule.name(), %outcome, "Rule evaluated");
            outcome
        })
        .collect()
}

/// OR-combination of rule outcomes.
pub fn any_violated(outcomes: &[RuleOutcome]) -> bool {
    outcomes.iter().any(|o| o.violated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
