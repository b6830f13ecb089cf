//! Benford's Law reference distribution.
//!
//! P(d) = log₁₀(1 + 1/d) for d ∈ {1..9}. The table is computed once on
//! first use and shared by reference for the life of the process.

use serde::Serialize;
use std::sync::OnceLock;

use super::digits::DIGITS;

static EXPECTATION: OnceLock<BenfordExpectation> = OnceLock::new();

/// Theoretical leading-digit probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenfordExpectation {
    probabilities: [f64; DIGITS],
}

impl BenfordExpectation {
    fn compute() -> Self {
        let mut probabilities = [0.0; DIGITS];
        for (i, p) in probabilities.iter_mut().enumerate() {
            let d = (i + 1) as f64;
            *p = (1.0 + 1.0 / d).log10();
        }
        Self { probabilities }
    }

    /// The process-wide table.
    pub fn get() -> &'static BenfordExpectation {
        EXPECTATION.get_or_init(Self::compute)
    }

    /// Probability of leading digit `digit` (0.0 outside 1..=9).
    pub fn probability(&self, digit: u8) -> f64 {
        match digit {
            1..=9 => self.probabilities[(digit - 1) as usize],
            _ => 0.0,
        }
    }

    /// Probability as a percentage.
    pub fn percentage(&self, digit: u8) -> f64 {
        self.probability(digit) * 100.0
    }

    /// Expected count for `digit` in a sample of `total` values.
    pub fn expected_count(&self, digit: u8, total: u64) -> f64 {
        self.probability(digit) * total as f64
    }

    /// `(digit, probability)` pairs in digit order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| ((i + 1) as u8, *p))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
