//! Leading-digit extraction and observed-frequency histogram.

use std::fmt;

/// Number of leading-digit buckets (digits 1 through 9).
pub const DIGITS: usize = 9;

/// Extract the leading significant digit (1–9) of an amount.
///
/// Returns `None` for zero, negative, NaN and infinite amounts. The value is
/// rendered in scientific notation with 11 significant digits so that
/// binary rounding can't shift the leading digit, whatever the magnitude.
pub fn leading_digit(amount: f64) -> Option<u8> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }

    let rendered = format!("{:.10e}", amount.abs());
    rendered
        .bytes()
        .take_while(|b| *b != b'e')
        .find(|b| (b'1'..=b'9').contains(b))
        .map(|b| b - b'0')
}

/// Observed counts per leading digit, indexed 1..=9.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigitHistogram {
    counts: [u64; DIGITS],
}

impl DigitHistogram {
    /// Build a histogram from raw amounts. Invalid amounts are skipped and
    /// don't count toward the total.
    pub fn from_amounts<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut hist = Self::default();
        for amount in amounts {
            if let Some(d) = leading_digit(amount) {
                hist.counts[(d - 1) as usize] += 1;
            }
        }
        hist
    }

    /// Observed count for `digit` (0 for anything outside 1..=9).
    pub fn count(&self, digit: u8) -> u64 {
        match digit {
            1..=9 => self.counts[(digit - 1) as usize],
            _ => 0,
        }
    }

    /// Counts in digit order 1..=9.
    pub fn counts(&self) -> &[u64; DIGITS] {
        &self.counts
    }

    /// Number of valid amounts recorded.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Observed share of `digit` as a percentage (0.0 when empty).
    pub fn percentage(&self, digit: u8) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            100.0 * self.count(digit) as f64 / total as f64
        }
    }
}

impl fmt::Display for DigitHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = (1..=9u8)
            .map(|d| format!("{d}:{}", self.count(d)))
            .collect();
        write!(f, "[{}] n={}", parts.join(" "), self.total())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_digit_basic() {
        assert_eq!(leading_digit(123.45), Some(1));
        assert_eq!(leading_digit(9876.5), Some(9));
        assert_eq!(leading_digit(5.0), Some(5));
    }

    #[test]
    fn test_leading_digit_small_values() {
        assert_eq!(leading_digit(0.00456), Some(4));
        assert_eq!(leading_digit(0.0001), Some(1));
        assert_eq!(leading_digit(0.07), Some(7));
    }

    #[test]
    fn test_leading_digit_large_values() {
        assert_eq!(leading_digit(1e9), Some(1));
        assert_eq!(leading_digit(2_500_000_000.0), Some(2));
        assert_eq!(leading_digit(8.3e15), Some(8));
    }

    #[test]
    fn test_leading_digit_rounding_stable() {
        // 0.3 is stored as 0.29999999999999998...
        assert_eq!(leading_digit(0.3), Some(3));
        assert_eq!(leading_digit(0.1 + 0.2), Some(3));
        assert_eq!(leading_digit(1000.0), Some(1));
    }

    #[test]
    fn test_leading_digit_invalid() {
        assert_eq!(leading_digit(0.0), None);
        assert_eq!(leading_digit(-0.0), None);
        assert_eq!(leading_digit(-5.0), None);
        assert_eq!(leading_digit(f64::NAN), None);
        assert_eq!(leading_digit(f64::INFINITY), None);
        assert_eq!(leading_digit(f64::NEG_INFINITY), None);
    }

    #[test]
    fn test_histogram_counts() {
        let hist = DigitHistogram::from_amounts([123.45, 234.56, 345.67, 456.78, 567.89, 1.5]);
        assert_eq!(hist.count(1), 2);
        assert_eq!(hist.count(5), 1);
        assert_eq!(hist.count(9), 0);
        assert_eq!(hist.total(), 6);
    }

    #[test]
    fn test_histogram_skips_invalid() {
        let hist = DigitHistogram::from_amounts([-5.0, 0.0, f64::NAN, 42.0]);
        assert_eq!(hist.total(), 1);
        assert_eq!(hist.count(4), 1);
    }

    #[test]
    fn test_histogram_total_matches_valid_count() {
        let amounts: Vec<f64> = (-50..150).map(|i| i as f64 * 3.7).collect();
        let valid = amounts.iter().filter(|a| **a > 0.0).count() as u64;
        let hist = DigitHistogram::from_amounts(amounts);
        assert_eq!(hist.total(), valid);
        assert_eq!(hist.counts().iter().sum::<u64>(), valid);
    }

    #[test]
    fn test_histogram_percentage() {
        let hist = DigitHistogram::from_amounts([1.0, 10.0, 2.0, 3.0]);
        assert!((hist.percentage(1) - 50.0).abs() < 1e-10);
        assert_eq!(DigitHistogram::default().percentage(1), 0.0);
    }

    #[test]
    fn test_out_of_range_digit_count() {
        let hist = DigitHistogram::from_amounts([1.0]);
        assert_eq!(hist.count(0), 0);
        assert_eq!(hist.count(10), 0);
    }

    #[test]
    fn test_histogram_display() {
        let hist = DigitHistogram::from_amounts([1.0, 2.0]);
        let s = hist.to_string();
        assert!(s.contains("1:1"));
        assert!(s.contains("n=2"));
    }
}
