use std::cmp::Ordering;

/// Relative tolerance used when checking that a period is a whole number of samples.
pub const INTEGER_MULTIPLE_TOLERANCE: f64 = 1e-10;

/// Distance from .5 within which a scaled value is checked digit by digit.
const TIE_WINDOW: f64 = 1e-6;
/// Decimal digits past the kept places inspected to resolve a tie.
const TIE_DIGITS: usize = 20;

pub struct StatsHelper;

impl StatsHelper {
    /// Smallest finite value, or `None` for an empty sequence.
    pub fn min(values: impl IntoIterator<Item = f64>) -> Option<f64> {
        values.into_iter().fold(None, |acc, v| match acc {
            Some(current) if current <= v => Some(current),
            _ => Some(v),
        })
    }

    /// Largest value, or `None` for an empty sequence.
    pub fn max(values: impl IntoIterator<Item = f64>) -> Option<f64> {
        values.into_iter().fold(None, |acc, v| match acc {
            Some(current) if current >= v => Some(current),
            _ => Some(v),
        })
    }

    pub fn median(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    /// Rounds the exact binary value of `value` to `decimals` places.
    ///
    /// Only values whose decimal expansion is exactly a tie go to the even
    /// neighbour; `0.0005` is slightly above a tie and rounds up.
    pub fn round_decimals(value: f64, decimals: u32) -> f64 {
        let factor = 10f64.powi(decimals as i32);
        let scaled = (value * factor).abs();
        if !scaled.is_finite() || ((scaled - scaled.floor()) - 0.5).abs() > TIE_WINDOW {
            return (value * factor).round_ties_even() / factor;
        }

        // The product may have landed on .5 by rounding; settle it on the exact digits.
        let digits = format!("{:.*}", decimals as usize + TIE_DIGITS, value.abs());
        let tail = &digits[digits.len() - TIE_DIGITS..];
        let midpoint = format!("5{}", "0".repeat(TIE_DIGITS - 1));
        let lower = scaled.floor();
        let round_up = match tail.cmp(midpoint.as_str()) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => lower % 2.0 == 1.0,
        };
        let magnitude = if round_up { lower + 1.0 } else { lower };
        (magnitude / factor).copysign(value)
    }
}

/// Checks whether `larger` is an integer multiple of `smaller` within `tolerance`.
pub fn is_integer_multiple_within(larger: f64, smaller: f64, tolerance: f64) -> bool {
    if smaller == 0.0 || !larger.is_finite() || !smaller.is_finite() {
        return false;
    }
    let ratio = larger / smaller;
    (ratio.round() - ratio).abs() < tolerance
}

pub fn is_integer_multiple(larger: f64, smaller: f64) -> bool {
    is_integer_multiple_within(larger, smaller, INTEGER_MULTIPLE_TOLERANCE)
}
