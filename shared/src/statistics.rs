//! Descriptive statistics over biometric series
//!
//! All functions treat their input as a sample in time order and return
//! `None` instead of a number when the series is too short.

use serde::{Deserialize, Serialize};

/// Absolute slope (units per sample) below which a series counts as stable
pub const TREND_SLOPE_THRESHOLD: f64 = 0.1;

/// Direction of a least-squares fit over a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl TrendDirection {
    /// Classify a slope against [`TREND_SLOPE_THRESHOLD`]
    pub fn from_slope(slope: f64) -> Self {
        if slope > TREND_SLOPE_THRESHOLD {
            TrendDirection::Increasing
        } else if slope < -TREND_SLOPE_THRESHOLD {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    /// Direction of `values`; fewer than two points is always stable
    pub fn of(values: &[f64]) -> Self {
        linear_slope(values).map_or(TrendDirection::Stable, Self::from_slope)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn min_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Population standard deviation (divides by `n`)
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Slope of the first-degree least-squares fit of `values` against their
/// index (0, 1, 2, ...)
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values)?;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    Some(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_series() {
        assert_eq!(mean(&[]), None);
        assert_eq!(min_value(&[]), None);
        assert_eq!(population_std_dev(&[]), None);
        assert_eq!(linear_slope(&[1.0]), None);
        assert_eq!(TrendDirection::of(&[42.0]), TrendDirection::Stable);
    }

    #[test]
    fn test_population_std_dev() {
        // Classic example: population std dev of this set is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&values).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_slope_matches_line() {
        let values = [10.0, 12.0, 14.0, 16.0];
        assert!((linear_slope(&values).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(TrendDirection::of(&values), TrendDirection::Increasing);
        assert_eq!(TrendDirection::of(&[75.0, 74.0, 73.5]), TrendDirection::Decreasing);
        assert_eq!(TrendDirection::of(&[70.0, 70.05, 70.1]), TrendDirection::Stable);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: mean is bounded by min and max of input
        #[test]
        fn prop_mean_bounded(values in prop::collection::vec(0.0f64..500.0, 1..50)) {
            let avg = mean(&values).unwrap();
            prop_assert!(avg >= min_value(&values).unwrap() - 1e-9);
            prop_assert!(avg <= max_value(&values).unwrap() + 1e-9);
        }

        /// Property: a constant series is stable with zero spread
        #[test]
        fn prop_constant_series_is_stable(value in 0.0f64..500.0, n in 2usize..30) {
            let values = vec![value; n];
            prop_assert!(population_std_dev(&values).unwrap().abs() < 1e-9);
            prop_assert_eq!(TrendDirection::of(&values), TrendDirection::Stable);
        }
    }
}
