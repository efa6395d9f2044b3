//! Descriptive statistics over PMI samples
//!
//! All functions return 0.0 for an empty slice.

use serde::{Deserialize, Serialize};

/// Closed interval in days
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n)
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sample standard deviation (divides by n − 1); 0.0 below two values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Percentile with linear interpolation between closest ranks
///
/// `q` is in percent (0–100) and is clamped to that range.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    percentile_of_sorted(&sorted(values), q)
}

/// Several percentiles over one sort
pub fn percentiles(values: &[f64], qs: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![0.0; qs.len()];
    }
    let sorted = sorted(values);
    qs.iter().map(|q| percentile_of_sorted(&sorted, *q)).collect()
}

fn percentile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 100.0);
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Coefficient of variation as a fraction; 0.0 when the mean is not positive
pub fn coefficient_of_variation(std: f64, mean: f64) -> f64 {
    if mean > 0.0 {
        std / mean
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(mean(&values), 5.0));
        assert!(approx(population_std(&values), 2.0));
        assert!(approx(sample_std(&values), (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
        assert_eq!(sample_std(&[3.0]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(min(&[]), 0.0);
        assert_eq!(max(&[3.0]), 3.0);
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(percentile(&values, 0.0), 1.0));
        assert!(approx(percentile(&values, 100.0), 4.0));
        assert!(approx(percentile(&values, 50.0), 2.5));
        assert!(approx(percentile(&values, 25.0), 1.75));
        assert!(approx(percentile(&values, 75.0), 3.25));
    }

    #[test]
    fn test_median_unsorted_input() {
        assert!(approx(median(&[9.0, 1.0, 5.0]), 5.0));
        assert!(approx(median(&[4.0, 1.0, 3.0, 2.0]), 2.5));
    }

    #[test]
    fn test_percentiles_batch_matches_single() {
        let values = [5.0, 3.0, 8.0, 1.0, 9.5, 2.2];
        let batch = percentiles(&values, &[5.0, 50.0, 95.0]);
        assert!(approx(batch[0], percentile(&values, 5.0)));
        assert!(approx(batch[1], percentile(&values, 50.0)));
        assert!(approx(batch[2], percentile(&values, 95.0)));
    }

    #[test]
    fn test_interval() {
        let interval = Interval::new(3.0, 5.0);
        assert!(interval.contains(3.0));
        assert!(interval.contains(5.0));
        assert!(!interval.contains(5.01));
        assert!(approx(interval.width(), 2.0));
    }

    #[test]
    fn test_cv_guards_non_positive_mean() {
        assert_eq!(coefficient_of_variation(1.0, 0.0), 0.0);
        assert!(approx(coefficient_of_variation(1.0, 4.0), 0.25));
    }
}
