//! Cross-method validation
//!
//! Compares the point estimates of every successful method, flags outliers
//! with the 1.5 × IQR rule and scores overall confidence in the analysis.

use crate::methods::{ComparativeResult, PmiMethod};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight assumed for a method with no reliability score
const DEFAULT_RELIABILITY: f64 = 50.0;

/// Spread of the per-method estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementMetrics {
    /// Population std / mean, as a fraction
    pub coefficient_of_variation: f64,
    pub range: f64,
    pub iqr: f64,
    pub mean_estimate: f64,
    pub std_estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    pub method_agreement: AgreementMetrics,
    pub method_estimates: BTreeMap<PmiMethod, f64>,
    pub consensus_estimate: f64,
    pub reliability_scores: BTreeMap<PmiMethod, f64>,
    pub outlier_methods: Vec<PmiMethod>,
    /// 0–100
    pub overall_confidence: f64,
}

pub fn cross_validate(comparison: &ComparativeResult) -> CrossValidationResult {
    let method_estimates: BTreeMap<PmiMethod, f64> = comparison
        .estimates
        .iter()
        .map(|e| (e.method, e.pmi_days))
        .collect();
    let reliability_scores: BTreeMap<PmiMethod, f64> = comparison
        .estimates
        .iter()
        .map(|e| (e.method, e.reliability_score))
        .collect();

    let method_agreement = agreement_metrics(&method_estimates);
    let outlier_methods = outlier_methods(&method_estimates);
    let consensus_estimate =
        weighted_consensus(&method_estimates, &reliability_scores, &outlier_methods);
    let overall_confidence =
        overall_confidence(&method_agreement, &reliability_scores, &outlier_methods);

    CrossValidationResult {
        method_agreement,
        method_estimates,
        consensus_estimate,
        reliability_scores,
        outlier_methods,
        overall_confidence,
    }
}

pub fn agreement_metrics(estimates: &BTreeMap<PmiMethod, f64>) -> AgreementMetrics {
    let values: Vec<f64> = estimates.values().copied().collect();
    let mean_estimate = stats::mean(&values);
    let std_estimate = stats::population_std(&values);
    let quartiles = stats::percentiles(&values, &[25.0, 75.0]);

    AgreementMetrics {
        coefficient_of_variation: stats::coefficient_of_variation(std_estimate, mean_estimate),
        range: stats::max(&values) - stats::min(&values),
        iqr: quartiles[1] - quartiles[0],
        mean_estimate,
        std_estimate,
    }
}

/// Methods whose estimate lies outside `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`
pub fn outlier_methods(estimates: &BTreeMap<PmiMethod, f64>) -> Vec<PmiMethod> {
    let values: Vec<f64> = estimates.values().copied().collect();
    let quartiles = stats::percentiles(&values, &[25.0, 75.0]);
    let iqr = quartiles[1] - quartiles[0];
    let lower = quartiles[0] - 1.5 * iqr;
    let upper = quartiles[1] + 1.5 * iqr;

    estimates
        .iter()
        .filter(|(_, pmi)| **pmi < lower || **pmi > upper)
        .map(|(method, _)| *method)
        .collect()
}

/// Reliability-weighted mean of the non-outlier estimates
pub fn weighted_consensus(
    estimates: &BTreeMap<PmiMethod, f64>,
    reliability_scores: &BTreeMap<PmiMethod, f64>,
    outliers: &[PmiMethod],
) -> f64 {
    let valid: Vec<(PmiMethod, f64)> = estimates
        .iter()
        .filter(|(method, _)| !outliers.contains(method))
        .map(|(method, pmi)| (*method, *pmi))
        .collect();

    if valid.is_empty() {
        let all: Vec<f64> = estimates.values().copied().collect();
        return stats::mean(&all);
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (method, pmi) in &valid {
        let weight = reliability_scores
            .get(method)
            .copied()
            .unwrap_or(DEFAULT_RELIABILITY)
            / 100.0;
        weighted_sum += pmi * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        let values: Vec<f64> = valid.iter().map(|(_, pmi)| *pmi).collect();
        stats::mean(&values)
    }
}

pub fn overall_confidence(
    agreement: &AgreementMetrics,
    reliability_scores: &BTreeMap<PmiMethod, f64>,
    outliers: &[PmiMethod],
) -> f64 {
    let mut confidence = 100.0;

    let cv = agreement.coefficient_of_variation;
    if cv > 0.5 {
        confidence -= 30.0;
    } else if cv > 0.3 {
        confidence -= 15.0;
    } else if cv > 0.1 {
        confidence -= 5.0;
    }

    confidence -= outliers.len() as f64 * 10.0;

    let scores: Vec<f64> = reliability_scores.values().copied().collect();
    let average_reliability = stats::mean(&scores);
    if average_reliability < 60.0 {
        confidence -= 20.0;
    } else if average_reliability < 80.0 {
        confidence -= 10.0;
    }

    f64::clamp(confidence, 0.0, 100.0)
}
