//! Combined validation report and its scoring

use super::cross_validation::CrossValidationResult;
use super::known_cases::KnownCaseResult;
use super::monte_carlo::MonteCarloResult;
use super::uncertainty::UncertaintyAnalysis;
use crate::stats;
use pmi_common::{DevelopmentStage, Species};
use serde::{Deserialize, Serialize};

/// Known cases above this relative error trigger a recommendation
const HIGH_CASE_ERROR: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub species: Species,
    pub stage: DevelopmentStage,
    pub uncertainty_analysis: UncertaintyAnalysis,
    /// Absent for the quick report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monte_carlo: Option<MonteCarloResult>,
    pub cross_validation: CrossValidationResult,
    pub known_cases: Vec<KnownCaseResult>,
    /// 0–100
    pub overall_validation_score: f64,
    pub recommendations: Vec<String>,
}

/// Overall validation score in 0..100
///
/// Starts from a relative-uncertainty penalty, blends in the cross-method
/// confidence (40%), then the known-case accuracy (30%) when cases exist.
pub fn validation_score(
    uncertainty: &UncertaintyAnalysis,
    cross_validation: &CrossValidationResult,
    known_cases: &[KnownCaseResult],
) -> f64 {
    let mut score = 100.0;

    let relative = uncertainty.relative_uncertainty;
    if relative > 0.5 {
        score -= 20.0;
    } else if relative > 0.3 {
        score -= 10.0;
    } else if relative > 0.1 {
        score -= 5.0;
    }

    score = score * 0.6 + cross_validation.overall_confidence * 0.4;

    if !known_cases.is_empty() {
        let errors: Vec<f64> = known_cases.iter().map(|c| c.relative_error).collect();
        let within: Vec<f64> = known_cases
            .iter()
            .map(|c| if c.within_confidence { 1.0 } else { 0.0 })
            .collect();
        let case_score =
            (100.0 - stats::mean(&errors) * 100.0 + stats::mean(&within) * 20.0).clamp(0.0, 100.0);
        score = score * 0.7 + case_score * 0.3;
    }

    score.clamp(0.0, 100.0)
}

pub fn validation_recommendations(
    uncertainty: &UncertaintyAnalysis,
    cross_validation: &CrossValidationResult,
    known_cases: &[KnownCaseResult],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if uncertainty.relative_uncertainty > 0.3 {
        recommendations.push(
            "High uncertainty detected - consider additional temperature measurements".to_string(),
        );
    }

    if cross_validation.overall_confidence < 70.0 {
        recommendations.push("Low method agreement - interpret results with caution".to_string());
    }

    if !cross_validation.outlier_methods.is_empty() {
        let names: Vec<&str> = cross_validation
            .outlier_methods
            .iter()
            .map(|m| m.as_str())
            .collect();
        recommendations.push(format!("Outlier methods detected: {}", names.join(", ")));
    }

    if known_cases.iter().any(|c| c.relative_error > HIGH_CASE_ERROR) {
        recommendations.push(
            "High error in known case validation - method may be less reliable".to_string(),
        );
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::PmiMethod;
    use crate::stats::Interval;
    use crate::validation::cross_validation::AgreementMetrics;
    use std::collections::BTreeMap;

    fn uncertainty(relative: f64) -> UncertaintyAnalysis {
        UncertaintyAnalysis {
            base_pmi: 10.0,
            total_uncertainty: relative * 10.0,
            relative_uncertainty: relative,
            components: Vec::new(),
            confidence_95: Interval::new(0.0, 20.0),
            confidence_99: Interval::new(0.0, 20.0),
        }
    }

    fn cross(confidence: f64, outliers: Vec<PmiMethod>) -> CrossValidationResult {
        CrossValidationResult {
            method_agreement: AgreementMetrics {
                coefficient_of_variation: 0.0,
                range: 0.0,
                iqr: 0.0,
                mean_estimate: 10.0,
                std_estimate: 0.0,
            },
            method_estimates: BTreeMap::new(),
            consensus_estimate: 10.0,
            reliability_scores: BTreeMap::new(),
            outlier_methods: outliers,
            overall_confidence: confidence,
        }
    }

    fn case(error: f64, within: bool) -> KnownCaseResult {
        KnownCaseResult {
            case_name: "case".to_string(),
            published_pmi: 5.0,
            calculated_pmi: 5.0 * (1.0 + error),
            relative_error: error,
            within_confidence: within,
            notes: String::new(),
        }
    }

    #[test]
    fn test_score_without_known_cases() {
        // (100 - 10) * 0.6 + 60 * 0.4
        let score = validation_score(&uncertainty(0.35), &cross(60.0, Vec::new()), &[]);
        assert!((score - 78.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_with_known_cases() {
        let cases = vec![case(0.0, true), case(0.1, true)];
        // base 100*0.6 + 100*0.4 = 100; case score clamp(100 - 5 + 20) = 100
        let score = validation_score(&uncertainty(0.05), &cross(100.0, Vec::new()), &cases);
        assert!((score - 100.0).abs() < 1e-9);

        let bad = vec![case(0.5, false)];
        // 95*0.6 + 50*0.4 = 77; case score 50 → 77*0.7 + 50*0.3 = 68.9
        let score = validation_score(&uncertainty(0.2), &cross(50.0, Vec::new()), &bad);
        assert!((score - 68.9).abs() < 1e-9);
    }

    #[test]
    fn test_recommendations() {
        let recs = validation_recommendations(
            &uncertainty(0.4),
            &cross(60.0, vec![PmiMethod::DevelopmentRate, PmiMethod::AddOptimistic]),
            &[case(0.25, false)],
        );
        assert_eq!(recs.len(), 4);
        assert_eq!(
            recs[2],
            "Outlier methods detected: development_rate, add_optimistic"
        );

        let none = validation_recommendations(&uncertainty(0.1), &cross(90.0, Vec::new()), &[]);
        assert!(none.is_empty());
    }
}
