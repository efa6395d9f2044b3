//! Multi-method comparison
//!
//! Runs the requested methods, keeps the ones that succeed and derives the
//! consensus, agreement, reliability and recommendations from the surviving
//! estimates. Nothing here is cached: every call recomputes from its inputs.

use super::{MethodCalculator, PmiEstimate, PmiMethod};
use crate::config::EngineConfig;
use crate::stats;
use pmi_common::{
    development_threshold, DevelopmentStage, DevelopmentThreshold, Error, Result, Species,
    TemperatureReading,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A method that was requested but could not produce an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodFailure {
    pub method: PmiMethod,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMethod {
    SingleMethod,
    MultiMethodConsensus,
}

/// Reliability-weighted consensus over all successful methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusEstimate {
    pub method: ConsensusMethod,
    pub pmi_days: f64,
    pub pmi_hours: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods_used: Vec<PmiMethod>,
    #[serde(default)]
    pub reliability_weighted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementLevel {
    Excellent,
    Good,
    Moderate,
    Poor,
    SingleMethod,
}

impl AgreementLevel {
    /// Classify a coefficient of variation given in percent
    pub fn from_cv(cv_percent: f64) -> Self {
        if cv_percent < 10.0 {
            AgreementLevel::Excellent
        } else if cv_percent < 20.0 {
            AgreementLevel::Good
        } else if cv_percent < 35.0 {
            AgreementLevel::Moderate
        } else {
            AgreementLevel::Poor
        }
    }
}

/// Spread of the point estimates across methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodAgreement {
    pub level: AgreementLevel,
    /// Percent
    pub coefficient_of_variation: f64,
    pub mean_pmi: f64,
    pub std_deviation: f64,
    pub min_pmi: f64,
    pub max_pmi: f64,
    pub range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityAssessment {
    pub overall_reliability: f64,
    pub average_method_reliability: f64,
    pub temperature_suitability: f64,
    pub method_diversity_score: f64,
    pub method_count: usize,
    pub reliability_factors: Vec<String>,
}

/// Result of [`AlternativeMethodsEngine::calculate_all_methods`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeResult {
    pub species: Species,
    pub stage: DevelopmentStage,
    pub estimates: Vec<PmiEstimate>,
    #[serde(default)]
    pub failed_methods: Vec<MethodFailure>,
    pub consensus: ConsensusEstimate,
    pub agreement: MethodAgreement,
    pub reliability: ReliabilityAssessment,
    pub recommendations: Vec<String>,
}

impl ComparativeResult {
    pub fn estimate_for(&self, method: PmiMethod) -> Option<&PmiEstimate> {
        self.estimates.iter().find(|e| e.method == method)
    }
}

/// Runs several PMI methods side by side
#[derive(Debug, Clone, Default)]
pub struct AlternativeMethodsEngine {
    calculator: MethodCalculator,
}

impl AlternativeMethodsEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            calculator: MethodCalculator::new(config.methods.clone(), config.thermal.clone()),
        }
    }

    pub fn calculator(&self) -> &MethodCalculator {
        &self.calculator
    }

    /// Run `methods` (all seven when `None`) and summarize the successes
    ///
    /// Individual method failures are recorded in `failed_methods`; the call
    /// fails with [`Error::Aggregation`] only when no method succeeds.
    pub fn calculate_all_methods(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
        methods: Option<&[PmiMethod]>,
    ) -> Result<ComparativeResult> {
        temperature.ensure_finite()?;
        let threshold = development_threshold(species, stage)?;

        let requested: Vec<PmiMethod> = match methods {
            None => PmiMethod::ALL.to_vec(),
            Some(subset) => {
                let mut unique: Vec<PmiMethod> = Vec::with_capacity(subset.len());
                for method in subset {
                    if !unique.contains(method) {
                        unique.push(*method);
                    }
                }
                unique
            }
        };
        if requested.is_empty() {
            return Err(Error::InvalidInput(
                "At least one PMI method must be requested".to_string(),
            ));
        }

        let mut estimates = Vec::with_capacity(requested.len());
        let mut failed_methods = Vec::new();
        for method in requested {
            match self
                .calculator
                .calculate(method, threshold, temperature, length_mm)
            {
                Ok(estimate) => estimates.push(estimate),
                Err(e) => {
                    debug!("Method {} failed: {}", method, e);
                    failed_methods.push(MethodFailure {
                        method,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if estimates.is_empty() {
            return Err(Error::Aggregation(format!(
                "No PMI methods could be calculated for {} {} at {}°C",
                species, stage, temperature.avg_temp_c
            )));
        }

        let consensus = build_consensus(&estimates)?;
        let agreement = assess_agreement(&estimates);
        let reliability = assess_reliability(&estimates, threshold, temperature);
        let recommendations = recommendations(&estimates, &agreement, &reliability);

        info!(
            "Method comparison: {} {} methods={}/{} consensus={:.3}d agreement={:?} reliability={:.1}",
            species,
            stage,
            estimates.len(),
            estimates.len() + failed_methods.len(),
            consensus.pmi_days,
            agreement.level,
            reliability.overall_reliability
        );

        Ok(ComparativeResult {
            species,
            stage,
            estimates,
            failed_methods,
            consensus,
            agreement,
            reliability,
            recommendations,
        })
    }
}

/// Reliability-weighted consensus
///
/// A single estimate passes through unchanged. Otherwise the point estimate
/// is the reliability-weighted mean (equal weights when every score is zero)
/// and the band is the envelope of all bands.
pub fn build_consensus(estimates: &[PmiEstimate]) -> Result<ConsensusEstimate> {
    match estimates {
        [] => Err(Error::Aggregation(
            "Cannot build a consensus from zero estimates".to_string(),
        )),
        [only] => Ok(ConsensusEstimate {
            method: ConsensusMethod::SingleMethod,
            pmi_days: only.pmi_days,
            pmi_hours: only.pmi_hours,
            confidence_low: only.confidence_low,
            confidence_high: only.confidence_high,
            methods_used: vec![only.method],
            reliability_weighted: false,
        }),
        _ => {
            let total_weight: f64 = estimates.iter().map(|e| e.reliability_score).sum();
            let pmi_days = if total_weight > 0.0 {
                estimates
                    .iter()
                    .map(|e| e.pmi_days * e.reliability_score)
                    .sum::<f64>()
                    / total_weight
            } else {
                estimates.iter().map(|e| e.pmi_days).sum::<f64>() / estimates.len() as f64
            };

            let confidence_low = estimates
                .iter()
                .map(|e| e.confidence_low)
                .fold(f64::INFINITY, f64::min);
            let confidence_high = estimates
                .iter()
                .map(|e| e.confidence_high)
                .fold(f64::NEG_INFINITY, f64::max);

            Ok(ConsensusEstimate {
                method: ConsensusMethod::MultiMethodConsensus,
                pmi_days,
                pmi_hours: pmi_days * 24.0,
                confidence_low,
                confidence_high,
                methods_used: estimates.iter().map(|e| e.method).collect(),
                reliability_weighted: true,
            })
        }
    }
}

/// Coefficient of variation (population std) and spread across methods
pub fn assess_agreement(estimates: &[PmiEstimate]) -> MethodAgreement {
    if estimates.len() < 2 {
        let pmi = estimates.first().map(|e| e.pmi_days).unwrap_or(0.0);
        return MethodAgreement {
            level: AgreementLevel::SingleMethod,
            coefficient_of_variation: 0.0,
            mean_pmi: pmi,
            std_deviation: 0.0,
            min_pmi: pmi,
            max_pmi: pmi,
            range: 0.0,
        };
    }

    let values: Vec<f64> = estimates.iter().map(|e| e.pmi_days).collect();
    let mean_pmi = stats::mean(&values);
    let std_deviation = stats::population_std(&values);
    let cv = stats::coefficient_of_variation(std_deviation, mean_pmi) * 100.0;
    let min_pmi = stats::min(&values);
    let max_pmi = stats::max(&values);

    MethodAgreement {
        level: AgreementLevel::from_cv(cv),
        coefficient_of_variation: cv,
        mean_pmi,
        std_deviation,
        min_pmi,
        max_pmi,
        range: max_pmi - min_pmi,
    }
}

/// Overall reliability from method scores, temperature fit and method diversity
pub fn assess_reliability(
    estimates: &[PmiEstimate],
    threshold: &DevelopmentThreshold,
    temperature: &TemperatureReading,
) -> ReliabilityAssessment {
    let scores: Vec<f64> = estimates.iter().map(|e| e.reliability_score).collect();
    let average_method_reliability = stats::mean(&scores);

    let temp_optimal = threshold.base_temp_c + 15.0;
    let temperature_suitability =
        (100.0 - (temperature.avg_temp_c - temp_optimal).abs() * 2.0).clamp(0.0, 100.0);

    let mut distinct: Vec<PmiMethod> = estimates.iter().map(|e| e.method).collect();
    distinct.sort();
    distinct.dedup();
    let method_diversity_score = (distinct.len() as f64 * 5.0).min(20.0);

    let overall_reliability =
        (average_method_reliability + temperature_suitability + method_diversity_score) / 3.0;

    ReliabilityAssessment {
        overall_reliability,
        average_method_reliability,
        temperature_suitability,
        method_diversity_score,
        method_count: estimates.len(),
        reliability_factors: vec![
            format!("Average method reliability: {:.1}/100", average_method_reliability),
            format!("Temperature suitability: {:.1}/100", temperature_suitability),
            format!("Method diversity: {} methods", distinct.len()),
        ],
    }
}

/// Guidance derived from agreement and reliability, in a fixed order
pub fn recommendations(
    estimates: &[PmiEstimate],
    agreement: &MethodAgreement,
    reliability: &ReliabilityAssessment,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    match agreement.level {
        AgreementLevel::Poor => {
            recommendations.push(format!(
                "Poor method agreement (CV: {:.1}%) - interpret results with caution",
                agreement.coefficient_of_variation
            ));
            recommendations.push(
                "Consider environmental factors that may affect different methods differently"
                    .to_string(),
            );
        }
        AgreementLevel::Excellent => {
            recommendations.push(format!(
                "Excellent method agreement (CV: {:.1}%) - high confidence in results",
                agreement.coefficient_of_variation
            ));
        }
        _ => {}
    }

    if reliability.overall_reliability < 60.0 {
        recommendations
            .push("Low overall reliability - collect additional data if possible".to_string());
    }

    if reliability.temperature_suitability < 70.0 {
        recommendations
            .push("Temperature conditions are suboptimal for accurate PMI estimation".to_string());
    }

    // First occurrence wins on ties
    let mut best: Option<&PmiEstimate> = None;
    let mut worst: Option<&PmiEstimate> = None;
    for estimate in estimates {
        if best.map_or(true, |b| estimate.reliability_score > b.reliability_score) {
            best = Some(estimate);
        }
        if worst.map_or(true, |w| estimate.reliability_score < w.reliability_score) {
            worst = Some(estimate);
        }
    }
    if let (Some(best), Some(worst)) = (best, worst) {
        if best.reliability_score - worst.reliability_score > 30.0 {
            recommendations.push(format!(
                "Prioritize {} method (reliability: {:.0}/100)",
                best.method, best.reliability_score
            ));
        }
    }

    if agreement.range > agreement.mean_pmi * 0.5 {
        recommendations.push(format!(
            "Large PMI range ({:.1} days) indicates significant uncertainty",
            agreement.range
        ));
    }

    recommendations
}
