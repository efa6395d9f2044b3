//! Alternative PMI estimation methods
//!
//! Seven independent strategies over the same inputs, each with its own
//! physical assumptions, confidence width and reliability weight. The
//! [`AlternativeMethodsEngine`] runs a set of them, keeps the successes and
//! summarizes consensus, agreement and reliability.

mod calculators;
mod comparison;

pub use calculators::MethodCalculator;
pub use comparison::{
    assess_agreement, assess_reliability, build_consensus, recommendations, AgreementLevel,
    AlternativeMethodsEngine, ComparativeResult, ConsensusEstimate, ConsensusMethod,
    MethodAgreement, MethodFailure, ReliabilityAssessment,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Estimation method identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PmiMethod {
    /// Standard accumulated degree days
    AddStandard,
    /// Fastest plausible development (minimum PMI)
    AddOptimistic,
    /// Slowest plausible development (maximum PMI)
    AddConservative,
    /// Accumulated degree hours
    AdhMethod,
    /// Length-based (isomegalen diagram)
    IsomegalenMethod,
    /// Non-linear thermal summation
    ThermalSummation,
    /// Linear development-rate model
    DevelopmentRate,
}

impl PmiMethod {
    pub const ALL: [PmiMethod; 7] = [
        PmiMethod::AddStandard,
        PmiMethod::AddOptimistic,
        PmiMethod::AddConservative,
        PmiMethod::AdhMethod,
        PmiMethod::IsomegalenMethod,
        PmiMethod::ThermalSummation,
        PmiMethod::DevelopmentRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PmiMethod::AddStandard => "add_standard",
            PmiMethod::AddOptimistic => "add_optimistic",
            PmiMethod::AddConservative => "add_conservative",
            PmiMethod::AdhMethod => "adh_method",
            PmiMethod::IsomegalenMethod => "isomegalen_method",
            PmiMethod::ThermalSummation => "thermal_summation",
            PmiMethod::DevelopmentRate => "development_rate",
        }
    }

    /// Human-readable method name
    pub fn label(&self) -> &'static str {
        match self {
            PmiMethod::AddStandard => "Accumulated Degree Days",
            PmiMethod::AddOptimistic => "Optimistic ADD (Minimum PMI)",
            PmiMethod::AddConservative => "Conservative ADD (Maximum PMI)",
            PmiMethod::AdhMethod => "Accumulated Degree Hours",
            PmiMethod::IsomegalenMethod => "Isomegalen Diagram (Length-based)",
            PmiMethod::ThermalSummation => "Non-linear Thermal Summation",
            PmiMethod::DevelopmentRate => "Development Rate Modeling",
        }
    }
}

impl fmt::Display for PmiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PMI estimate produced by one method
///
/// Invariants: `0 ≤ confidence_low ≤ pmi_days ≤ confidence_high` and
/// `pmi_hours == pmi_days × 24`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmiEstimate {
    pub method: PmiMethod,
    pub pmi_days: f64,
    pub pmi_hours: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
    /// 0–100
    pub reliability_score: f64,
    pub assumptions: Vec<String>,
    pub limitations: Vec<String>,
    /// Method-specific intermediate values
    pub calculation_details: BTreeMap<String, serde_json::Value>,
}

impl PmiEstimate {
    /// Build an estimate with a symmetric band of `confidence_fraction × pmi_days`
    pub fn from_days(
        method: PmiMethod,
        pmi_days: f64,
        confidence_fraction: f64,
        reliability_score: f64,
    ) -> Self {
        let range = pmi_days * confidence_fraction;
        Self {
            method,
            pmi_days,
            pmi_hours: pmi_days * 24.0,
            confidence_low: (pmi_days - range).max(0.0),
            confidence_high: pmi_days + range,
            reliability_score: reliability_score.clamp(0.0, 100.0),
            assumptions: Vec::new(),
            limitations: Vec::new(),
            calculation_details: BTreeMap::new(),
        }
    }

    pub fn with_notes(mut self, assumptions: &[&str], limitations: &[&str]) -> Self {
        self.assumptions = assumptions.iter().map(|s| s.to_string()).collect();
        self.limitations = limitations.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.calculation_details.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serde_names_match_as_str() {
        for method in PmiMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn test_from_days_band() {
        let estimate = PmiEstimate::from_days(PmiMethod::AddStandard, 10.0, 0.2, 100.0);
        assert_eq!(estimate.pmi_hours, 240.0);
        assert_eq!(estimate.confidence_low, 8.0);
        assert_eq!(estimate.confidence_high, 12.0);
    }

    #[test]
    fn test_from_days_clamps_low_and_score() {
        let estimate = PmiEstimate::from_days(PmiMethod::AddStandard, 1.0, 1.5, 140.0);
        assert_eq!(estimate.confidence_low, 0.0);
        assert_eq!(estimate.reliability_score, 100.0);
    }

    #[test]
    fn test_details_are_recorded() {
        let estimate = PmiEstimate::from_days(PmiMethod::AdhMethod, 2.0, 0.18, 90.0)
            .with_detail("hourly_precision", true)
            .with_detail("adh_required", 1872.0);
        assert_eq!(
            estimate.calculation_details.get("hourly_precision"),
            Some(&serde_json::Value::Bool(true))
        );
        assert_eq!(estimate.calculation_details.len(), 2);
    }
}
