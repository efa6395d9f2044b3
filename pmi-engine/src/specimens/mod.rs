//! Multi-specimen analysis
//!
//! Estimates PMI for every specimen collected at one scene, scores each
//! specimen's data quality, detects conflicts between specimens and
//! reconciles them into a single consensus estimate.

pub mod conflicts;
pub mod quality_scorer;
pub mod reconciler;
pub mod statistics;

pub use conflicts::{Conflict, ConflictAnalysis, ConflictDetector, ConflictSeverity, ConflictType};
pub use quality_scorer::{
    DefaultQualityAssessor, QualityAssessment, QualityAssessor, QualityIssue, QualityRequest,
    ValidationLevel,
};
pub use reconciler::{ConsensusBasis, MultiSpecimenAnalyzer, SpecimenConsensus};
pub use statistics::SpecimenStatistics;

use crate::estimator::SingleMethodEstimate;
use pmi_common::{DataQuality, DevelopmentStage, Species};
use serde::{Deserialize, Serialize};

/// One collected specimen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenData {
    pub specimen_id: String,
    pub species: Species,
    pub stage: DevelopmentStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preservation_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SpecimenData {
    pub fn new(specimen_id: impl Into<String>, species: Species, stage: DevelopmentStage) -> Self {
        Self {
            specimen_id: specimen_id.into(),
            species,
            stage,
            length_mm: None,
            collection_location: None,
            collection_method: None,
            preservation_method: None,
            notes: None,
        }
    }

    pub fn with_length(mut self, length_mm: f64) -> Self {
        self.length_mm = Some(length_mm);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.collection_location = Some(location.into());
        self
    }
}

/// Case metadata carried alongside the specimens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investigator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Estimate and quality for one specimen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenResult {
    pub specimen: SpecimenData,
    pub pmi_days: f64,
    pub pmi_hours: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
    /// 0–100
    pub quality_score: f64,
    pub data_quality: DataQuality,
    pub calculation: SingleMethodEstimate,
    pub validation_warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSpecimenResult {
    pub case_info: CaseInfo,
    pub specimen_results: Vec<SpecimenResult>,
    pub consensus: SpecimenConsensus,
    pub statistics: SpecimenStatistics,
    pub conflicts: ConflictAnalysis,
    pub recommendations: Vec<String>,
    pub overall_quality: DataQuality,
    /// Score behind `overall_quality`, clamped to 0..100
    pub overall_quality_score: f64,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Result with a hand-set PMI and quality score
    pub(crate) fn specimen_result(
        id: &str,
        species: Species,
        stage: DevelopmentStage,
        pmi_days: f64,
        quality_score: f64,
    ) -> SpecimenResult {
        let calculation = SingleMethodEstimate {
            species,
            stage,
            pmi_days,
            pmi_hours: pmi_days * 24.0,
            confidence_low: pmi_days * 0.8,
            confidence_high: pmi_days * 1.2,
            accumulated_dd: 0.0,
            base_temp_c: 0.0,
            effective_temp_c: 0.0,
            below_base_temperature: false,
            warnings: Vec::new(),
        };
        SpecimenResult {
            specimen: SpecimenData::new(id, species, stage),
            pmi_days,
            pmi_hours: pmi_days * 24.0,
            confidence_low: pmi_days * 0.8,
            confidence_high: pmi_days * 1.2,
            quality_score,
            data_quality: DataQuality::from_score(quality_score),
            calculation,
            validation_warnings: Vec::new(),
        }
    }

    #[test]
    fn test_specimen_from_original_keys() {
        let specimen: SpecimenData = serde_json::from_str(
            r#"{"specimen_id": "L-01", "species": "lucilia_sericata", "stage": "3rd_instar", "length_mm": 16.5}"#,
        )
        .unwrap();
        assert_eq!(specimen.species, Species::LuciliaSericata);
        assert_eq!(specimen.stage, DevelopmentStage::ThirdInstar);
        assert_eq!(specimen.length_mm, Some(16.5));
        assert!(specimen.collection_location.is_none());
    }

    #[test]
    fn test_case_info_defaults() {
        let info: CaseInfo = serde_json::from_str(r#"{"case_id": "2024-117"}"#).unwrap();
        assert_eq!(info.case_id.as_deref(), Some("2024-117"));
        assert!(info.discovery_date.is_none());
        assert_eq!(serde_json::to_string(&CaseInfo::default()).unwrap(), "{}");
    }
}
