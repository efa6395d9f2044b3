//! Multi-specimen reconciliation
//!
//! # Algorithm
//! 1. Single-method estimate and quality assessment per specimen
//! 2. Statistics over PMI and quality
//! 3. Conflict detection
//! 4. Consensus: pass-through for one specimen, quality-weighted average
//!    when conflicts are moderate or severe, otherwise the median with the
//!    widest confidence envelope
//! 5. Recommendations and overall quality tier

use super::conflicts::{ConflictAnalysis, ConflictDetector, ConflictSeverity, ConflictType};
use super::quality_scorer::{DefaultQualityAssessor, QualityAssessor, QualityRequest};
use super::statistics::SpecimenStatistics;
use super::{CaseInfo, MultiSpecimenResult, SpecimenData, SpecimenResult};
use crate::config::{EngineConfig, SpecimenConfig};
use crate::estimator::PmiEstimator;
use crate::stats;
use pmi_common::{DataQuality, Error, Result, TemperatureReading};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// PMI coefficient of variation (%) above which variability is flagged
const HIGH_VARIABILITY_CV: f64 = 30.0;

/// Species count above which colonization history is questioned
const HIGH_SPECIES_DIVERSITY: usize = 2;

/// Sample size that earns the overall quality bonus
const GOOD_SAMPLE_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusBasis {
    SingleSpecimen,
    QualityWeightedAverage,
    StatisticalConsensus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenConsensus {
    pub method: ConsensusBasis,
    pub pmi_days: f64,
    pub pmi_hours: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
    /// Human-readable description of how the consensus was formed
    pub basis: String,
}

/// Analyzer for specimens from one scene
#[derive(Debug, Clone)]
pub struct MultiSpecimenAnalyzer<Q = DefaultQualityAssessor> {
    estimator: PmiEstimator,
    assessor: Q,
    detector: ConflictDetector,
    config: SpecimenConfig,
}

impl Default for MultiSpecimenAnalyzer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl MultiSpecimenAnalyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_assessor(config, DefaultQualityAssessor::default())
    }
}

impl<Q: QualityAssessor> MultiSpecimenAnalyzer<Q> {
    /// Analyzer with a custom quality assessor
    pub fn with_assessor(config: &EngineConfig, assessor: Q) -> Self {
        Self {
            estimator: PmiEstimator::new(&config.estimator),
            assessor,
            detector: ConflictDetector::new(&config.specimens),
            config: config.specimens.clone(),
        }
    }

    pub fn analyze_specimens(
        &self,
        specimens: &[SpecimenData],
        temperature: &TemperatureReading,
        case_info: &CaseInfo,
    ) -> Result<MultiSpecimenResult> {
        if specimens.is_empty() {
            return Err(Error::InvalidInput(
                "At least one specimen must be provided".to_string(),
            ));
        }

        let specimen_results = specimens
            .iter()
            .map(|specimen| self.analyze_single_specimen(specimen, temperature, case_info))
            .collect::<Result<Vec<_>>>()?;

        let statistics = SpecimenStatistics::from_results(&specimen_results);
        let conflicts = self.detector.detect(&specimen_results);
        let consensus = consensus(&specimen_results, &conflicts);
        let recommendations =
            recommendations(&specimen_results, &conflicts, &statistics, &self.config);
        let overall_quality_score = overall_quality_score(&specimen_results, &conflicts);
        let overall_quality = DataQuality::from_score(overall_quality_score);

        info!(
            "Multi-specimen analysis: {} specimen(s), consensus={:.2}d ({:?}), conflicts={}, quality={}",
            specimen_results.len(),
            consensus.pmi_days,
            consensus.method,
            conflicts.severity,
            overall_quality
        );

        Ok(MultiSpecimenResult {
            case_info: case_info.clone(),
            specimen_results,
            consensus,
            statistics,
            conflicts,
            recommendations,
            overall_quality,
            overall_quality_score,
        })
    }

    fn analyze_single_specimen(
        &self,
        specimen: &SpecimenData,
        temperature: &TemperatureReading,
        case_info: &CaseInfo,
    ) -> Result<SpecimenResult> {
        let estimate = self.estimator.estimate(
            specimen.species,
            specimen.stage,
            temperature,
            specimen.length_mm,
        )?;

        let location = specimen
            .collection_location
            .as_deref()
            .or(temperature.location.as_deref())
            .or(case_info.location.as_deref());

        let assessment = self.assessor.assess(&QualityRequest {
            specimen_id: &specimen.specimen_id,
            species: specimen.species,
            stage: specimen.stage,
            location,
            discovery_date: case_info.discovery_date.as_deref(),
            length_mm: specimen.length_mm,
            temperature,
            estimate: Some(&estimate),
        });

        debug!(
            "Specimen {}: pmi={:.2}d quality={:.1}",
            specimen.specimen_id, estimate.pmi_days, assessment.quality_score
        );

        let mut validation_warnings = estimate.warnings.clone();
        validation_warnings.extend(assessment.warnings);

        Ok(SpecimenResult {
            specimen: specimen.clone(),
            pmi_days: estimate.pmi_days,
            pmi_hours: estimate.pmi_hours,
            confidence_low: estimate.confidence_low,
            confidence_high: estimate.confidence_high,
            quality_score: assessment.quality_score,
            data_quality: assessment.data_quality,
            calculation: estimate,
            validation_warnings,
        })
    }
}

/// Reconcile specimen results into one estimate
///
/// `results` must not be empty.
pub fn consensus(results: &[SpecimenResult], conflicts: &ConflictAnalysis) -> SpecimenConsensus {
    if let [result] = results {
        return SpecimenConsensus {
            method: ConsensusBasis::SingleSpecimen,
            pmi_days: result.pmi_days,
            pmi_hours: result.pmi_hours,
            confidence_low: result.confidence_low,
            confidence_high: result.confidence_high,
            basis: format!(
                "Single specimen: {} {}",
                result.specimen.species, result.specimen.stage
            ),
        };
    }

    if conflicts.severity >= ConflictSeverity::Moderate {
        quality_weighted_consensus(results)
    } else {
        statistical_consensus(results)
    }
}

fn quality_weighted_consensus(results: &[SpecimenResult]) -> SpecimenConsensus {
    let mut weights: Vec<f64> = results.iter().map(|r| r.quality_score).collect();
    let mut total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        weights = vec![1.0; results.len()];
        total_weight = results.len() as f64;
    }

    let (mut pmi_sum, mut low_sum, mut high_sum) = (0.0, 0.0, 0.0);
    for (result, weight) in results.iter().zip(&weights) {
        pmi_sum += result.pmi_days * weight;
        low_sum += result.confidence_low * weight;
        high_sum += result.confidence_high * weight;
    }

    let pmi_days = pmi_sum / total_weight;
    SpecimenConsensus {
        method: ConsensusBasis::QualityWeightedAverage,
        pmi_days,
        pmi_hours: pmi_days * 24.0,
        confidence_low: low_sum / total_weight,
        confidence_high: high_sum / total_weight,
        basis: format!("Quality-weighted average of {} specimens", results.len()),
    }
}

fn statistical_consensus(results: &[SpecimenResult]) -> SpecimenConsensus {
    let pmi_values: Vec<f64> = results.iter().map(|r| r.pmi_days).collect();
    let lows: Vec<f64> = results.iter().map(|r| r.confidence_low).collect();
    let highs: Vec<f64> = results.iter().map(|r| r.confidence_high).collect();

    let pmi_days = stats::median(&pmi_values);
    SpecimenConsensus {
        method: ConsensusBasis::StatisticalConsensus,
        pmi_days,
        pmi_hours: pmi_days * 24.0,
        confidence_low: stats::min(&lows),
        confidence_high: stats::max(&highs),
        basis: format!("Statistical consensus of {} specimens", results.len()),
    }
}

pub fn recommendations(
    results: &[SpecimenResult],
    conflicts: &ConflictAnalysis,
    statistics: &SpecimenStatistics,
    config: &SpecimenConfig,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if conflicts.contains(ConflictType::SpeciesDisagreement) {
        recommendations.push(
            "Multiple species present - verify species identifications with morphological keys"
                .to_string(),
        );
        recommendations.push("Consider separate PMI estimates for each species".to_string());
    }

    if conflicts.contains(ConflictType::StageInconsistency) {
        recommendations
            .push("Inconsistent development stages suggest complex taphonomic history".to_string());
        recommendations.push(
            "Investigate environmental factors that may affect development rates".to_string(),
        );
    }

    if conflicts.contains(ConflictType::PmiRangeConflict) {
        recommendations.push(format!(
            "Large PMI range ({:.1} days) - prioritize highest quality specimens",
            statistics.pmi_range
        ));
        recommendations.push("Consider microenvironmental differences within the scene".to_string());
    }

    if statistics.specimen_count < config.min_recommended_specimens {
        recommendations
            .push("Limited sample size - collect additional specimens if possible".to_string());
    }

    if statistics.pmi_cv > HIGH_VARIABILITY_CV {
        recommendations.push(format!(
            "High variability in PMI estimates (CV: {:.1}%) - exercise caution in interpretation",
            statistics.pmi_cv
        ));
    }

    let low_quality = results
        .iter()
        .filter(|r| r.quality_score < config.low_quality_threshold)
        .count();
    if low_quality > 0 {
        recommendations.push(format!(
            "{} specimen(s) have low quality scores - review validation warnings",
            low_quality
        ));
    }

    if statistics.species_diversity > HIGH_SPECIES_DIVERSITY {
        recommendations.push(
            "High species diversity may indicate extended PMI or multiple colonization events"
                .to_string(),
        );
    }

    recommendations
}

/// Mean specimen quality less the conflict penalty, plus a sample size bonus
pub fn overall_quality_score(results: &[SpecimenResult], conflicts: &ConflictAnalysis) -> f64 {
    let scores: Vec<f64> = results.iter().map(|r| r.quality_score).collect();
    let mut score = stats::mean(&scores) - conflicts.severity.quality_penalty();
    if results.len() >= GOOD_SAMPLE_SIZE {
        score += 10.0;
    }
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specimens::tests::specimen_result;
    use pmi_common::{DevelopmentStage, Species};

    #[test]
    fn test_empty_specimen_list_rejected() {
        let analyzer = MultiSpecimenAnalyzer::new(&EngineConfig::default());
        let result = analyzer.analyze_specimens(
            &[],
            &TemperatureReading::new(25.0),
            &CaseInfo::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_single_specimen_passes_through() {
        let analyzer = MultiSpecimenAnalyzer::new(&EngineConfig::default());
        let specimens = vec![SpecimenData::new(
            "S1",
            Species::LuciliaSericata,
            DevelopmentStage::ThirdInstar,
        )];
        let result = analyzer
            .analyze_specimens(&specimens, &TemperatureReading::new(25.0), &CaseInfo::default())
            .unwrap();

        assert_eq!(result.consensus.method, ConsensusBasis::SingleSpecimen);
        assert!((result.consensus.pmi_days - 78.0 / 17.0).abs() < 1e-12);
        assert_eq!(
            result.consensus.basis,
            "Single specimen: lucilia_sericata 3rd_instar"
        );
        assert!(!result.conflicts.has_conflicts);
        assert_eq!(
            result.recommendations,
            vec!["Limited sample size - collect additional specimens if possible"]
        );
    }

    #[test]
    fn test_statistical_consensus_uses_median_and_envelope() {
        let results = vec![
            specimen_result("A", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 4.0, 90.0),
            specimen_result("B", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 4.2, 90.0),
            specimen_result("C", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 4.4, 90.0),
        ];
        let analysis = ConflictDetector::default().detect(&results);
        assert_eq!(analysis.severity, ConflictSeverity::None);

        let consensus = consensus(&results, &analysis);
        assert_eq!(consensus.method, ConsensusBasis::StatisticalConsensus);
        assert_eq!(consensus.pmi_days, 4.2);
        assert!((consensus.confidence_low - 3.2).abs() < 1e-12);
        assert!((consensus.confidence_high - 4.4 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_consensus_with_zero_quality_uses_equal_weights() {
        let results = vec![
            specimen_result("A", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 2.0, 0.0),
            specimen_result("B", Species::CalliphoraVicina, DevelopmentStage::ThirdInstar, 6.0, 0.0),
        ];
        let analysis = ConflictDetector::default().detect(&results);
        let consensus = consensus(&results, &analysis);
        assert_eq!(consensus.method, ConsensusBasis::QualityWeightedAverage);
        assert_eq!(consensus.pmi_days, 4.0);
        assert_eq!(consensus.pmi_hours, 96.0);
    }

    #[test]
    fn test_overall_quality_score() {
        let results = vec![
            specimen_result("A", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 4.0, 85.0),
            specimen_result("B", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 4.1, 85.0),
            specimen_result("C", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 4.2, 85.0),
        ];
        let none = ConflictAnalysis::none();
        assert_eq!(overall_quality_score(&results, &none), 95.0);

        let severe = ConflictAnalysis {
            severity: ConflictSeverity::Severe,
            ..ConflictAnalysis::none()
        };
        assert_eq!(overall_quality_score(&results[..2], &severe), 55.0);
    }

    #[test]
    fn test_recommendations_for_mixed_scene() {
        let results = vec![
            specimen_result("A", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 2.0, 95.0),
            specimen_result("B", Species::CalliphoraVicina, DevelopmentStage::ThirdInstar, 6.0, 50.0),
            specimen_result("C", Species::PhormiaRegina, DevelopmentStage::SecondInstar, 4.0, 90.0),
        ];
        let analysis = ConflictDetector::default().detect(&results);
        let statistics = SpecimenStatistics::from_results(&results);
        let recs = recommendations(&results, &analysis, &statistics, &SpecimenConfig::default());

        assert_eq!(
            recs,
            vec![
                "Multiple species present - verify species identifications with morphological keys",
                "Consider separate PMI estimates for each species",
                "Large PMI range (4.0 days) - prioritize highest quality specimens",
                "Consider microenvironmental differences within the scene",
                "High variability in PMI estimates (CV: 50.0%) - exercise caution in interpretation",
                "1 specimen(s) have low quality scores - review validation warnings",
                "High species diversity may indicate extended PMI or multiple colonization events",
            ]
        );
    }
}
