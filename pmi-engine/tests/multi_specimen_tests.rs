//! Integration tests for multi-specimen reconciliation

use chrono::NaiveDate;
use pmi_common::{DataQuality, DevelopmentStage, Species, TemperatureReading};
use pmi_engine::specimens::{
    CaseInfo, ConflictSeverity, ConflictType, ConsensusBasis, DefaultQualityAssessor,
    QualityAssessment, QualityAssessor, QualityRequest,
};
use pmi_engine::{EngineConfig, MultiSpecimenAnalyzer, SpecimenData};

/// Scores specimen "A" at 90 and everything else at 10
struct FixedAssessor;

impl QualityAssessor for FixedAssessor {
    fn assess(&self, request: &QualityRequest<'_>) -> QualityAssessment {
        let quality_score = if request.specimen_id == "A" { 90.0 } else { 10.0 };
        QualityAssessment {
            quality_score,
            data_quality: DataQuality::from_score(quality_score),
            ..QualityAssessment::default()
        }
    }
}

fn analyzer() -> MultiSpecimenAnalyzer {
    MultiSpecimenAnalyzer::new(&EngineConfig::default())
}

#[test]
fn test_quality_weighted_consensus_for_mixed_species() {
    let analyzer = MultiSpecimenAnalyzer::with_assessor(&EngineConfig::default(), FixedAssessor);
    let specimens = vec![
        SpecimenData::new("A", Species::LuciliaSericata, DevelopmentStage::ThirdInstar),
        SpecimenData::new("B", Species::CalliphoraVicina, DevelopmentStage::ThirdInstar),
    ];
    let result = analyzer
        .analyze_specimens(&specimens, &TemperatureReading::new(25.0), &CaseInfo::default())
        .unwrap();

    let sericata = 78.0 / 17.0;
    let vicina = 93.0 / 19.0;
    let expected = (sericata * 90.0 + vicina * 10.0) / 100.0;

    assert_eq!(result.consensus.method, ConsensusBasis::QualityWeightedAverage);
    assert!((result.consensus.pmi_days - expected).abs() < 1e-9);
    assert!((result.consensus.pmi_hours - expected * 24.0).abs() < 1e-9);
    assert!(result.conflicts.contains(ConflictType::SpeciesDisagreement));
    assert!(result.conflicts.contains(ConflictType::QualityDisparity));
    assert_eq!(result.conflicts.severity, ConflictSeverity::Moderate);
    assert_eq!(
        result.consensus.basis,
        "Quality-weighted average of 2 specimens"
    );
}

#[test]
fn test_first_instar_and_pupa_are_inconsistent() {
    let specimens = vec![
        SpecimenData::new("L1", Species::LuciliaSericata, DevelopmentStage::FirstInstar),
        SpecimenData::new("P1", Species::LuciliaSericata, DevelopmentStage::Pupa),
    ];
    let result = analyzer()
        .analyze_specimens(&specimens, &TemperatureReading::new(25.0), &CaseInfo::default())
        .unwrap();

    assert!(result.conflicts.contains(ConflictType::StageInconsistency));
    assert_eq!(result.conflicts.severity, ConflictSeverity::Severe);
    assert!(result
        .recommendations
        .iter()
        .any(|r| r == "Inconsistent development stages suggest complex taphonomic history"));
}

#[test]
fn test_adjacent_instars_are_consistent() {
    let specimens = vec![
        SpecimenData::new("L1", Species::LuciliaSericata, DevelopmentStage::FirstInstar),
        SpecimenData::new("L2", Species::LuciliaSericata, DevelopmentStage::SecondInstar),
    ];
    let result = analyzer()
        .analyze_specimens(&specimens, &TemperatureReading::new(25.0), &CaseInfo::default())
        .unwrap();

    assert!(!result.conflicts.contains(ConflictType::StageInconsistency));
    assert_eq!(result.statistics.stage_diversity, 2);
}

#[test]
fn test_consistent_scene_uses_statistical_consensus() {
    let specimens = vec![
        SpecimenData::new("A", Species::LuciliaSericata, DevelopmentStage::ThirdInstar).with_length(16.0),
        SpecimenData::new("B", Species::LuciliaSericata, DevelopmentStage::ThirdInstar).with_length(17.0),
        SpecimenData::new("C", Species::LuciliaSericata, DevelopmentStage::ThirdInstar).with_length(18.5),
    ];
    let case_info = CaseInfo {
        case_id: Some("2024-031".to_string()),
        discovery_date: Some("2024-06-15".to_string()),
        location: Some("Leeds, UK".to_string()),
        ..CaseInfo::default()
    };
    let analyzer = MultiSpecimenAnalyzer::with_assessor(
        &EngineConfig::default(),
        DefaultQualityAssessor::with_reference_date(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()),
    );
    let result = analyzer
        .analyze_specimens(&specimens, &TemperatureReading::new(25.0), &case_info)
        .unwrap();

    // Every length is within 0.8..1.2 of the typical 17 mm, so all estimates match
    assert!(!result.conflicts.has_conflicts);
    assert_eq!(result.consensus.method, ConsensusBasis::StatisticalConsensus);
    assert!((result.consensus.pmi_days - 78.0 / 17.0).abs() < 1e-9);
    assert_eq!(result.overall_quality, DataQuality::Excellent);
    assert_eq!(result.case_info.case_id.as_deref(), Some("2024-031"));
    assert!(result.recommendations.is_empty());
}

#[test]
fn test_below_base_specimen_is_low_quality() {
    let specimens = vec![SpecimenData::new(
        "COLD",
        Species::LuciliaSericata,
        DevelopmentStage::ThirdInstar,
    )];
    let result = analyzer()
        .analyze_specimens(&specimens, &TemperatureReading::new(8.0), &CaseInfo::default())
        .unwrap();

    let specimen = &result.specimen_results[0];
    assert!(specimen.calculation.below_base_temperature);
    assert!(specimen.quality_score < 70.0);
    assert!(specimen
        .validation_warnings
        .iter()
        .any(|w| w.starts_with("CRITICAL:")));
    assert!(result
        .recommendations
        .contains(&"1 specimen(s) have low quality scores - review validation warnings".to_string()));
}
