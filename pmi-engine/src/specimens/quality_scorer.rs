//! Specimen data quality assessment
//!
//! Scores the inputs and (optionally) the single-method result of one
//! specimen on a 0–100 scale. Every check deducts from a starting score of
//! 100; a few favourable conditions add a small bonus. The score never
//! leaves 0..100.
//!
//! # Checks
//! - Species and stage: limited reference data, pupal uncertainty
//! - Location and discovery date, when supplied
//! - Specimen length against the stage's typical range
//! - Temperature against realistic and species-specific ranges
//! - Result plausibility and internal consistency
//! - Method accuracy for the temperature regime, species and stage

use crate::estimator::SingleMethodEstimate;
use chrono::{Duration, NaiveDate, Utc};
use pmi_common::{development_threshold, DataQuality, DevelopmentStage, Species, TemperatureReading};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Severity of a quality finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Info => "info",
            ValidationLevel::Warning => "warning",
            ValidationLevel::Error => "error",
            ValidationLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub level: ValidationLevel,
    pub category: String,
    pub message: String,
    pub score_impact: f64,
}

/// Inputs to a quality assessment
#[derive(Debug, Clone, Copy)]
pub struct QualityRequest<'a> {
    pub specimen_id: &'a str,
    pub species: Species,
    pub stage: DevelopmentStage,
    pub location: Option<&'a str>,
    /// `YYYY-MM-DD`
    pub discovery_date: Option<&'a str>,
    pub length_mm: Option<f64>,
    pub temperature: &'a TemperatureReading,
    /// Result to check for plausibility, when already computed
    pub estimate: Option<&'a SingleMethodEstimate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// 0–100
    pub quality_score: f64,
    pub data_quality: DataQuality,
    pub issues: Vec<QualityIssue>,
    /// `"LEVEL: message"` for every finding at warning level or above
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub accuracy_factors: Vec<String>,
}

impl Default for QualityAssessment {
    fn default() -> Self {
        Self {
            quality_score: 100.0,
            data_quality: DataQuality::Excellent,
            issues: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
            accuracy_factors: Vec::new(),
        }
    }
}

impl QualityAssessment {
    fn add_issue(
        &mut self,
        level: ValidationLevel,
        category: &str,
        message: String,
        score_impact: f64,
        recommendation: Option<&str>,
    ) {
        if level >= ValidationLevel::Warning {
            self.warnings
                .push(format!("{}: {}", level.as_str().to_uppercase(), message));
        }
        if let Some(recommendation) = recommendation {
            self.recommendations.push(recommendation.to_string());
        }
        self.issues.push(QualityIssue {
            level,
            category: category.to_string(),
            message,
            score_impact,
        });
        self.adjust(-score_impact);
    }

    fn adjust(&mut self, delta: f64) {
        self.quality_score = (self.quality_score + delta).clamp(0.0, 100.0);
        self.data_quality = DataQuality::from_score(self.quality_score);
    }
}

/// Scores one specimen's data quality
pub trait QualityAssessor {
    fn assess(&self, request: &QualityRequest<'_>) -> QualityAssessment;
}

/// Optimal development range (°C) for species with good reference data
fn species_temperature_range(species: Species) -> Option<(f64, f64)> {
    match species {
        Species::ChrysomyaRufifacies => Some((15.0, 40.0)),
        Species::LuciliaSericata => Some((8.0, 35.0)),
        Species::CalliphoraVicina => Some((5.0, 30.0)),
        Species::CochliomyiaMacellaria => Some((12.0, 38.0)),
        Species::PhormiaRegina => Some((5.0, 32.0)),
        Species::SarcophagaBullata => Some((9.0, 35.0)),
        Species::SarcophagaCrassipalpis => Some((8.0, 33.0)),
        Species::SarcophagaHaemorrhoidalis => Some((9.0, 36.0)),
        Species::BoettcheriscaPeregrina => Some((11.0, 38.0)),
        _ => None,
    }
}

/// Plausible PMI (days) per stage
fn stage_pmi_range(stage: DevelopmentStage) -> (f64, f64) {
    match stage {
        DevelopmentStage::FirstInstar => (0.5, 5.0),
        DevelopmentStage::SecondInstar => (1.0, 8.0),
        DevelopmentStage::ThirdInstar => (2.0, 25.0),
        DevelopmentStage::Pupa => (5.0, 120.0),
    }
}

/// Typical specimen length (mm) per stage; puparium length for pupae
fn stage_length_range(stage: DevelopmentStage) -> (f64, f64) {
    match stage {
        DevelopmentStage::FirstInstar => (3.0, 12.0),
        DevelopmentStage::SecondInstar => (8.0, 18.0),
        DevelopmentStage::ThirdInstar => (12.0, 22.0),
        DevelopmentStage::Pupa => (8.0, 15.0),
    }
}

fn is_well_studied(species: Species) -> bool {
    matches!(species, Species::LuciliaSericata | Species::CalliphoraVicina)
}

/// Rule-based assessor
#[derive(Debug, Clone, Default)]
pub struct DefaultQualityAssessor {
    /// Date that counts as "today" for date checks; the current UTC date when unset
    reference_date: Option<NaiveDate>,
}

impl DefaultQualityAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_date(reference_date: NaiveDate) -> Self {
        Self {
            reference_date: Some(reference_date),
        }
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    fn check_species_stage(&self, result: &mut QualityAssessment, species: Species, stage: DevelopmentStage) {
        if species_temperature_range(species).is_none() {
            result.add_issue(
                ValidationLevel::Warning,
                "species",
                format!("Limited data available for {}", species),
                10.0,
                Some("Verify species identification with morphological keys"),
            );
        }

        if stage == DevelopmentStage::Pupa {
            result.add_issue(
                ValidationLevel::Info,
                "stage",
                "Pupal stage PMI estimates have higher uncertainty".to_string(),
                5.0,
                Some("Consider using pre-pupal stage specimens if available"),
            );
        }
    }

    fn check_location(&self, result: &mut QualityAssessment, location: &str) {
        if location.trim().chars().count() < 3 {
            result.add_issue(
                ValidationLevel::Error,
                "location",
                "Location must be specified with at least 3 characters".to_string(),
                20.0,
                Some("Provide city, state/province, and country for accurate weather data"),
            );
        }

        if !location.chars().any(|c| c.is_ascii_alphabetic()) {
            result.add_issue(
                ValidationLevel::Warning,
                "location",
                "Location should contain alphabetic characters".to_string(),
                5.0,
                None,
            );
        }
    }

    fn check_date(&self, result: &mut QualityAssessment, date: &str) {
        let parsed = match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
            Ok(parsed) => parsed,
            Err(_) => {
                result.add_issue(
                    ValidationLevel::Error,
                    "date",
                    "Invalid date format (should be YYYY-MM-DD)".to_string(),
                    20.0,
                    Some("Use standard date format (e.g., 2024-06-15)"),
                );
                return;
            }
        };

        let today = self.today();
        if parsed > today {
            result.add_issue(
                ValidationLevel::Error,
                "date",
                "Discovery date cannot be in the future".to_string(),
                25.0,
                Some("Verify discovery date is correct"),
            );
        }
        if parsed < today - Duration::days(730) {
            result.add_issue(
                ValidationLevel::Warning,
                "date",
                "Discovery date is more than 2 years ago".to_string(),
                5.0,
                Some("Ensure historical weather data is available for this date"),
            );
        }
    }

    fn check_length(&self, result: &mut QualityAssessment, length: f64, stage: DevelopmentStage) {
        if length <= 0.0 || !length.is_finite() {
            result.add_issue(
                ValidationLevel::Error,
                "specimen",
                "Specimen length must be positive".to_string(),
                15.0,
                None,
            );
            return;
        }

        if length > 50.0 {
            result.add_issue(
                ValidationLevel::Warning,
                "specimen",
                format!("Specimen length ({}mm) seems unusually large", length),
                10.0,
                Some("Verify measurement is in millimeters, not centimeters"),
            );
            return;
        }

        let (min_len, max_len) = stage_length_range(stage);
        if length < min_len * 0.5 {
            result.add_issue(
                ValidationLevel::Warning,
                "specimen",
                format!("Specimen length ({}mm) is smaller than typical for {}", length, stage),
                8.0,
                Some("Verify development stage identification"),
            );
        } else if length > max_len * 1.5 {
            result.add_issue(
                ValidationLevel::Warning,
                "specimen",
                format!("Specimen length ({}mm) is larger than typical for {}", length, stage),
                8.0,
                Some("Verify development stage identification"),
            );
        } else {
            result.adjust(5.0);
        }
    }

    fn check_temperature(&self, result: &mut QualityAssessment, temp: f64, species: Species, stage: DevelopmentStage) {
        if !(-30.0..=60.0).contains(&temp) {
            result.add_issue(
                ValidationLevel::Error,
                "temperature",
                format!("Temperature ({}°C) is outside realistic range", temp),
                25.0,
                Some("Verify temperature measurement and units"),
            );
            return;
        }

        if let Some((min_temp, max_temp)) = species_temperature_range(species) {
            if temp < min_temp {
                result.add_issue(
                    ValidationLevel::Warning,
                    "temperature",
                    format!("Temperature ({}°C) is below optimal range for {}", temp, species),
                    10.0,
                    Some("Development may be significantly slower than calculated"),
                );
            } else if temp > max_temp {
                result.add_issue(
                    ValidationLevel::Warning,
                    "temperature",
                    format!("Temperature ({}°C) is above optimal range for {}", temp, species),
                    10.0,
                    Some("High temperatures may affect development accuracy"),
                );
            }
        }

        if let Ok(threshold) = development_threshold(species, stage) {
            if temp <= threshold.base_temp_c {
                result.add_issue(
                    ValidationLevel::Critical,
                    "temperature",
                    format!(
                        "Temperature ({}°C) is at or below base temperature ({}°C) for {}",
                        temp, threshold.base_temp_c, species
                    ),
                    40.0,
                    Some("Development is unlikely at this temperature. Results are highly unreliable."),
                );
            }
        }
    }

    fn check_estimate(&self, result: &mut QualityAssessment, estimate: &SingleMethodEstimate) {
        let pmi = estimate.pmi_days;
        if pmi <= 0.0 {
            result.add_issue(
                ValidationLevel::Error,
                "calculation",
                "PMI estimate must be positive".to_string(),
                30.0,
                None,
            );
        } else {
            let (min_pmi, max_pmi) = stage_pmi_range(estimate.stage);
            if pmi < min_pmi * 0.1 {
                result.add_issue(
                    ValidationLevel::Warning,
                    "calculation",
                    format!("PMI estimate ({:.1} days) seems unusually short for {}", pmi, estimate.stage),
                    15.0,
                    Some("Verify temperature data and stage identification"),
                );
            } else if pmi > max_pmi * 2.0 {
                result.add_issue(
                    ValidationLevel::Warning,
                    "calculation",
                    format!("PMI estimate ({:.1} days) seems unusually long for {}", pmi, estimate.stage),
                    15.0,
                    Some("Check for environmental factors that may slow development"),
                );
            }
        }

        if (pmi * 24.0 - estimate.pmi_hours).abs() > 0.1 {
            result.add_issue(
                ValidationLevel::Error,
                "calculation",
                "Inconsistency between days and hours calculation".to_string(),
                25.0,
                None,
            );
        }
        if estimate.confidence_low >= pmi || estimate.confidence_high <= pmi {
            result.add_issue(
                ValidationLevel::Error,
                "calculation",
                "Invalid confidence interval".to_string(),
                20.0,
                None,
            );
        }
        if estimate.confidence_high < estimate.confidence_low {
            result.add_issue(
                ValidationLevel::Error,
                "calculation",
                "Confidence interval bounds are reversed".to_string(),
                25.0,
                None,
            );
        }
    }

    fn check_temperature_consistency(&self, result: &mut QualityAssessment, temperature: &TemperatureReading) {
        if let (Some(min), Some(max)) = (temperature.min_temp_c, temperature.max_temp_c) {
            let span = max - min;
            if span > 25.0 {
                result.add_issue(
                    ValidationLevel::Warning,
                    "temperature",
                    format!("Large temperature range ({:.1}°C) may affect accuracy", span),
                    8.0,
                    Some("Consider using more specific time-of-day temperature data"),
                );
            }
            if temperature.avg_temp_c < min || temperature.avg_temp_c > max {
                result.add_issue(
                    ValidationLevel::Error,
                    "temperature",
                    "Average temperature outside of min/max range".to_string(),
                    20.0,
                    None,
                );
            }
        }
    }

    fn assess_method_accuracy(
        &self,
        result: &mut QualityAssessment,
        temperature: &TemperatureReading,
        species: Species,
        stage: DevelopmentStage,
    ) {
        let span = temperature.variation().unwrap_or(0.0);
        if span <= 10.0 {
            result.accuracy_factors.push("Stable temperature conditions".to_string());
        } else if span <= 20.0 {
            result.accuracy_factors.push("Moderate temperature variation".to_string());
        } else {
            result.accuracy_factors.push("High temperature variation".to_string());
            result.adjust(-5.0);
        }

        if is_well_studied(species) {
            result.accuracy_factors.push("Well-studied species with reliable data".to_string());
            result.adjust(5.0);
        } else {
            result.accuracy_factors.push("Limited research data for this species".to_string());
            result.adjust(-3.0);
        }

        match stage {
            DevelopmentStage::SecondInstar | DevelopmentStage::ThirdInstar => {
                result
                    .accuracy_factors
                    .push("Optimal development stage for PMI estimation".to_string());
            }
            DevelopmentStage::FirstInstar => {
                result.accuracy_factors.push(
                    "Early stage - shorter PMI with higher relative uncertainty".to_string(),
                );
                result.adjust(-5.0);
            }
            DevelopmentStage::Pupa => {
                result.accuracy_factors.push(
                    "Pupal stage - longer development with variable duration".to_string(),
                );
                result.adjust(-8.0);
            }
        }
    }
}

impl QualityAssessor for DefaultQualityAssessor {
    fn assess(&self, request: &QualityRequest<'_>) -> QualityAssessment {
        let mut result = QualityAssessment::default();

        // Inputs
        self.check_species_stage(&mut result, request.species, request.stage);
        if let Some(location) = request.location {
            self.check_location(&mut result, location);
        }
        if let Some(date) = request.discovery_date {
            self.check_date(&mut result, date);
        }
        if let Some(length) = request.length_mm {
            self.check_length(&mut result, length, request.stage);
        }
        self.check_temperature(
            &mut result,
            request.temperature.avg_temp_c,
            request.species,
            request.stage,
        );

        // Result
        if let Some(estimate) = request.estimate {
            self.check_estimate(&mut result, estimate);
            self.check_temperature_consistency(&mut result, request.temperature);
            self.assess_method_accuracy(
                &mut result,
                request.temperature,
                request.species,
                request.stage,
            );
        }

        debug!(
            "Quality assessment for {}: score={:.1} issues={}",
            request.specimen_id,
            result.quality_score,
            result.issues.len()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::PmiEstimator;

    fn request<'a>(
        species: Species,
        stage: DevelopmentStage,
        temperature: &'a TemperatureReading,
    ) -> QualityRequest<'a> {
        QualityRequest {
            specimen_id: "S1",
            species,
            stage,
            location: None,
            discovery_date: None,
            length_mm: None,
            temperature,
            estimate: None,
        }
    }

    fn assessor() -> DefaultQualityAssessor {
        DefaultQualityAssessor::with_reference_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    #[test]
    fn test_clean_specimen_scores_full_marks() {
        let temperature = TemperatureReading::new(25.0);
        let estimate = PmiEstimator::default()
            .estimate(Species::LuciliaSericata, DevelopmentStage::ThirdInstar, &temperature, None)
            .unwrap();
        let mut req = request(Species::LuciliaSericata, DevelopmentStage::ThirdInstar, &temperature);
        req.estimate = Some(&estimate);

        let result = assessor().assess(&req);
        assert_eq!(result.quality_score, 100.0);
        assert_eq!(result.data_quality, DataQuality::Excellent);
        assert!(result.warnings.is_empty());
        assert_eq!(result.accuracy_factors.len(), 3);
    }

    #[test]
    fn test_location_checks() {
        let temperature = TemperatureReading::new(25.0);
        let mut req = request(Species::LuciliaSericata, DevelopmentStage::ThirdInstar, &temperature);
        req.location = Some("12");
        let result = assessor().assess(&req);
        assert_eq!(result.quality_score, 75.0);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].starts_with("ERROR: Location"));
    }

    #[test]
    fn test_date_checks() {
        let temperature = TemperatureReading::new(25.0);
        let mut req = request(Species::LuciliaSericata, DevelopmentStage::ThirdInstar, &temperature);

        req.discovery_date = Some("2024-13-01");
        assert_eq!(assessor().assess(&req).quality_score, 80.0);

        req.discovery_date = Some("2025-06-01");
        assert_eq!(assessor().assess(&req).quality_score, 75.0);

        req.discovery_date = Some("2020-01-01");
        assert_eq!(assessor().assess(&req).quality_score, 95.0);

        req.discovery_date = Some("2024-12-01");
        assert_eq!(assessor().assess(&req).quality_score, 100.0);
    }

    #[test]
    fn test_length_checks() {
        let temperature = TemperatureReading::new(25.0);
        let mut req = request(Species::LuciliaSericata, DevelopmentStage::ThirdInstar, &temperature);

        req.length_mm = Some(40.0);
        assert_eq!(assessor().assess(&req).quality_score, 92.0);

        req.length_mm = Some(60.0);
        assert_eq!(assessor().assess(&req).quality_score, 90.0);

        req.length_mm = Some(0.0);
        assert_eq!(assessor().assess(&req).quality_score, 85.0);
    }

    #[test]
    fn test_at_base_temperature_is_critical() {
        let temperature = TemperatureReading::new(8.0);
        let req = request(Species::LuciliaSericata, DevelopmentStage::ThirdInstar, &temperature);
        let result = assessor().assess(&req);
        assert_eq!(result.quality_score, 60.0);
        assert!(result.warnings[0].starts_with("CRITICAL:"));
    }

    #[test]
    fn test_unstudied_species_and_pupa() {
        let temperature = TemperatureReading::new(25.0);
        let req = request(Species::LuciliaCuprina, DevelopmentStage::Pupa, &temperature);
        let result = assessor().assess(&req);
        // -10 limited data, -5 pupa (info only)
        assert_eq!(result.quality_score, 85.0);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn test_temperature_range_consistency() {
        let temperature = TemperatureReading::new(25.0).with_range(26.0, 60.0);
        let estimate = PmiEstimator::default()
            .estimate(Species::LuciliaSericata, DevelopmentStage::ThirdInstar, &temperature, None)
            .unwrap();
        let mut req = request(Species::LuciliaSericata, DevelopmentStage::ThirdInstar, &temperature);
        req.estimate = Some(&estimate);
        let result = assessor().assess(&req);
        // -8 span, -20 avg outside, -5 high variation, +5 well studied
        assert_eq!(result.quality_score, 72.0);
    }
}
