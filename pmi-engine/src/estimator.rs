//! Single-method accumulated degree day (ADD) estimator
//!
//! Converts a development threshold, an ambient temperature and an optional
//! specimen length into one PMI point estimate with a fixed-percentage
//! confidence band. The other estimators reuse [`required_add`].
//!
//! Unlike the alternative methods, this estimator does not reject
//! temperatures at or below the base temperature: it clamps the effective
//! temperature to a small positive value, logs a warning and records the
//! warning on the result so a best-effort estimate stays available.

use crate::config::EstimatorConfig;
use pmi_common::{
    development_threshold, DevelopmentStage, DevelopmentThreshold, Error, Result, Species,
    SpeciesInfo, TemperatureReading,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Length ratio below which a specimen counts as small for its stage
pub const SMALL_LENGTH_RATIO: f64 = 0.8;

/// Length ratio above which a specimen counts as large for its stage
pub const LARGE_LENGTH_RATIO: f64 = 1.2;

/// Result of the single-method estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleMethodEstimate {
    pub species: Species,
    pub stage: DevelopmentStage,
    pub pmi_days: f64,
    pub pmi_hours: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
    /// ADD required to reach the observed development
    pub accumulated_dd: f64,
    pub base_temp_c: f64,
    /// Effective temperature used (clamped when below base)
    pub effective_temp_c: f64,
    pub below_base_temperature: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Shared length-adjustment rule for the required ADD
///
/// Without a length (or without a typical length for the stage) the
/// midpoint of the ADD window is used. Small specimens sit at 30% of the
/// window, large specimens at 80%.
pub fn required_add(threshold: &DevelopmentThreshold, length_mm: Option<f64>) -> f64 {
    match (length_mm, threshold.typical_length_mm) {
        (Some(length), Some(typical)) => {
            let ratio = length / typical;
            if ratio < SMALL_LENGTH_RATIO {
                threshold.min_add + threshold.add_span() * 0.3
            } else if ratio > LARGE_LENGTH_RATIO {
                threshold.min_add + threshold.add_span() * 0.8
            } else {
                threshold.mid_add()
            }
        }
        _ => threshold.mid_add(),
    }
}

/// Reject lengths that are not finite and positive
pub fn check_length(length_mm: Option<f64>) -> Result<()> {
    match length_mm {
        Some(length) if !length.is_finite() || length <= 0.0 => Err(Error::InvalidInput(format!(
            "Specimen length must be a positive number of millimetres, got {}",
            length
        ))),
        _ => Ok(()),
    }
}

/// Single-method ADD estimator
#[derive(Debug, Clone)]
pub struct PmiEstimator {
    confidence_fraction: f64,
    min_effective_temp_c: f64,
}

impl Default for PmiEstimator {
    fn default() -> Self {
        Self::new(&EstimatorConfig::default())
    }
}

impl PmiEstimator {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            confidence_fraction: config.confidence_fraction,
            min_effective_temp_c: config.min_effective_temp_c,
        }
    }

    pub fn confidence_fraction(&self) -> f64 {
        self.confidence_fraction
    }

    /// Estimate PMI for a species and stage
    pub fn estimate(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
    ) -> Result<SingleMethodEstimate> {
        let threshold = development_threshold(species, stage)?;
        self.estimate_with_threshold(threshold, temperature, length_mm)
    }

    /// Estimate PMI from an explicit threshold
    pub fn estimate_with_threshold(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
    ) -> Result<SingleMethodEstimate> {
        temperature.ensure_finite()?;
        check_length(length_mm)?;

        let avg_temp = temperature.avg_temp_c;
        let base_temp = threshold.base_temp_c;
        let mut warnings = Vec::new();

        let below_base = avg_temp <= base_temp;
        let effective_temp = if below_base {
            warn!(
                "Temperature ({}°C) is at or below base temperature ({}°C) for {}; development is unlikely, using minimal effective temperature {}°C",
                avg_temp, base_temp, threshold.species, self.min_effective_temp_c
            );
            warnings.push(format!(
                "Temperature ({}°C) is at or below base temperature ({}°C) for {}. Development is unlikely at this temperature; interpret with extreme caution.",
                avg_temp, base_temp, threshold.species
            ));
            self.min_effective_temp_c
        } else {
            avg_temp - base_temp
        };

        let accumulated_dd = required_add(threshold, length_mm);
        let pmi_days = accumulated_dd / effective_temp;
        let range = pmi_days * self.confidence_fraction;

        debug!(
            "Single-method estimate: {} {} add={:.1} eff={:.2} pmi={:.3}d",
            threshold.species, threshold.stage, accumulated_dd, effective_temp, pmi_days
        );

        Ok(SingleMethodEstimate {
            species: threshold.species,
            stage: threshold.stage,
            pmi_days,
            pmi_hours: pmi_days * 24.0,
            confidence_low: (pmi_days - range).max(0.0),
            confidence_high: pmi_days + range,
            accumulated_dd,
            base_temp_c: base_temp,
            effective_temp_c: effective_temp,
            below_base_temperature: below_base,
            warnings,
        })
    }
}

/// Multiplicative accuracy penalty for the temperature regime
///
/// High day-to-day variation (> 5°C) adds `variation / 100`; very hot
/// conditions (> 35°C) multiply by 1.1; temperatures within 5°C of base
/// multiply by 1.2.
pub fn temperature_adjustment(base_temp_c: f64, actual_temp_c: f64, variation_c: Option<f64>) -> f64 {
    let mut adjustment = match variation_c {
        Some(variation) if variation > 5.0 => 1.0 + variation / 100.0,
        _ => 1.0,
    };

    if actual_temp_c > 35.0 {
        adjustment *= 1.1;
    } else if actual_temp_c < base_temp_c + 5.0 {
        adjustment *= 1.2;
    }

    adjustment
}

/// Species-specific guidance for reports
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesRecommendations {
    pub species_info: SpeciesInfo,
    pub temperature_considerations: Vec<String>,
    pub accuracy_notes: Vec<String>,
}

pub fn species_recommendations(species: Species) -> SpeciesRecommendations {
    let (temperature_considerations, accuracy_notes): (Vec<&str>, Vec<&str>) = match species {
        Species::ChrysomyaRufifacies => (
            vec!["C. rufifacies develops poorly below 15°C"],
            vec!["Most accurate in warm climates (20-35°C)"],
        ),
        Species::LuciliaSericata => (
            vec!["L. sericata is cold-tolerant but optimal above 15°C"],
            vec!["Well-studied species with reliable data"],
        ),
        Species::CalliphoraVicina => (
            vec!["C. vicina prefers cooler temperatures (5-20°C)"],
            vec!["May be inaccurate in very warm climates"],
        ),
        _ => (Vec::new(), Vec::new()),
    };

    SpeciesRecommendations {
        species_info: species.info(),
        temperature_considerations: temperature_considerations
            .into_iter()
            .map(String::from)
            .collect(),
        accuracy_notes: accuracy_notes.into_iter().map(String::from).collect(),
    }
}
