//! Analytical uncertainty propagation
//!
//! First-order error propagation around the single-method estimate. Each
//! source contributes an absolute standard deviation in days; the components
//! are combined in quadrature.

use crate::config::UncertaintyConfig;
use crate::estimator::SingleMethodEstimate;
use crate::stats::Interval;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// z-score of the two-sided 95% normal interval
pub const Z_95: f64 = 1.96;
/// z-score of the two-sided 99% normal interval
pub const Z_99: f64 = 2.58;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintySource {
    TemperatureMeasurement,
    TemperatureVariation,
    SpeciesIdentification,
    StageIdentification,
    DevelopmentThreshold,
    SpecimenLength,
    ModelLimitations,
}

impl UncertaintySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            UncertaintySource::TemperatureMeasurement => "temperature_measurement",
            UncertaintySource::TemperatureVariation => "temperature_variation",
            UncertaintySource::SpeciesIdentification => "species_identification",
            UncertaintySource::StageIdentification => "stage_identification",
            UncertaintySource::DevelopmentThreshold => "development_threshold",
            UncertaintySource::SpecimenLength => "specimen_length",
            UncertaintySource::ModelLimitations => "model_limitations",
        }
    }
}

impl fmt::Display for UncertaintySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied replacements for the configured uncertainty values
pub type UncertaintyOverrides = BTreeMap<UncertaintySource, f64>;

/// Effective uncertainty values: configuration with overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyValues {
    values: BTreeMap<UncertaintySource, f64>,
}

impl UncertaintyValues {
    pub fn new(config: &UncertaintyConfig, overrides: Option<&UncertaintyOverrides>) -> Self {
        let mut values = BTreeMap::from([
            (UncertaintySource::TemperatureMeasurement, config.temperature_measurement_c),
            (UncertaintySource::TemperatureVariation, config.temperature_variation),
            (UncertaintySource::SpeciesIdentification, config.species_identification),
            (UncertaintySource::StageIdentification, config.stage_identification),
            (UncertaintySource::DevelopmentThreshold, config.development_threshold),
            (UncertaintySource::SpecimenLength, config.specimen_length),
            (UncertaintySource::ModelLimitations, config.model_limitations),
        ]);
        if let Some(overrides) = overrides {
            values.extend(overrides.iter().map(|(k, v)| (*k, *v)));
        }
        Self { values }
    }

    pub fn get(&self, source: UncertaintySource) -> f64 {
        self.values.get(&source).copied().unwrap_or(0.0)
    }
}

/// One source's contribution to the total uncertainty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyComponent {
    pub source: UncertaintySource,
    /// Standard deviation contributed, in days
    pub value_days: f64,
    pub description: String,
    pub impact_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyAnalysis {
    pub base_pmi: f64,
    /// Combined standard deviation in days
    pub total_uncertainty: f64,
    /// `total_uncertainty / base_pmi`
    pub relative_uncertainty: f64,
    pub components: Vec<UncertaintyComponent>,
    /// Not clamped at zero
    pub confidence_95: Interval,
    pub confidence_99: Interval,
}

/// Propagate uncertainties around a single-method estimate
///
/// The length component is only included when a length was supplied.
pub fn propagate(
    estimate: &SingleMethodEstimate,
    avg_temp_c: f64,
    length_mm: Option<f64>,
    values: &UncertaintyValues,
) -> UncertaintyAnalysis {
    let pmi = estimate.pmi_days;
    let mut components = Vec::with_capacity(4);

    let temp_std = values.get(UncertaintySource::TemperatureMeasurement);
    let temperature_days = if avg_temp_c > estimate.base_temp_c {
        // dPMI/dT = -PMI / (T - base)
        (-pmi / (avg_temp_c - estimate.base_temp_c) * temp_std).abs()
    } else {
        pmi * 0.5
    };
    components.push(UncertaintyComponent {
        source: UncertaintySource::TemperatureMeasurement,
        value_days: temperature_days,
        description: format!("Temperature measurement uncertainty (±{:.1}°C)", temp_std),
        impact_factor: 1.0,
    });

    let threshold_rel = values.get(UncertaintySource::DevelopmentThreshold);
    components.push(UncertaintyComponent {
        source: UncertaintySource::DevelopmentThreshold,
        value_days: pmi * threshold_rel,
        description: format!(
            "Development threshold uncertainty ({:.1}%)",
            threshold_rel * 100.0
        ),
        impact_factor: 1.0,
    });

    if length_mm.is_some() {
        let length_rel = values.get(UncertaintySource::SpecimenLength);
        components.push(UncertaintyComponent {
            source: UncertaintySource::SpecimenLength,
            value_days: pmi * length_rel * 0.5,
            description: format!(
                "Specimen length measurement uncertainty ({:.1}%)",
                length_rel * 100.0
            ),
            impact_factor: 0.5,
        });
    }

    components.push(UncertaintyComponent {
        source: UncertaintySource::ModelLimitations,
        value_days: pmi * values.get(UncertaintySource::ModelLimitations),
        description: "Inherent model limitations and approximations".to_string(),
        impact_factor: 1.0,
    });

    let total_uncertainty = components
        .iter()
        .map(|c| c.value_days.powi(2))
        .sum::<f64>()
        .sqrt();
    let relative_uncertainty = if pmi > 0.0 {
        total_uncertainty / pmi
    } else {
        0.0
    };

    UncertaintyAnalysis {
        base_pmi: pmi,
        total_uncertainty,
        relative_uncertainty,
        components,
        confidence_95: Interval::new(pmi - Z_95 * total_uncertainty, pmi + Z_95 * total_uncertainty),
        confidence_99: Interval::new(pmi - Z_99 * total_uncertainty, pmi + Z_99 * total_uncertainty),
    }
}
