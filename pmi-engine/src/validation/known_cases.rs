//! Published development studies used as validation cases

use crate::estimator::PmiEstimator;
use pmi_common::{DevelopmentStage, Species, TemperatureReading};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A literature case with a known development time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownCase {
    pub name: &'static str,
    pub species: Species,
    pub stage: DevelopmentStage,
    pub avg_temp_c: f64,
    pub specimen_length_mm: Option<f64>,
    pub published_pmi_days: f64,
    pub notes: &'static str,
}

pub const KNOWN_CASES: &[KnownCase] = &[
    KnownCase {
        name: "Grassberger & Reiter 2001 - L. sericata 20C",
        species: Species::LuciliaSericata,
        stage: DevelopmentStage::ThirdInstar,
        avg_temp_c: 20.0,
        specimen_length_mm: None,
        published_pmi_days: 6.5,
        notes: "Laboratory study, constant temperature",
    },
    KnownCase {
        name: "Grassberger & Reiter 2001 - L. sericata 25C",
        species: Species::LuciliaSericata,
        stage: DevelopmentStage::ThirdInstar,
        avg_temp_c: 25.0,
        specimen_length_mm: None,
        published_pmi_days: 4.2,
        notes: "Laboratory study, constant temperature",
    },
    KnownCase {
        name: "Donovan et al. 2006 - C. vicina 15C",
        species: Species::CalliphoraVicina,
        stage: DevelopmentStage::ThirdInstar,
        avg_temp_c: 15.0,
        specimen_length_mm: None,
        published_pmi_days: 8.5,
        notes: "Laboratory development study",
    },
    KnownCase {
        name: "Anderson 2000 - P. regina 18C",
        species: Species::PhormiaRegina,
        stage: DevelopmentStage::ThirdInstar,
        avg_temp_c: 18.0,
        specimen_length_mm: None,
        published_pmi_days: 7.1,
        notes: "Development rate study",
    },
    KnownCase {
        name: "Byrd & Butler 1997 - C. macellaria 28C",
        species: Species::CochliomyiaMacellaria,
        stage: DevelopmentStage::ThirdInstar,
        avg_temp_c: 28.0,
        specimen_length_mm: None,
        published_pmi_days: 3.8,
        notes: "Warm climate development study",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownCaseResult {
    pub case_name: String,
    pub published_pmi: f64,
    pub calculated_pmi: f64,
    /// `|calculated − published| / published`
    pub relative_error: f64,
    /// Published value lies within the calculated confidence band
    pub within_confidence: bool,
    pub notes: String,
}

/// Recompute every matching case with the single-method estimator
///
/// Cases that cannot be computed are logged and left out.
pub fn validate_known_cases(
    estimator: &PmiEstimator,
    species: Species,
    stage: DevelopmentStage,
) -> Vec<KnownCaseResult> {
    KNOWN_CASES
        .iter()
        .filter(|case| case.species == species && case.stage == stage)
        .filter_map(|case| {
            let temperature = TemperatureReading::new(case.avg_temp_c).with_source(case.name);
            match estimator.estimate(case.species, case.stage, &temperature, case.specimen_length_mm)
            {
                Ok(estimate) => Some(KnownCaseResult {
                    case_name: case.name.to_string(),
                    published_pmi: case.published_pmi_days,
                    calculated_pmi: estimate.pmi_days,
                    relative_error: (estimate.pmi_days - case.published_pmi_days).abs()
                        / case.published_pmi_days,
                    within_confidence: estimate.confidence_low <= case.published_pmi_days
                        && case.published_pmi_days <= estimate.confidence_high,
                    notes: case.notes.to_string(),
                }),
                Err(e) => {
                    warn!("Skipping known case '{}': {}", case.name, e);
                    None
                }
            }
        })
        .collect()
}
