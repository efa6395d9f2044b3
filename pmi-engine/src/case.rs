//! Case files: one scene's inputs and the analysis to run on them

use crate::config::EngineConfig;
use crate::methods::{AlternativeMethodsEngine, ComparativeResult, PmiMethod};
use crate::specimens::{CaseInfo, MultiSpecimenAnalyzer, MultiSpecimenResult, SpecimenData};
use crate::validation::{EnhancedValidator, ValidationReport};
use pmi_common::{DevelopmentStage, Error, Result, Species, TemperatureReading};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Analysis to run on a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Every alternative method with consensus and agreement
    Methods,
    /// Uncertainty, Monte Carlo, cross-validation and known cases
    Validation,
    /// Per-specimen estimates reconciled into one
    Specimens,
}

/// JSON case file
///
/// `species`, `stage` and `specimen_length_mm` select the evidence for the
/// methods and validation analyses; when absent the first specimen is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AnalysisMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<Species>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<DevelopmentStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specimen_length_mm: Option<f64>,
    pub temperature: TemperatureReading,
    #[serde(default)]
    pub specimens: Vec<SpecimenData>,
    #[serde(default)]
    pub case_info: CaseInfo,
    /// Restrict the methods analysis to these methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<PmiMethod>>,
}

impl CaseFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Explicit mode, then the file's mode, then specimens when any are listed
    pub fn resolve_mode(&self, requested: Option<AnalysisMode>) -> AnalysisMode {
        requested.or(self.mode).unwrap_or(if self.specimens.is_empty() {
            AnalysisMode::Methods
        } else {
            AnalysisMode::Specimens
        })
    }

    /// Species, stage and length for single-evidence analyses
    pub fn evidence(&self) -> Result<(Species, DevelopmentStage, Option<f64>)> {
        let first = self.specimens.first();
        let species = self.species.or(first.map(|s| s.species));
        let stage = self.stage.or(first.map(|s| s.stage));
        match (species, stage) {
            (Some(species), Some(stage)) => {
                let length = self
                    .specimen_length_mm
                    .or(first.and_then(|s| s.length_mm));
                Ok((species, stage, length))
            }
            _ => Err(Error::InvalidInput(
                "Case needs species and stage, either directly or through a specimen".to_string(),
            )),
        }
    }
}

/// Result of one case run, tagged with the analysis that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "result", rename_all = "snake_case")]
pub enum CaseReport {
    Methods(ComparativeResult),
    Validation(ValidationReport),
    Specimens(MultiSpecimenResult),
}

/// Run options from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub mode: Option<AnalysisMode>,
    /// Overrides `monte_carlo.seed`
    pub seed: Option<u64>,
    /// Quick validation report without the simulation
    pub skip_monte_carlo: bool,
}

pub fn run_case(config: &EngineConfig, case: &CaseFile, options: RunOptions) -> Result<CaseReport> {
    case.temperature.validate()?;
    let mode = case.resolve_mode(options.mode);
    info!("Running {:?} analysis", mode);

    match mode {
        AnalysisMode::Methods => {
            let (species, stage, length) = case.evidence()?;
            let engine = AlternativeMethodsEngine::new(config);
            let result = engine.calculate_all_methods(
                species,
                stage,
                &case.temperature,
                length,
                case.methods.as_deref(),
            )?;
            Ok(CaseReport::Methods(result))
        }
        AnalysisMode::Validation => {
            let (species, stage, length) = case.evidence()?;
            let validator = EnhancedValidator::new(config);
            let mut rng = match options.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => validator.rng(),
            };
            let report = validator.enhanced_validation_report(
                species,
                stage,
                &case.temperature,
                length,
                !options.skip_monte_carlo,
                &mut rng,
            )?;
            Ok(CaseReport::Validation(report))
        }
        AnalysisMode::Specimens => {
            let analyzer = MultiSpecimenAnalyzer::new(config);
            let result =
                analyzer.analyze_specimens(&case.specimens, &case.temperature, &case.case_info)?;
            Ok(CaseReport::Specimens(result))
        }
    }
}
