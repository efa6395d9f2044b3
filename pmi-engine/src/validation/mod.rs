//! Uncertainty quantification and validation
//!
//! [`EnhancedValidator`] combines analytical error propagation, Monte Carlo
//! simulation, cross-method validation and literature case checks into one
//! [`ValidationReport`].

pub mod cross_validation;
pub mod known_cases;
pub mod monte_carlo;
pub mod report;
pub mod uncertainty;

pub use cross_validation::{AgreementMetrics, CrossValidationResult};
pub use known_cases::{KnownCase, KnownCaseResult, KNOWN_CASES};
pub use monte_carlo::{ConvergenceStatus, MonteCarloResult, MonteCarloSimulator};
pub use report::ValidationReport;
pub use uncertainty::{
    UncertaintyAnalysis, UncertaintyComponent, UncertaintyOverrides, UncertaintySource,
    UncertaintyValues,
};

use crate::config::{EngineConfig, UncertaintyConfig};
use crate::estimator::PmiEstimator;
use crate::methods::AlternativeMethodsEngine;
use pmi_common::{development_threshold, DevelopmentStage, Result, Species, TemperatureReading};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::info;

/// Validation front end over the estimators
#[derive(Debug, Clone, Default)]
pub struct EnhancedValidator {
    estimator: PmiEstimator,
    methods: AlternativeMethodsEngine,
    simulator: MonteCarloSimulator,
    uncertainties: UncertaintyConfig,
}

impl EnhancedValidator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            estimator: PmiEstimator::new(&config.estimator),
            methods: AlternativeMethodsEngine::new(config),
            simulator: MonteCarloSimulator::new(
                config.monte_carlo.clone(),
                config.uncertainty.clone(),
            ),
            uncertainties: config.uncertainty.clone(),
        }
    }

    /// RNG for the configured seed (entropy when unset)
    pub fn rng(&self) -> StdRng {
        self.simulator.rng()
    }

    /// Analytical propagation around the single-method estimate
    pub fn propagate_uncertainties(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
        overrides: Option<&UncertaintyOverrides>,
    ) -> Result<UncertaintyAnalysis> {
        let estimate = self
            .estimator
            .estimate(species, stage, temperature, length_mm)?;
        let values = UncertaintyValues::new(&self.uncertainties, overrides);
        Ok(uncertainty::propagate(
            &estimate,
            temperature.avg_temp_c,
            length_mm,
            &values,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn monte_carlo_simulation<R: Rng + ?Sized>(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
        iterations: usize,
        confidence_levels: &[u32],
        rng: &mut R,
    ) -> Result<MonteCarloResult> {
        let threshold = development_threshold(species, stage)?;
        self.simulator.run(
            threshold,
            temperature,
            length_mm,
            iterations,
            confidence_levels,
            rng,
        )
    }

    /// Monte Carlo with the configured iteration count and levels
    pub fn monte_carlo_default<R: Rng + ?Sized>(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
        rng: &mut R,
    ) -> Result<MonteCarloResult> {
        let config = self.simulator.config();
        self.monte_carlo_simulation(
            species,
            stage,
            temperature,
            length_mm,
            config.iterations,
            &config.confidence_levels,
            rng,
        )
    }

    pub fn cross_validate_methods(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
    ) -> Result<CrossValidationResult> {
        let comparison = self
            .methods
            .calculate_all_methods(species, stage, temperature, length_mm, None)?;
        Ok(cross_validation::cross_validate(&comparison))
    }

    pub fn validate_against_known_cases(
        &self,
        species: Species,
        stage: DevelopmentStage,
    ) -> Vec<KnownCaseResult> {
        known_cases::validate_known_cases(&self.estimator, species, stage)
    }

    /// Full report including a Monte Carlo run of `report_iterations` draws
    pub fn comprehensive_report<R: Rng + ?Sized>(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
        rng: &mut R,
    ) -> Result<ValidationReport> {
        self.build_report(species, stage, temperature, length_mm, Some(rng))
    }

    /// Report with or without the Monte Carlo stage
    pub fn enhanced_validation_report<R: Rng + ?Sized>(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
        include_monte_carlo: bool,
        rng: &mut R,
    ) -> Result<ValidationReport> {
        let rng = if include_monte_carlo { Some(rng) } else { None };
        self.build_report(species, stage, temperature, length_mm, rng)
    }

    fn build_report<R: Rng + ?Sized>(
        &self,
        species: Species,
        stage: DevelopmentStage,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
        rng: Option<&mut R>,
    ) -> Result<ValidationReport> {
        let uncertainty_analysis =
            self.propagate_uncertainties(species, stage, temperature, length_mm, None)?;

        let monte_carlo = match rng {
            Some(rng) => {
                let config = self.simulator.config();
                Some(self.monte_carlo_simulation(
                    species,
                    stage,
                    temperature,
                    length_mm,
                    config.report_iterations,
                    &config.confidence_levels,
                    rng,
                )?)
            }
            None => None,
        };

        let cross_validation =
            self.cross_validate_methods(species, stage, temperature, length_mm)?;
        let known_cases = self.validate_against_known_cases(species, stage);

        let overall_validation_score =
            report::validation_score(&uncertainty_analysis, &cross_validation, &known_cases);
        let recommendations = report::validation_recommendations(
            &uncertainty_analysis,
            &cross_validation,
            &known_cases,
        );

        info!(
            "Validation report: {} {} score={:.1} relative_uncertainty={:.3} cross_confidence={:.0} known_cases={}",
            species,
            stage,
            overall_validation_score,
            uncertainty_analysis.relative_uncertainty,
            cross_validation.overall_confidence,
            known_cases.len()
        );

        Ok(ValidationReport {
            species,
            stage,
            uncertainty_analysis,
            monte_carlo,
            cross_validation,
            known_cases,
            overall_validation_score,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::PmiMethod;
    use rand::SeedableRng;

    #[test]
    fn test_cross_validation_flags_development_rate() {
        let validator = EnhancedValidator::default();
        let result = validator
            .cross_validate_methods(
                Species::LuciliaSericata,
                DevelopmentStage::ThirdInstar,
                &TemperatureReading::new(25.0),
                None,
            )
            .unwrap();

        // Isomegalen needs a length, so six methods remain
        assert_eq!(result.method_estimates.len(), 6);
        assert_eq!(result.outlier_methods, vec![PmiMethod::DevelopmentRate]);
        assert_eq!(result.overall_confidence, 60.0);
    }

    #[test]
    fn test_quick_report_skips_monte_carlo() {
        let validator = EnhancedValidator::default();
        let mut rng = StdRng::seed_from_u64(5);
        let report = validator
            .enhanced_validation_report(
                Species::LuciliaSericata,
                DevelopmentStage::ThirdInstar,
                &TemperatureReading::new(25.0),
                None,
                false,
                &mut rng,
            )
            .unwrap();
        assert!(report.monte_carlo.is_none());
        assert_eq!(report.known_cases.len(), 2);
        assert!((0.0..=100.0).contains(&report.overall_validation_score));
    }

    #[test]
    fn test_comprehensive_report_uses_report_iterations() {
        let mut config = EngineConfig::default();
        config.monte_carlo.report_iterations = 600;
        let validator = EnhancedValidator::new(&config);
        let mut rng = StdRng::seed_from_u64(5);
        let report = validator
            .comprehensive_report(
                Species::CalliphoraVicina,
                DevelopmentStage::ThirdInstar,
                &TemperatureReading::new(15.0),
                Some(18.0),
                &mut rng,
            )
            .unwrap();
        let monte_carlo = report.monte_carlo.unwrap();
        assert_eq!(monte_carlo.iterations_attempted, 600);
        assert_eq!(monte_carlo.confidence_intervals.len(), 3);
    }
}
