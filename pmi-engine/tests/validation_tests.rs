//! Integration tests for uncertainty propagation and Monte Carlo simulation

use pmi_common::{DevelopmentStage, Species, TemperatureReading};
use pmi_engine::validation::{ConvergenceStatus, UncertaintyOverrides, UncertaintySource};
use pmi_engine::{EngineConfig, EnhancedValidator};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn validator() -> EnhancedValidator {
    EnhancedValidator::new(&EngineConfig::default())
}

#[test]
fn test_monte_carlo_is_reproducible_with_seed() {
    let validator = validator();
    let temperature = TemperatureReading::new(22.0);
    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        validator
            .monte_carlo_simulation(
                Species::CalliphoraVicina,
                DevelopmentStage::ThirdInstar,
                &temperature,
                Some(17.0),
                3000,
                &[90, 95, 99],
                &mut rng,
            )
            .unwrap()
    };

    let first = run(42);
    let second = run(42);
    assert_eq!(first, second);
    assert_eq!(first.convergence_achieved, first.convergence == ConvergenceStatus::Converged);
    assert_eq!(first.iterations_used, first.distribution.len());
}

#[test]
fn test_monte_carlo_intervals_are_nested() {
    let mut rng = StdRng::seed_from_u64(7);
    let result = validator()
        .monte_carlo_default(
            Species::LuciliaSericata,
            DevelopmentStage::ThirdInstar,
            &TemperatureReading::new(25.0),
            None,
            &mut rng,
        )
        .unwrap();

    let i90 = result.interval(90).unwrap();
    let i95 = result.interval(95).unwrap();
    let i99 = result.interval(99).unwrap();
    assert!(i95.low <= i90.low && i90.high <= i95.high);
    assert!(i99.low <= i95.low && i95.high <= i99.high);
    assert!(i90.contains(result.mean_pmi));
    assert!(result.distribution.iter().all(|pmi| *pmi > 0.0 && pmi.is_finite()));
}

#[test]
fn test_uncertainty_combines_in_quadrature() {
    let analysis = validator()
        .propagate_uncertainties(
            Species::LuciliaSericata,
            DevelopmentStage::ThirdInstar,
            &TemperatureReading::new(25.0),
            Some(16.0),
            None,
        )
        .unwrap();

    assert_eq!(analysis.components.len(), 4);
    let quadrature = analysis
        .components
        .iter()
        .map(|c| c.value_days.powi(2))
        .sum::<f64>()
        .sqrt();
    assert!((analysis.total_uncertainty - quadrature).abs() < 1e-12);
    assert!(analysis
        .components
        .iter()
        .all(|c| c.value_days <= analysis.total_uncertainty));
    assert!(analysis.confidence_99.low <= analysis.confidence_95.low);
    assert!(analysis.confidence_95.high <= analysis.confidence_99.high);
}

#[test]
fn test_overrides_increase_uncertainty() {
    let validator = validator();
    let temperature = TemperatureReading::new(25.0);
    let baseline = validator
        .propagate_uncertainties(
            Species::LuciliaSericata,
            DevelopmentStage::ThirdInstar,
            &temperature,
            None,
            None,
        )
        .unwrap();

    let mut overrides = UncertaintyOverrides::new();
    overrides.insert(UncertaintySource::TemperatureMeasurement, 3.0);
    let widened = validator
        .propagate_uncertainties(
            Species::LuciliaSericata,
            DevelopmentStage::ThirdInstar,
            &temperature,
            None,
            Some(&overrides),
        )
        .unwrap();

    assert_eq!(baseline.base_pmi, widened.base_pmi);
    assert!(widened.total_uncertainty > baseline.total_uncertainty);
}

#[test]
fn test_full_report_with_seeded_monte_carlo() {
    let mut config = EngineConfig::default();
    config.monte_carlo.report_iterations = 2500;
    let validator = EnhancedValidator::new(&config);

    let mut rng = StdRng::seed_from_u64(99);
    let report = validator
        .enhanced_validation_report(
            Species::PhormiaRegina,
            DevelopmentStage::ThirdInstar,
            &TemperatureReading::new(18.0),
            Some(15.0),
            true,
            &mut rng,
        )
        .unwrap();

    let monte_carlo = report.monte_carlo.as_ref().unwrap();
    assert!(monte_carlo.iterations_attempted <= 2500);
    assert_eq!(report.known_cases.len(), 1);
    assert!((0.0..=100.0).contains(&report.overall_validation_score));
    assert!(report.cross_validation.method_estimates.len() >= 6);
}
