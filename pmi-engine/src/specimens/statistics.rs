//! Descriptive statistics across specimen results

use super::SpecimenResult;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenStatistics {
    pub specimen_count: usize,
    pub pmi_mean: f64,
    pub pmi_median: f64,
    /// Sample standard deviation; 0 for a single specimen
    pub pmi_std_dev: f64,
    pub pmi_min: f64,
    pub pmi_max: f64,
    pub pmi_range: f64,
    /// Coefficient of variation in percent
    pub pmi_cv: f64,
    pub quality_mean: f64,
    pub quality_min: f64,
    pub quality_max: f64,
    /// Distinct species
    pub species_diversity: usize,
    /// Distinct stages
    pub stage_diversity: usize,
}

impl SpecimenStatistics {
    pub fn from_results(results: &[SpecimenResult]) -> Self {
        let pmi_values: Vec<f64> = results.iter().map(|r| r.pmi_days).collect();
        let quality_scores: Vec<f64> = results.iter().map(|r| r.quality_score).collect();

        let pmi_mean = stats::mean(&pmi_values);
        let pmi_std_dev = stats::sample_std(&pmi_values);
        let pmi_min = stats::min(&pmi_values);
        let pmi_max = stats::max(&pmi_values);

        let species: BTreeSet<_> = results.iter().map(|r| r.specimen.species).collect();
        let stages: BTreeSet<_> = results.iter().map(|r| r.specimen.stage).collect();

        Self {
            specimen_count: results.len(),
            pmi_mean,
            pmi_median: stats::median(&pmi_values),
            pmi_std_dev,
            pmi_min,
            pmi_max,
            pmi_range: pmi_max - pmi_min,
            pmi_cv: stats::coefficient_of_variation(pmi_std_dev, pmi_mean) * 100.0,
            quality_mean: stats::mean(&quality_scores),
            quality_min: stats::min(&quality_scores),
            quality_max: stats::max(&quality_scores),
            species_diversity: species.len(),
            stage_diversity: stages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specimens::tests::specimen_result;
    use pmi_common::{DevelopmentStage, Species};

    #[test]
    fn test_statistics_over_three_specimens() {
        let results = vec![
            specimen_result("A", Species::LuciliaSericata, DevelopmentStage::ThirdInstar, 4.0, 90.0),
            specimen_result("B", Species::LuciliaSericata, DevelopmentStage::SecondInstar, 6.0, 80.0),
            specimen_result("C", Species::PhormiaRegina, DevelopmentStage::ThirdInstar, 8.0, 70.0),
        ];
        let summary = SpecimenStatistics::from_results(&results);

        assert_eq!(summary.specimen_count, 3);
        assert_eq!(summary.pmi_mean, 6.0);
        assert_eq!(summary.pmi_median, 6.0);
        assert!((summary.pmi_std_dev - 2.0).abs() < 1e-12);
        assert_eq!(summary.pmi_range, 4.0);
        assert!((summary.pmi_cv - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.quality_mean, 80.0);
        assert_eq!(summary.quality_min, 70.0);
        assert_eq!(summary.species_diversity, 2);
        assert_eq!(summary.stage_diversity, 2);
    }

    #[test]
    fn test_single_specimen_has_zero_spread() {
        let results = vec![specimen_result(
            "A",
            Species::LuciliaSericata,
            DevelopmentStage::Pupa,
            12.0,
            85.0,
        )];
        let summary = SpecimenStatistics::from_results(&results);
        assert_eq!(summary.pmi_std_dev, 0.0);
        assert_eq!(summary.pmi_cv, 0.0);
        assert_eq!(summary.pmi_range, 0.0);
    }
}
