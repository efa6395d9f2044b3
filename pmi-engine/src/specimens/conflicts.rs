// Multi-specimen conflict detection
//
// Algorithm:
// 1. PMI spread across specimens against the conflict threshold
// 2. Quality score spread against the disparity threshold
// 3. More than one species at the scene
// 4. Per species, stage span beyond what sequential development allows
// 5. Overall severity is the worst individual conflict
//
// A single specimen never conflicts with itself.

use super::SpecimenResult;
use crate::config::SpecimenConfig;
use crate::stats;
use pmi_common::{DevelopmentStage, Species};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    SpeciesDisagreement,
    StageInconsistency,
    PmiRangeConflict,
    QualityDisparity,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::SpeciesDisagreement => "species_disagreement",
            ConflictType::StageInconsistency => "stage_inconsistency",
            ConflictType::PmiRangeConflict => "pmi_range_conflict",
            ConflictType::QualityDisparity => "quality_disparity",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered so that the worst severity is the maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    None,
    Minor,
    Moderate,
    Severe,
}

impl ConflictSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::None => "none",
            ConflictSeverity::Minor => "minor",
            ConflictSeverity::Moderate => "moderate",
            ConflictSeverity::Severe => "severe",
        }
    }

    /// Deduction from the mean specimen quality
    pub fn quality_penalty(&self) -> f64 {
        match self {
            ConflictSeverity::None => 0.0,
            ConflictSeverity::Minor => 5.0,
            ConflictSeverity::Moderate => 15.0,
            ConflictSeverity::Severe => 30.0,
        }
    }
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub description: String,
    pub severity: ConflictSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictAnalysis {
    pub has_conflicts: bool,
    pub conflict_types: Vec<ConflictType>,
    pub conflicts: Vec<Conflict>,
    pub severity: ConflictSeverity,
}

impl ConflictAnalysis {
    pub fn none() -> Self {
        Self {
            has_conflicts: false,
            conflict_types: Vec::new(),
            conflicts: Vec::new(),
            severity: ConflictSeverity::None,
        }
    }

    pub fn contains(&self, conflict_type: ConflictType) -> bool {
        self.conflict_types.contains(&conflict_type)
    }
}

/// Conflict detector for specimens from one scene
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    /// PMI spread (days) above which specimens conflict
    pmi_conflict_threshold_days: f64,
    /// Quality spread (points) above which specimens conflict
    quality_disparity_threshold: f64,
    /// Largest stage distance within one species still considered sequential
    max_stage_span: usize,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(&SpecimenConfig::default())
    }
}

impl ConflictDetector {
    pub fn new(config: &SpecimenConfig) -> Self {
        Self {
            pmi_conflict_threshold_days: config.pmi_conflict_threshold_days,
            quality_disparity_threshold: config.quality_disparity_threshold,
            max_stage_span: config.max_stage_span,
        }
    }

    /// Detect conflicts between specimen results
    pub fn detect(&self, results: &[SpecimenResult]) -> ConflictAnalysis {
        if results.len() < 2 {
            return ConflictAnalysis::none();
        }

        let mut conflicts: Vec<Conflict> = Vec::new();

        // Step 1: PMI spread
        let pmi_values: Vec<f64> = results.iter().map(|r| r.pmi_days).collect();
        let pmi_range = stats::max(&pmi_values) - stats::min(&pmi_values);
        if pmi_range > self.pmi_conflict_threshold_days {
            conflicts.push(Conflict {
                conflict_type: ConflictType::PmiRangeConflict,
                description: format!("PMI estimates vary by {:.1} days", pmi_range),
                severity: pmi_range_severity(pmi_range, stats::mean(&pmi_values)),
            });
        }

        // Step 2: Quality spread
        let quality_scores: Vec<f64> = results.iter().map(|r| r.quality_score).collect();
        let quality_range = stats::max(&quality_scores) - stats::min(&quality_scores);
        if quality_range > self.quality_disparity_threshold {
            conflicts.push(Conflict {
                conflict_type: ConflictType::QualityDisparity,
                description: format!("Quality scores vary by {:.0} points", quality_range),
                severity: if quality_range > 50.0 {
                    ConflictSeverity::Moderate
                } else {
                    ConflictSeverity::Minor
                },
            });
        }

        // Step 3: Species mixture
        let mut by_species: BTreeMap<Species, BTreeSet<DevelopmentStage>> = BTreeMap::new();
        let mut counts: BTreeMap<Species, usize> = BTreeMap::new();
        for result in results {
            by_species
                .entry(result.specimen.species)
                .or_default()
                .insert(result.specimen.stage);
            *counts.entry(result.specimen.species).or_default() += 1;
        }
        if by_species.len() > 1 {
            let names: Vec<&str> = by_species.keys().map(|s| s.as_str()).collect();
            conflicts.push(Conflict {
                conflict_type: ConflictType::SpeciesDisagreement,
                description: format!("Multiple species present: {}", names.join(", ")),
                severity: ConflictSeverity::Moderate,
            });
        }

        // Step 4: Stage consistency within each species
        for (species, stages) in &by_species {
            if counts.get(species).copied().unwrap_or(0) < 2 {
                continue;
            }
            if !self.stages_are_consistent(stages) {
                let names: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
                conflicts.push(Conflict {
                    conflict_type: ConflictType::StageInconsistency,
                    description: format!(
                        "Inconsistent stages for {}: {}",
                        species,
                        names.join(", ")
                    ),
                    severity: ConflictSeverity::Severe,
                });
            }
        }

        // Step 5: Overall status
        let severity = conflicts
            .iter()
            .map(|c| c.severity)
            .max()
            .unwrap_or(ConflictSeverity::None);
        let mut conflict_types: Vec<ConflictType> = Vec::new();
        for conflict in &conflicts {
            if !conflict_types.contains(&conflict.conflict_type) {
                conflict_types.push(conflict.conflict_type);
            }
        }

        tracing::info!(
            "Conflict detection: specimens={}, conflicts={}, severity={}",
            results.len(),
            conflicts.len(),
            severity
        );

        ConflictAnalysis {
            has_conflicts: !conflicts.is_empty(),
            conflict_types,
            conflicts,
            severity,
        }
    }

    /// Stages are consistent when their canonical indices span at most `max_stage_span`
    fn stages_are_consistent(&self, stages: &BTreeSet<DevelopmentStage>) -> bool {
        let ordinals: Vec<usize> = stages.iter().map(|s| s.ordinal()).collect();
        match (ordinals.iter().min(), ordinals.iter().max()) {
            (Some(min), Some(max)) => max - min <= self.max_stage_span,
            _ => true,
        }
    }

    /// Count conflicts by severity as (severe, moderate, minor)
    pub fn count_by_severity(&self, conflicts: &[Conflict]) -> (usize, usize, usize) {
        let mut severe = 0;
        let mut moderate = 0;
        let mut minor = 0;

        for conflict in conflicts {
            match conflict.severity {
                ConflictSeverity::Severe => severe += 1,
                ConflictSeverity::Moderate => moderate += 1,
                ConflictSeverity::Minor => minor += 1,
                ConflictSeverity::None => {}
            }
        }

        (severe, moderate, minor)
    }

    pub fn summary_message(&self, analysis: &ConflictAnalysis) -> String {
        if !analysis.has_conflicts {
            return "Specimens are consistent".to_string();
        }

        let (severe, moderate, minor) = self.count_by_severity(&analysis.conflicts);
        format!(
            "{} conflict(s): {} severe, {} moderate, {} minor",
            analysis.conflicts.len(),
            severe,
            moderate,
            minor
        )
    }
}

/// Severity from the PMI range relative to the mean PMI
fn pmi_range_severity(pmi_range: f64, mean_pmi: f64) -> ConflictSeverity {
    let relative = if mean_pmi > 0.0 {
        pmi_range / mean_pmi * 100.0
    } else {
        0.0
    };

    if relative > 50.0 {
        ConflictSeverity::Severe
    } else if relative > 25.0 {
        ConflictSeverity::Moderate
    } else {
        ConflictSeverity::Minor
    }
}
