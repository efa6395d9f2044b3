//! Development threshold reference table
//!
//! Species × stage → accumulated degree day (ADD) window, base development
//! temperature and typical larval length. The table is built once on first
//! access and is read-only afterwards.

use crate::species::{DevelopmentStage, InsectFamily, Species};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Development threshold for one species at one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentThreshold {
    pub species: Species,
    pub stage: DevelopmentStage,
    /// Minimum accumulated degree days to reach this stage
    pub min_add: f64,
    /// Maximum accumulated degree days spent up to the end of this stage
    pub max_add: f64,
    /// Base temperature below which development halts (°C)
    pub base_temp_c: f64,
    /// Typical specimen length at this stage (mm); absent for pupae
    pub typical_length_mm: Option<f64>,
    pub family: InsectFamily,
}

impl DevelopmentThreshold {
    /// Midpoint of the ADD window
    pub fn mid_add(&self) -> f64 {
        (self.min_add + self.max_add) / 2.0
    }

    /// Width of the ADD window
    pub fn add_span(&self) -> f64 {
        self.max_add - self.min_add
    }
}

/// (min ADD, max ADD, typical length) per stage, in canonical stage order
type StageRow = (f64, f64, Option<f64>);

/// Reference data per species: base temperature and one row per stage
const REFERENCE_DATA: [(Species, f64, [StageRow; 4]); 13] = [
    (
        Species::ChrysomyaRufifacies,
        10.0,
        [
            (15.0, 25.0, Some(12.0)),
            (25.0, 45.0, Some(15.0)),
            (45.0, 95.0, Some(20.0)),
            (95.0, 180.0, None),
        ],
    ),
    (
        Species::LuciliaSericata,
        8.0,
        [
            (18.0, 28.0, Some(8.0)),
            (28.0, 48.0, Some(12.0)),
            (48.0, 108.0, Some(17.0)),
            (108.0, 200.0, None),
        ],
    ),
    (
        Species::CalliphoraVicina,
        6.0,
        [
            (20.0, 32.0, Some(10.0)),
            (32.0, 58.0, Some(14.0)),
            (58.0, 128.0, Some(18.0)),
            (128.0, 250.0, None),
        ],
    ),
    (
        Species::CochliomyiaMacellaria,
        12.0,
        [
            (16.0, 26.0, Some(11.0)),
            (26.0, 46.0, Some(14.0)),
            (46.0, 96.0, Some(19.0)),
            (96.0, 175.0, None),
        ],
    ),
    (
        Species::PhormiaRegina,
        5.0,
        [
            (22.0, 34.0, Some(9.0)),
            (34.0, 62.0, Some(13.0)),
            (62.0, 140.0, Some(16.0)),
            (140.0, 280.0, None),
        ],
    ),
    (
        Species::ChrysomyaMegacephala,
        10.5,
        [
            (16.0, 26.0, Some(11.5)),
            (26.0, 46.0, Some(15.5)),
            (46.0, 98.0, Some(21.0)),
            (98.0, 185.0, None),
        ],
    ),
    (
        Species::LuciliaCuprina,
        8.5,
        [
            (19.0, 29.0, Some(7.5)),
            (29.0, 49.0, Some(11.5)),
            (49.0, 110.0, Some(16.5)),
            (110.0, 205.0, None),
        ],
    ),
    (
        Species::CalliphoraVomitoria,
        5.5,
        [
            (21.0, 33.0, Some(10.5)),
            (33.0, 60.0, Some(14.5)),
            (60.0, 135.0, Some(19.0)),
            (135.0, 265.0, None),
        ],
    ),
    (
        Species::ProtophormiaTerraenovae,
        4.0,
        [
            (24.0, 36.0, Some(8.5)),
            (36.0, 66.0, Some(12.5)),
            (66.0, 150.0, Some(15.5)),
            (150.0, 295.0, None),
        ],
    ),
    (
        Species::SarcophagaBullata,
        9.0,
        [
            (28.0, 42.0, Some(9.0)),
            (42.0, 72.0, Some(13.0)),
            (72.0, 155.0, Some(17.0)),
            (155.0, 305.0, None),
        ],
    ),
    (
        Species::SarcophagaCrassipalpis,
        8.5,
        [
            (30.0, 44.0, Some(8.5)),
            (44.0, 76.0, Some(12.5)),
            (76.0, 160.0, Some(16.5)),
            (160.0, 315.0, None),
        ],
    ),
    (
        Species::SarcophagaHaemorrhoidalis,
        9.5,
        [
            (26.0, 40.0, Some(9.5)),
            (40.0, 70.0, Some(13.5)),
            (70.0, 150.0, Some(18.0)),
            (150.0, 295.0, None),
        ],
    ),
    (
        Species::BoettcheriscaPeregrina,
        11.0,
        [
            (32.0, 46.0, Some(10.0)),
            (46.0, 78.0, Some(14.0)),
            (78.0, 165.0, Some(18.5)),
            (165.0, 325.0, None),
        ],
    ),
];

static THRESHOLDS: Lazy<HashMap<(Species, DevelopmentStage), DevelopmentThreshold>> =
    Lazy::new(|| {
        let mut table = HashMap::with_capacity(REFERENCE_DATA.len() * 4);
        for (species, base_temp_c, rows) in REFERENCE_DATA.iter() {
            for (stage, (min_add, max_add, typical_length_mm)) in
                DevelopmentStage::ALL.iter().zip(rows.iter())
            {
                table.insert(
                    (*species, *stage),
                    DevelopmentThreshold {
                        species: *species,
                        stage: *stage,
                        min_add: *min_add,
                        max_add: *max_add,
                        base_temp_c: *base_temp_c,
                        typical_length_mm: *typical_length_mm,
                        family: species.family(),
                    },
                );
            }
        }
        table
    });

/// Look up the development threshold for a species at a stage
pub fn development_threshold(
    species: Species,
    stage: DevelopmentStage,
) -> Result<&'static DevelopmentThreshold> {
    THRESHOLDS.get(&(species, stage)).ok_or_else(|| {
        Error::NotFound(format!(
            "No development data available for {} at {}",
            species, stage
        ))
    })
}

/// All thresholds for a species, in canonical stage order
pub fn thresholds_for(species: Species) -> Vec<&'static DevelopmentThreshold> {
    DevelopmentStage::ALL
        .iter()
        .filter_map(|stage| THRESHOLDS.get(&(species, *stage)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_complete() {
        for species in Species::ALL {
            for stage in DevelopmentStage::ALL {
                assert!(
                    development_threshold(species, stage).is_ok(),
                    "missing {} {}",
                    species,
                    stage
                );
            }
        }
    }

    #[test]
    fn test_threshold_invariants() {
        for species in Species::ALL {
            for threshold in thresholds_for(species) {
                assert!(threshold.min_add < threshold.max_add);
                assert!(threshold.base_temp_c.is_finite());
                assert_eq!(threshold.family, species.family());
                if threshold.stage == DevelopmentStage::Pupa {
                    assert!(threshold.typical_length_mm.is_none());
                } else {
                    assert!(threshold.typical_length_mm.is_some());
                }
            }
        }
    }

    #[test]
    fn test_lucilia_sericata_third_instar() {
        let t = development_threshold(Species::LuciliaSericata, DevelopmentStage::ThirdInstar)
            .unwrap();
        assert_eq!(t.min_add, 48.0);
        assert_eq!(t.max_add, 108.0);
        assert_eq!(t.base_temp_c, 8.0);
        assert_eq!(t.typical_length_mm, Some(17.0));
        assert_eq!(t.mid_add(), 78.0);
        assert_eq!(t.add_span(), 60.0);
    }

    #[test]
    fn test_stages_are_contiguous() {
        for species in Species::ALL {
            let rows = thresholds_for(species);
            assert_eq!(rows.len(), 4);
            for pair in rows.windows(2) {
                assert_eq!(pair[0].max_add, pair[1].min_add);
            }
        }
    }
}
