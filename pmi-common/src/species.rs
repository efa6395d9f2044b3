//! Forensically important species and their development stages
//!
//! Identifiers serialize to the snake_case strings used in case files
//! (`"lucilia_sericata"`, `"3rd_instar"`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Insect family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsectFamily {
    /// Blow flies, primary colonizers
    Calliphoridae,
    /// Flesh flies, secondary colonizers
    Sarcophagidae,
}

impl InsectFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsectFamily::Calliphoridae => "calliphoridae",
            InsectFamily::Sarcophagidae => "sarcophagidae",
        }
    }
}

/// Forensically important Diptera species with reference development data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    ChrysomyaRufifacies,
    LuciliaSericata,
    CalliphoraVicina,
    CochliomyiaMacellaria,
    PhormiaRegina,
    ChrysomyaMegacephala,
    LuciliaCuprina,
    CalliphoraVomitoria,
    ProtophormiaTerraenovae,
    SarcophagaBullata,
    SarcophagaCrassipalpis,
    SarcophagaHaemorrhoidalis,
    BoettcheriscaPeregrina,
}

impl Species {
    pub const ALL: [Species; 13] = [
        Species::ChrysomyaRufifacies,
        Species::LuciliaSericata,
        Species::CalliphoraVicina,
        Species::CochliomyiaMacellaria,
        Species::PhormiaRegina,
        Species::ChrysomyaMegacephala,
        Species::LuciliaCuprina,
        Species::CalliphoraVomitoria,
        Species::ProtophormiaTerraenovae,
        Species::SarcophagaBullata,
        Species::SarcophagaCrassipalpis,
        Species::SarcophagaHaemorrhoidalis,
        Species::BoettcheriscaPeregrina,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::ChrysomyaRufifacies => "chrysomya_rufifacies",
            Species::LuciliaSericata => "lucilia_sericata",
            Species::CalliphoraVicina => "calliphora_vicina",
            Species::CochliomyiaMacellaria => "cochliomyia_macellaria",
            Species::PhormiaRegina => "phormia_regina",
            Species::ChrysomyaMegacephala => "chrysomya_megacephala",
            Species::LuciliaCuprina => "lucilia_cuprina",
            Species::CalliphoraVomitoria => "calliphora_vomitoria",
            Species::ProtophormiaTerraenovae => "protophormia_terraenovae",
            Species::SarcophagaBullata => "sarcophaga_bullata",
            Species::SarcophagaCrassipalpis => "sarcophaga_crassipalpis",
            Species::SarcophagaHaemorrhoidalis => "sarcophaga_haemorrhoidalis",
            Species::BoettcheriscaPeregrina => "boettcherisca_peregrina",
        }
    }

    pub fn family(&self) -> InsectFamily {
        match self {
            Species::SarcophagaBullata
            | Species::SarcophagaCrassipalpis
            | Species::SarcophagaHaemorrhoidalis
            | Species::BoettcheriscaPeregrina => InsectFamily::Sarcophagidae,
            _ => InsectFamily::Calliphoridae,
        }
    }

    /// Descriptive reference information for reports
    pub fn info(&self) -> SpeciesInfo {
        let (common_name, optimal_range, habitat) = match self {
            Species::ChrysomyaRufifacies => (
                "Hairy Maggot Blow Fly",
                "Warm climates, 15-35°C optimal",
                "Decomposing organic matter, carrion",
            ),
            Species::LuciliaSericata => (
                "Green Bottle Fly",
                "Temperate climates, 10-30°C optimal",
                "Fresh carrion, wounds",
            ),
            Species::CalliphoraVicina => (
                "Blue Bottle Fly",
                "Cool climates, 5-25°C optimal",
                "Carrion, decomposing organic matter",
            ),
            Species::CochliomyiaMacellaria => (
                "Secondary Screwworm",
                "Warm climates, 18-35°C optimal",
                "Carrion, wounds",
            ),
            Species::PhormiaRegina => (
                "Black Blow Fly",
                "Cool to temperate climates, 5-28°C optimal",
                "Carrion, decomposing organic matter",
            ),
            Species::ChrysomyaMegacephala => (
                "Oriental Latrine Fly",
                "Tropical climates, 16-36°C optimal",
                "Carrion, feces, decomposing matter",
            ),
            Species::LuciliaCuprina => (
                "Australian Sheep Blowfly",
                "Warm temperate, 12-32°C optimal",
                "Carrion, wounds, living tissue",
            ),
            Species::CalliphoraVomitoria => (
                "Blue Bottle Fly",
                "Cool climates, 4-26°C optimal",
                "Carrion, organic waste",
            ),
            Species::ProtophormiaTerraenovae => (
                "Northern Blow Fly",
                "Cold climates, 2-30°C optimal",
                "Carrion, decomposing matter",
            ),
            Species::SarcophagaBullata => (
                "Grey Flesh Fly",
                "Temperate climates, 12-32°C optimal",
                "Decomposing carrion, organic matter",
            ),
            Species::SarcophagaCrassipalpis => (
                "Flesh Fly",
                "Temperate climates, 10-30°C optimal",
                "Carrion, decomposing organic matter",
            ),
            Species::SarcophagaHaemorrhoidalis => (
                "Red-tailed Flesh Fly",
                "Warm climates, 14-34°C optimal",
                "Carrion, wounds, decomposing matter",
            ),
            Species::BoettcheriscaPeregrina => (
                "Joppa Flesh Fly",
                "Warm climates, 16-35°C optimal",
                "Carrion, organic waste",
            ),
        };

        let family = self.family();
        let colonization = match family {
            InsectFamily::Calliphoridae => "Primary (0-3 days)",
            InsectFamily::Sarcophagidae => "Secondary (3-25 days)",
        };

        SpeciesInfo {
            species: *self,
            common_name,
            family,
            optimal_range,
            habitat,
            colonization,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-', '.'], "_");
        Species::ALL
            .iter()
            .copied()
            .find(|species| species.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown species: {}", s)))
    }
}

/// General reference information about a species
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesInfo {
    pub species: Species,
    pub common_name: &'static str,
    pub family: InsectFamily,
    pub optimal_range: &'static str,
    pub habitat: &'static str,
    pub colonization: &'static str,
}

/// Immature development stage, in developmental order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DevelopmentStage {
    #[serde(rename = "1st_instar")]
    FirstInstar,
    #[serde(rename = "2nd_instar")]
    SecondInstar,
    #[serde(rename = "3rd_instar")]
    ThirdInstar,
    #[serde(rename = "pupa")]
    Pupa,
}

impl DevelopmentStage {
    /// Canonical developmental order
    pub const ALL: [DevelopmentStage; 4] = [
        DevelopmentStage::FirstInstar,
        DevelopmentStage::SecondInstar,
        DevelopmentStage::ThirdInstar,
        DevelopmentStage::Pupa,
    ];

    /// Position in the canonical order (1st instar = 0, pupa = 3)
    pub fn ordinal(&self) -> usize {
        match self {
            DevelopmentStage::FirstInstar => 0,
            DevelopmentStage::SecondInstar => 1,
            DevelopmentStage::ThirdInstar => 2,
            DevelopmentStage::Pupa => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DevelopmentStage::FirstInstar => "1st_instar",
            DevelopmentStage::SecondInstar => "2nd_instar",
            DevelopmentStage::ThirdInstar => "3rd_instar",
            DevelopmentStage::Pupa => "pupa",
        }
    }
}

impl fmt::Display for DevelopmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DevelopmentStage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        DevelopmentStage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown development stage: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_serde_names() {
        let json = serde_json::to_string(&Species::LuciliaSericata).unwrap();
        assert_eq!(json, "\"lucilia_sericata\"");

        let parsed: Species = serde_json::from_str("\"boettcherisca_peregrina\"").unwrap();
        assert_eq!(parsed, Species::BoettcheriscaPeregrina);
    }

    #[test]
    fn test_species_as_str_matches_serde() {
        for species in Species::ALL {
            let json = serde_json::to_string(&species).unwrap();
            assert_eq!(json, format!("\"{}\"", species.as_str()));
        }
    }

    #[test]
    fn test_species_from_str_normalizes() {
        assert_eq!(
            "Lucilia sericata".parse::<Species>().unwrap(),
            Species::LuciliaSericata
        );
        assert_eq!(
            "calliphora-vicina".parse::<Species>().unwrap(),
            Species::CalliphoraVicina
        );
        assert!("musca_domestica".parse::<Species>().is_err());
    }

    #[test]
    fn test_family_assignment() {
        let sarcophagids: Vec<_> = Species::ALL
            .iter()
            .filter(|s| s.family() == InsectFamily::Sarcophagidae)
            .collect();
        assert_eq!(sarcophagids.len(), 4);
        assert_eq!(Species::PhormiaRegina.family(), InsectFamily::Calliphoridae);
    }

    #[test]
    fn test_species_info_colonization_follows_family() {
        assert_eq!(
            Species::SarcophagaBullata.info().colonization,
            "Secondary (3-25 days)"
        );
        let info = Species::LuciliaSericata.info();
        assert_eq!(info.common_name, "Green Bottle Fly");
        assert_eq!(info.colonization, "Primary (0-3 days)");
    }

    #[test]
    fn test_stage_serde_and_order() {
        let json = serde_json::to_string(&DevelopmentStage::ThirdInstar).unwrap();
        assert_eq!(json, "\"3rd_instar\"");

        let parsed: DevelopmentStage = serde_json::from_str("\"pupa\"").unwrap();
        assert_eq!(parsed, DevelopmentStage::Pupa);

        for (i, stage) in DevelopmentStage::ALL.iter().enumerate() {
            assert_eq!(stage.ordinal(), i);
        }
        assert!(DevelopmentStage::FirstInstar < DevelopmentStage::Pupa);
    }

    #[test]
    fn test_stage_from_str() {
        assert_eq!(
            "2nd instar".parse::<DevelopmentStage>().unwrap(),
            DevelopmentStage::SecondInstar
        );
        assert!("egg".parse::<DevelopmentStage>().is_err());
    }
}
