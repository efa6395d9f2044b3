//! # PMI Common Library
//!
//! Shared code for the postmortem interval estimation engine including:
//! - Error types
//! - Species, development stage and insect family identifiers
//! - The development threshold reference table
//! - Temperature records
//! - Data quality tiers
//! - Configuration loading
//! - Human-readable interval formatting

pub mod config;
pub mod error;
pub mod human_time;
pub mod quality;
pub mod species;
pub mod temperature;
pub mod thresholds;

pub use error::{Error, Result};
pub use quality::DataQuality;
pub use species::{DevelopmentStage, InsectFamily, Species, SpeciesInfo};
pub use temperature::TemperatureReading;
pub use thresholds::{development_threshold, DevelopmentThreshold};
