//! Ambient temperature record consumed by every estimator

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Lowest average temperature accepted for estimation (°C)
pub const MIN_ESTIMATION_TEMP_C: f64 = -20.0;

/// Highest average temperature accepted for estimation (°C)
pub const MAX_ESTIMATION_TEMP_C: f64 = 50.0;

/// Temperature record for the scene
///
/// Produced by the weather collaborator or supplied directly by a caller
/// (e.g. a manual override). Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    #[serde(alias = "avg_temp")]
    pub avg_temp_c: f64,

    #[serde(default, alias = "min_temp", skip_serializing_if = "Option::is_none")]
    pub min_temp_c: Option<f64>,

    #[serde(default, alias = "max_temp", skip_serializing_if = "Option::is_none")]
    pub max_temp_c: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,

    /// Where the reading came from (station, model, manual override)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TemperatureReading {
    pub fn new(avg_temp_c: f64) -> Self {
        Self {
            avg_temp_c,
            min_temp_c: None,
            max_temp_c: None,
            location: None,
            date_range: None,
            source: None,
        }
    }

    pub fn with_range(mut self, min_temp_c: f64, max_temp_c: f64) -> Self {
        self.min_temp_c = Some(min_temp_c);
        self.max_temp_c = Some(max_temp_c);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Daily span (max − min) when both extremes are known
    pub fn variation(&self) -> Option<f64> {
        match (self.min_temp_c, self.max_temp_c) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }

    /// Reject non-finite values
    pub fn ensure_finite(&self) -> Result<()> {
        let fields = [
            ("avg_temp_c", Some(self.avg_temp_c)),
            ("min_temp_c", self.min_temp_c),
            ("max_temp_c", self.max_temp_c),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(Error::InvalidInput(format!(
                        "Temperature field {} is not a finite number",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Check that the reading is usable for PMI estimation
    ///
    /// The average must be finite and within −20..50 °C.
    pub fn validate(&self) -> Result<()> {
        self.ensure_finite()?;
        if self.avg_temp_c < MIN_ESTIMATION_TEMP_C || self.avg_temp_c > MAX_ESTIMATION_TEMP_C {
            return Err(Error::InvalidInput(format!(
                "Temperature {}°C is outside reasonable range ({}°C to {}°C)",
                self.avg_temp_c, MIN_ESTIMATION_TEMP_C, MAX_ESTIMATION_TEMP_C
            )));
        }
        Ok(())
    }
}
