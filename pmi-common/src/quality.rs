//! Five-tier data quality scale shared by specimen scoring and reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data quality rating derived from a 0–100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    /// 90–100
    Excellent,
    /// 70–89
    Good,
    /// 50–69
    Fair,
    /// 30–49
    Poor,
    /// below 30
    Unreliable,
}

impl DataQuality {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            DataQuality::Excellent
        } else if score >= 70.0 {
            DataQuality::Good
        } else if score >= 50.0 {
            DataQuality::Fair
        } else if score >= 30.0 {
            DataQuality::Poor
        } else {
            DataQuality::Unreliable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataQuality::Excellent => "excellent",
            DataQuality::Good => "good",
            DataQuality::Fair => "fair",
            DataQuality::Poor => "poor",
            DataQuality::Unreliable => "unreliable",
        }
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
