//! Common error types for PMI estimation

use thiserror::Error;

/// Common result type for PMI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the estimation engine
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing required input (e.g. a length-based method without a length)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Temperature at or below the base development temperature
    #[error(
        "No development possible: temperature {temp_c:.2}°C is at or below base temperature {base_temp_c:.2}°C"
    )]
    Domain { temp_c: f64, base_temp_c: f64 },

    /// Every method of a requested batch failed
    #[error("No usable method: {0}")]
    Aggregation(String),

    /// Monte Carlo simulation could not produce usable samples
    #[error("Sampling error: {0}")]
    Sampling(String),

    /// Reference data not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (wraps serde_json::Error)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for the "no development possible" condition
    pub fn is_domain(&self) -> bool {
        matches!(self, Error::Domain { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_message_names_both_temperatures() {
        let err = Error::Domain {
            temp_c: 5.0,
            base_temp_c: 8.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("5.00°C"));
        assert!(msg.contains("8.00°C"));
        assert!(err.is_domain());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_domain());
    }
}
