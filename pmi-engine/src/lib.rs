//! # PMI Engine
//!
//! Multi-method postmortem interval estimation and validation:
//! - Single-method accumulated degree day estimator
//! - Seven alternative estimation methods with consensus and agreement scoring
//! - Uncertainty propagation, Monte Carlo simulation, cross-validation and
//!   literature case validation
//! - Multi-specimen reconciliation with conflict detection
//! - JSON export of every result structure

pub mod case;
pub mod config;
pub mod estimator;
pub mod export;
pub mod methods;
pub mod specimens;
pub mod stats;
pub mod validation;

pub use config::EngineConfig;
pub use estimator::{PmiEstimator, SingleMethodEstimate};
pub use methods::{AlternativeMethodsEngine, ComparativeResult, PmiEstimate, PmiMethod};
pub use specimens::{MultiSpecimenAnalyzer, MultiSpecimenResult, SpecimenData};
pub use validation::{EnhancedValidator, MonteCarloResult, ValidationReport};
