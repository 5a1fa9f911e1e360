//! Nutrition Engine Shared Library
//!
//! This crate contains the domain models, health formulas and statistics
//! used by the engine and the WASM module.

pub mod errors;
pub mod health_metrics;
pub mod models;
pub mod statistics;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use health_metrics::*;
pub use models::*;
pub use statistics::*;
pub use types::*;
