//! Error types shared by the engine crates

use thiserror::Error;

/// Input parsing and validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}
