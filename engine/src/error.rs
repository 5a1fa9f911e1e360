//! Engine error handling
//!
//! This module provides unified error handling for the engine and converts
//! errors to the structured `{success: false, error, code}` failure shape.

use nutrition_engine_shared::types::FailureResponse;
use nutrition_engine_shared::validation::{join_messages, ValidationError};
use nutrition_engine_shared::InputError;
use thiserror::Error;
use tracing::error;

/// Engine error type that can be converted to a failure response
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Optimization infeasible: {0}")]
    Infeasible(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::Infeasible(_) => "INFEASIBLE",
            EngineError::Configuration(_) => "CONFIGURATION_ERROR",
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<Vec<ValidationError>> for EngineError {
    fn from(errors: Vec<ValidationError>) -> Self {
        EngineError::Validation(join_messages(&errors))
    }
}

impl From<InputError> for EngineError {
    fn from(err: InputError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<&EngineError> for FailureResponse {
    fn from(err: &EngineError) -> Self {
        let message = match err {
            EngineError::Validation(msg)
            | EngineError::Infeasible(msg)
            | EngineError::Configuration(msg) => msg.clone(),
            EngineError::Internal(inner) => {
                error!("Internal error: {:?}", inner);
                "An internal error occurred".to_string()
            }
        };

        FailureResponse::new(err.code(), message)
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
