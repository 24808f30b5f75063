//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for toolpath planning and
//! parameter validation. Expected "nothing to do" results are not errors;
//! planners report those through [`millkit_core::Outcome`].

use thiserror::Error;

/// Errors that can occur during toolpath planning.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Invalid parameters were provided to a planner.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A geometry operation failed during toolpath creation.
    #[error("Geometry error: {0}")]
    GeometryError(String),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

/// Errors related to planner parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// Parameters are mutually incompatible.
    #[error("Incompatible parameters: {0}")]
    Incompatible(String),

    /// Dimensions are invalid (zero or negative).
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

impl ParameterError {
    /// Reject zero, negative and non-finite values
    pub fn require_positive(name: &str, value: f64) -> ParameterResult<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidValue {
                name: name.to_string(),
                reason: format!("must be positive, got {}", value),
            })
        }
    }
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;
