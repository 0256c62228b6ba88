// src/error.rs
use thiserror::Error;

/// Error types for the convertible-fd library
#[derive(Error, Debug)]
pub enum PricingError {
    /// Parameter outside the model domain (non-positive, non-finite, ...)
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameter {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Invalid engine configuration
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Finite-difference solve interrupted through a cancellation token
    #[error("Finite-difference solve cancelled after {completed_steps} of {total_steps} time steps")]
    Cancelled {
        completed_steps: usize,
        total_steps: usize,
    },

    /// Failure writing an export file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure encoding or decoding JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for convertible-fd operations
pub type CbResult<T> = Result<T, PricingError>;

/// Validation utilities
pub mod validation {
    use super::{CbResult, PricingError};

    fn invalid(name: &str, value: f64, constraint: impl Into<String>) -> PricingError {
        PricingError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: constraint.into(),
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> CbResult<()> {
        if !value.is_finite() {
            Err(invalid(name, value, "must be finite (not NaN or infinite)"))
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is finite and positive
    pub fn validate_positive(name: &str, value: f64) -> CbResult<()> {
        validate_finite(name, value)?;
        if value <= 0.0 {
            Err(invalid(name, value, "must be positive (> 0)"))
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is finite and at least `min`
    pub fn validate_at_least(name: &str, value: f64, min: f64) -> CbResult<()> {
        validate_finite(name, value)?;
        if value < min {
            Err(invalid(name, value, format!("must be at least {}", min)))
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is finite and non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> CbResult<()> {
        validate_at_least(name, value, 0.0)
    }

    /// Largest accepted price or time step count
    pub const MAX_GRID_STEPS: usize = 100_000;

    /// Validate a grid step count
    pub fn validate_steps(name: &str, steps: usize) -> CbResult<()> {
        if steps == 0 {
            Err(invalid(name, 0.0, "must be a positive integer"))
        } else if steps > MAX_GRID_STEPS {
            Err(invalid(
                name,
                steps as f64,
                format!("exceeds maximum allowed ({})", MAX_GRID_STEPS),
            ))
        } else {
            Ok(())
        }
    }
}
