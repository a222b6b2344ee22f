//! Error types for smoothing and evaluation.

use thiserror::Error;

/// Remediation hint attached to failures of the penalized solve.
pub(crate) const SOLVE_HINT: &str =
    "try reducing knots per axis or the regularization strength (lambda)";

/// Smoothing error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmoothingError {
    /// A smoothing parameter violates its constraint.
    /// Raised before any construction work is done.
    #[error("invalid {param}: {reason}")]
    InvalidConfig {
        /// Name of the offending parameter
        param: &'static str,
        /// Violated constraint
        reason: String,
    },

    /// Grid coordinates and values are inconsistent
    #[error("shape error: {0}")]
    Shape(String),

    /// Observation point passed to an evaluator is unusable
    #[error("query error: {0}")]
    Query(String),

    /// The penalized normal equations could not be solved
    #[error("failed to solve N-D P-spline system ({reason}); {hint}")]
    Solve {
        /// Underlying cause reported by the solver
        reason: String,
        /// What the caller can change to recover
        hint: &'static str,
    },

    /// Any other failure during construction or solve
    #[error("unexpected smoothing failure: {0}")]
    Unexpected(String),
}

impl SmoothingError {
    pub(crate) fn config(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            param,
            reason: reason.into(),
        }
    }

    pub(crate) fn solve(reason: impl Into<String>) -> Self {
        Self::Solve {
            reason: reason.into(),
            hint: SOLVE_HINT,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SmoothingError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_solve_message_names_remediation() {
        let err = SmoothingError::solve("matrix is not positive definite");
        let msg = err.to_string();
        assert!(msg.contains("not positive definite"));
        assert!(msg.contains("reducing knots per axis"));
        assert!(matches!(err, SmoothingError::Solve { .. }));
    }

    #[test]
    fn test_config_message_names_param() {
        let err = SmoothingError::config("degree", "must be between 1 and 5, got 6");
        assert_eq!(err.to_string(), "invalid degree: must be between 1 and 5, got 6");
        assert!(matches!(err, SmoothingError::InvalidConfig { param: "degree", .. }));
    }
}
