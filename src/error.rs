//! Error types for riesgo operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for riesgo operations.
///
/// Covers the inference pipeline's failure taxonomy: missing trained
/// artifacts, feature-vector shape mismatches, and exhausted attribution
/// fallbacks, plus the ambient I/O and serialization failures of the
/// artifact loader.
///
/// # Examples
///
/// ```
/// use riesgo::error::RiesgoError;
///
/// let err = RiesgoError::InputShape { expected: 6, actual: 4 };
/// assert!(err.to_string().contains("expected 6"));
/// ```
#[derive(Debug)]
pub enum RiesgoError {
    /// A required trained artifact could not be found.
    ///
    /// Fatal to the current request; remediable only by (re)training and
    /// reloading artifacts.
    ArtifactMissing {
        /// Path that was probed
        path: String,
        /// How to fix the situation
        remediation: String,
    },

    /// Feature vector length does not match the loaded artifact bundle.
    InputShape {
        /// Expected number of features
        expected: usize,
        /// Actual number of features supplied
        actual: usize,
    },

    /// Attribution failed after exhausting the fallback ladder.
    Explanation {
        /// Underlying cause
        cause: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for RiesgoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiesgoError::ArtifactMissing { path, remediation } => {
                write!(f, "Artifact not found: {path} ({remediation})")
            }
            RiesgoError::InputShape { expected, actual } => {
                write!(
                    f,
                    "Input shape mismatch: expected {expected} features, got {actual}"
                )
            }
            RiesgoError::Explanation { cause } => {
                write!(f, "Error generating explanation: {cause}")
            }
            RiesgoError::Io(e) => write!(f, "I/O error: {e}"),
            RiesgoError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            RiesgoError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RiesgoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RiesgoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RiesgoError {
    fn from(err: std::io::Error) -> Self {
        RiesgoError::Io(err)
    }
}

impl From<&str> for RiesgoError {
    fn from(msg: &str) -> Self {
        RiesgoError::Other(msg.to_string())
    }
}

impl From<String> for RiesgoError {
    fn from(msg: String) -> Self {
        RiesgoError::Other(msg)
    }
}

impl RiesgoError {
    /// Create an artifact-missing error with the standard remediation hint.
    #[must_use]
    pub fn artifact_missing(path: impl Into<String>) -> Self {
        Self::ArtifactMissing {
            path: path.into(),
            remediation: "run training first".to_string(),
        }
    }

    /// Create an explanation error from any displayable cause.
    #[must_use]
    pub fn explanation(cause: impl fmt::Display) -> Self {
        Self::Explanation {
            cause: cause.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, RiesgoError>;
