//! Error types for the recognition pipeline.

use thiserror::Error;

/// Errors raised while configuring, loading, drawing or classifying.
#[derive(Debug, Error)]
pub enum RecognizerError {
    /// Configuration values that cannot drive a session.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Embedded or user supplied configuration is not valid JSON.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A model resource could not be turned into a session.
    #[error("model '{key}' failed to load: {reason}")]
    ModelLoad {
        /// Key of the model whose load rejected.
        key: String,
        /// Message reported by the engine.
        reason: String,
    },

    /// The inference engine faulted while running a model.
    #[error("inference engine error: {0}")]
    Engine(String),

    /// A session declares no input or output names to bind against.
    #[error("session declares no {0} names")]
    MissingBinding(&'static str),

    /// The engine's output map lacks the declared output.
    #[error("engine output is missing tensor '{0}'")]
    MissingOutput(String),

    /// A tensor or vector had the wrong number of elements.
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch {
        /// Expected element count.
        expected: usize,
        /// Actual element count.
        actual: usize,
    },

    /// The drawing surface could not paint or read back pixels.
    #[error("drawing surface error: {0}")]
    Surface(String),

    /// A lifecycle transition was requested from the wrong phase.
    #[error("cannot {action} while session is {phase}")]
    InvalidTransition {
        /// What was attempted.
        action: &'static str,
        /// Phase the session was in.
        phase: &'static str,
    },
}

impl RecognizerError {
    /// Creates a shape mismatch error.
    pub fn shape_mismatch(expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// Creates a model load error for `key`.
    pub fn model_load(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RecognizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecognizerError::shape_mismatch(10, 3);
        assert_eq!(format!("{}", err), "shape mismatch: expected 10 values, got 3");

        let err = RecognizerError::model_load("600", "404 Not Found");
        assert_eq!(format!("{}", err), "model '600' failed to load: 404 Not Found");

        let err = RecognizerError::MissingBinding("input");
        assert_eq!(format!("{}", err), "session declares no input names");
    }

    #[test]
    fn test_parse_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: RecognizerError = parse.into();
        assert!(matches!(err, RecognizerError::ConfigParse(_)));
    }
}
