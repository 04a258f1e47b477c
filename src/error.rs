//! Error types for insight evaluation
//!
//! Errors are classified by scope:
//! - Fatal: the sample store cannot be reached, nothing was checked
//! - Per-entity: one entity's data could not be evaluated, the batch continues
//! - Setup: configuration or snapshot files could not be loaded

use thiserror::Error;

/// Error types for insight evaluation
#[derive(Debug, Error)]
pub enum EngineError {
    // Fatal for a whole aggregation call
    #[error("Sample store unavailable: {0}")]
    UpstreamUnavailable(String),

    // Per-entity failures
    #[error("Malformed sample for {entity_id}: {reason}")]
    MalformedSample { entity_id: String, reason: String },

    // Setup errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Unknown widget: {0}")]
    UnknownWidget(String),
}

impl EngineError {
    /// Returns true if this error must abort the whole evaluation call
    pub fn is_fatal(&self) -> bool {
        !self.is_per_entity()
    }

    /// Returns true if this error is scoped to a single entity
    pub fn is_per_entity(&self) -> bool {
        matches!(self, EngineError::MalformedSample { .. })
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EngineError::UpstreamUnavailable(_) => {
                "Metrics could not be checked. Verify the measurement store is reachable."
            }
            EngineError::MalformedSample { .. } => {
                "Inspect the measurement job for this entity."
            }
            EngineError::ConfigurationError(_) => "Check the insights configuration file.",
            EngineError::ParseError(_) => "Check the file format is correct.",
            EngineError::IoError(_) => "Check file permissions and paths.",
            EngineError::UnknownWidget(_) => "Check the widget slug against the registry.",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::ParseError(err.to_string())
    }
}

/// Serializable failure representation for dashboard consumers.
///
/// Lets a caller render "evaluation failed" distinctly from an empty alert list.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationFailure {
    pub message: String,
    pub error_type: ErrorType,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Fatal,
    Entity,
}

impl From<&EngineError> for EvaluationFailure {
    fn from(err: &EngineError) -> Self {
        let error_type = if err.is_per_entity() {
            ErrorType::Entity
        } else {
            ErrorType::Fatal
        };

        EvaluationFailure {
            message: err.to_string(),
            error_type,
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_unavailable_is_fatal() {
        let err = EngineError::UpstreamUnavailable("connection refused".to_string());
        assert!(err.is_fatal());
        let failure = EvaluationFailure::from(&err);
        assert_eq!(failure.error_type, ErrorType::Fatal);
        assert!(failure.message.contains("connection refused"));
    }

    #[test]
    fn test_malformed_sample_is_per_entity() {
        let err = EngineError::MalformedSample {
            entity_id: "prefix-1".to_string(),
            reason: "NaN value".to_string(),
        };
        assert!(err.is_per_entity());
        assert!(!err.is_fatal());
        assert_eq!(EvaluationFailure::from(&err).error_type, ErrorType::Entity);
    }

    #[test]
    fn test_failure_serializes_camel_case() {
        let err = EngineError::ConfigurationError("bad window".to_string());
        let json = serde_json::to_value(EvaluationFailure::from(&err)).unwrap();
        assert_eq!(json["errorType"], "fatal");
        assert!(json["recoverySuggestion"].as_str().unwrap().contains("configuration"));
    }
}
