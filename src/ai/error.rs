use thiserror::Error;

/// Ways an extraction can fail. Validation failures keep their own
/// kind so callers can tell an unreachable model apart from a model
/// that replied with garbage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No credential for the model API
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network, authentication, quota or timeout failure from the model
    #[error("Model request failed: {0}")]
    CollaboratorUnavailable(String),

    /// The model reply is not JSON
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// The model reply is JSON but not an action batch
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
}

impl ExtractionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Configuration(_) => "configuration",
            ExtractionError::CollaboratorUnavailable(_) => "collaborator_unavailable",
            ExtractionError::MalformedResponse(_) => "malformed_response",
            ExtractionError::SchemaViolation(_) => "schema_violation",
        }
    }
}
