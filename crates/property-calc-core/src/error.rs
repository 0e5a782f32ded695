use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtyError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Computation degenerate: {context}")]
    ComputationDegenerate { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RealtyError {
    /// Shorthand for the most common error variant.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RealtyError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn degenerate(context: impl Into<String>) -> Self {
        RealtyError::ComputationDegenerate {
            context: context.into(),
        }
    }

    /// Stable snake_case tag for machine consumers (batch output, CLI).
    pub fn kind(&self) -> &'static str {
        match self {
            RealtyError::InvalidInput { .. } => "invalid_input",
            RealtyError::ComputationDegenerate { .. } => "computation_degenerate",
            RealtyError::SerializationError(_) => "serialization_error",
            RealtyError::ConfigError(_) => "config_error",
        }
    }
}

impl From<serde_json::Error> for RealtyError {
    fn from(e: serde_json::Error) -> Self {
        RealtyError::SerializationError(e.to_string())
    }
}
