use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtyError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RealtyError {
    fn from(e: serde_json::Error) -> Self {
        RealtyError::SerializationError(e.to_string())
    }
}

impl RealtyError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        RealtyError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
