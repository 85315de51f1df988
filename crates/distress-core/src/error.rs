use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistressError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid period key '{key}' in source '{source_name}': expected YYYY-MM-DD")]
    InvalidPeriodKey { source_name: String, key: String },

    #[error("Invalid model definition '{model_key}': {reason}")]
    InvalidModel { model_key: String, reason: String },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DistressError {
    fn from(e: serde_json::Error) -> Self {
        DistressError::SerializationError(e.to_string())
    }
}
