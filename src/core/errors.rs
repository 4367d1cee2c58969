use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The exchange answered, but the call must be treated as rejected
    #[error("Request rejected: {0}")]
    HardError(String),

    /// The exchange processed the call and flagged an application-level error
    #[error("API error: {code} - {message}")]
    ApiError { code: String, message: String },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Malformed pair: {0}")]
    MalformedPair(String),

    #[error("Market data unavailable: {0}")]
    MarketDataUnavailable(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<crate::core::types::TypesError> for ExchangeError {
    fn from(err: crate::core::types::TypesError) -> Self {
        match err {
            crate::core::types::TypesError::MalformedPair(pair) => Self::MalformedPair(pair),
            other => Self::DeserializationError(other.to_string()),
        }
    }
}
