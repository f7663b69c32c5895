use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed request parameters, rejected before any model call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model artifacts failed to load, are still loading, or are corrupt
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The external predictor did not answer within its bound
    #[error("External predictor timed out after {0} ms")]
    ExternalPredictorTimeout(u64),

    /// External predictor failures other than timeouts
    #[error("External predictor error ({predictor}): {message}")]
    External { predictor: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// HTTP-equivalent status code for callers that expose the engine over a wire
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::ModelUnavailable(_) => 503,
            AppError::ExternalPredictorTimeout(_) => 504,
            AppError::External { .. } => 502,
            AppError::Configuration(_) => 500,
            AppError::Io(_) => 500,
            AppError::Serialization(_) => 500,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::ExternalPredictorTimeout(_) => "EXTERNAL_PREDICTOR_TIMEOUT",
            AppError::External { .. } => "EXTERNAL_PREDICTOR_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the caller supplied something wrong (4xx-equivalent)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from toml::de::Error
impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Conversion from reqwest::Error
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::External {
            predictor: "http".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::InvalidInput("top_k".to_string()).status_code(), 400);
        assert_eq!(
            AppError::ModelUnavailable("loading".to_string()).status_code(),
            503
        );
        assert_eq!(AppError::ExternalPredictorTimeout(2000).status_code(), 504);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::InvalidInput("test".to_string()).error_code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            AppError::ModelUnavailable("test".to_string()).error_code(),
            "MODEL_UNAVAILABLE"
        );
        assert_eq!(
            AppError::ExternalPredictorTimeout(10).error_code(),
            "EXTERNAL_PREDICTOR_TIMEOUT"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(AppError::InvalidInput("x".to_string()).is_client_error());
        assert!(!AppError::ModelUnavailable("x".to_string()).is_client_error());
    }
}
