//! Error types and handling for `TravelAssist`

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Service name attached to weather API errors
pub const WEATHER_SERVICE: &str = "Weather API";

/// Machine-readable classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalid,
    ValidationFailed,
    ApiNetworkError,
    ApiUnauthorized,
    ApiRateLimit,
    ApiNotFound,
    ApiServerError,
    ApiInvalidResponse,
    CacheFailure,
    IoFailure,
    SerializationFailure,
    Internal,
}

impl ErrorCode {
    /// Stable snake_case identifier used in API responses
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalid => "config_invalid",
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::ApiNetworkError => "api_network_error",
            ErrorCode::ApiUnauthorized => "api_unauthorized",
            ErrorCode::ApiRateLimit => "api_rate_limit",
            ErrorCode::ApiNotFound => "api_not_found",
            ErrorCode::ApiServerError => "api_server_error",
            ErrorCode::ApiInvalidResponse => "api_invalid_response",
            ErrorCode::CacheFailure => "cache_failure",
            ErrorCode::IoFailure => "io_failure",
            ErrorCode::SerializationFailure => "serialization_failure",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the `TravelAssist` library
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External API communication errors
    #[error("API error: {message}")]
    Api {
        message: String,
        code: ErrorCode,
        context: HashMap<String, String>,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON encoding or decoding errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl AssistantError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an API error without extra context
    pub fn api<S: Into<String>>(message: S, code: ErrorCode) -> Self {
        Self::api_with_context(message, code, HashMap::new())
    }

    /// Create an API error carrying diagnostic key/value pairs
    pub fn api_with_context<S: Into<String>>(
        message: S,
        code: ErrorCode,
        context: HashMap<String, String>,
    ) -> Self {
        Self::Api {
            message: message.into(),
            code,
            context,
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Classification code for this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            AssistantError::Config { .. } => ErrorCode::ConfigInvalid,
            AssistantError::Api { code, .. } => *code,
            AssistantError::Validation { .. } => ErrorCode::ValidationFailed,
            AssistantError::Cache { .. } => ErrorCode::CacheFailure,
            AssistantError::Io { .. } => ErrorCode::IoFailure,
            AssistantError::Serialization { .. } => ErrorCode::SerializationFailure,
            AssistantError::General { .. } => ErrorCode::Internal,
        }
    }

    /// Diagnostic context attached to API errors
    #[must_use]
    pub fn context(&self) -> Option<&HashMap<String, String>> {
        match self {
            AssistantError::Api { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether retrying the same request later could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::ApiNetworkError | ErrorCode::ApiRateLimit | ErrorCode::ApiServerError
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and API keys.")
            }
            AssistantError::Api { code, context, .. } => match code {
                ErrorCode::ApiNotFound => match context.get("service") {
                    Some(service) if service != WEATHER_SERVICE => {
                        format!("{service} has no data for that request.")
                    }
                    _ => "Weather data not found.".to_string(),
                },
                ErrorCode::ApiUnauthorized => {
                    "The external service rejected the API key. Please check your configuration."
                        .to_string()
                }
                ErrorCode::ApiRateLimit => {
                    "The external service is rate limiting requests. Try again later.".to_string()
                }
                _ => "API error. Try again later.".to_string(),
            },
            AssistantError::Validation { message } => format!("Invalid input: {message}"),
            AssistantError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            AssistantError::Io { .. } => {
                "File operation failed. Please check file paths and permissions.".to_string()
            }
            AssistantError::Serialization { .. } => {
                "Data could not be read or written as JSON.".to_string()
            }
            AssistantError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = AssistantError::config("missing API key");
        assert!(matches!(config_err, AssistantError::Config { .. }));

        let api_err = AssistantError::api("connection failed", ErrorCode::ApiNetworkError);
        assert!(matches!(api_err, AssistantError::Api { .. }));

        let validation_err = AssistantError::validation("invalid coordinates");
        assert!(matches!(validation_err, AssistantError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = AssistantError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = AssistantError::api("boom", ErrorCode::ApiServerError);
        assert_eq!(api_err.user_message(), "API error. Try again later.");

        let missing = AssistantError::api("no forecast", ErrorCode::ApiNotFound);
        assert_eq!(missing.user_message(), "Weather data not found.");

        let missing_page = AssistantError::api_with_context(
            "no page",
            ErrorCode::ApiNotFound,
            HashMap::from([("service".to_string(), "Wikipedia".to_string())]),
        );
        assert_eq!(missing_page.user_message(), "Wikipedia has no data for that request.");

        let validation_err = AssistantError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(AssistantError::api("x", ErrorCode::ApiServerError).is_transient());
        assert!(AssistantError::api("x", ErrorCode::ApiRateLimit).is_transient());
        assert!(AssistantError::api("x", ErrorCode::ApiNetworkError).is_transient());
        assert!(!AssistantError::api("x", ErrorCode::ApiUnauthorized).is_transient());
        assert!(!AssistantError::api("x", ErrorCode::ApiNotFound).is_transient());
        assert!(!AssistantError::validation("x").is_transient());
    }

    #[test]
    fn test_context_is_kept() {
        let err = AssistantError::api_with_context(
            "failed",
            ErrorCode::ApiServerError,
            HashMap::from([("status_code".to_string(), "503".to_string())]),
        );
        assert_eq!(err.code(), ErrorCode::ApiServerError);
        assert_eq!(
            err.context().and_then(|c| c.get("status_code")).map(String::as_str),
            Some("503")
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AssistantError = io_err.into();
        assert!(matches!(err, AssistantError::Io { .. }));
        assert_eq!(err.code(), ErrorCode::IoFailure);
    }
}
