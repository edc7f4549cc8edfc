use thiserror::Error;

/// Adapter error types
///
/// Every variant is terminal for the invocation. The only retry the adapter
/// performs is the bounded request-status polling in [`crate::poller`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or unusable adapter configuration (base URL, token, settings file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed inbound event attribute
    #[error("Incorrect \"{field}\" parameter: {message}")]
    Validation { field: String, message: String },

    /// HTTP method outside GET/POST/PUT
    #[error("Unsupported HTTP request method: {0}")]
    UnsupportedMethod(String),

    /// Remote API answered outside the success band
    #[error("Request failed with status code {status}{}. Check debug log for more information.", format_detail(.message))]
    RequestFailed { status: u16, message: Option<String> },

    /// Create call succeeded but carried no structured result
    #[error("Cannot create {0} alert. Check debug log for more information.")]
    CreateFailed(String),

    /// Lifecycle call succeeded but carried no structured result
    #[error("Cannot update {0} alert. Check debug log for more information.")]
    UpdateFailed(String),

    /// Success status other than the asynchronous 202 path
    #[error("Response code {0} is unexpected. Check debug log for more information.")]
    UnexpectedStatus(u16),

    /// Polling exhausted without a structurally valid answer
    #[error("Cannot get {0} alert ID. Check debug log for more information.")]
    AlertIdUnresolved(String),

    /// Remote explicitly reported the operation as failed
    #[error("{name}: Operation status ({status})")]
    RemoteOperation { name: String, status: String },

    /// Connection-level failures
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_detail(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

impl AppError {
    /// Shorthand for a validation failure on a named inbound field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            AppError::RequestFailed { .. } => "REQUEST_FAILED",
            AppError::CreateFailed(_) => "CREATE_FAILED",
            AppError::UpdateFailed(_) => "UPDATE_FAILED",
            AppError::UnexpectedStatus(_) => "UNEXPECTED_STATUS",
            AppError::AlertIdUnresolved(_) => "ALERT_ID_UNRESOLVED",
            AppError::RemoteOperation { .. } => "REMOTE_OPERATION_FAILED",
            AppError::Network(_) => "NETWORK_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
        }
    }

    /// Name of the processing stage that raised this error
    pub fn stage(&self) -> &str {
        match self {
            AppError::Configuration(_) | AppError::Io(_) => "configuration",
            AppError::Validation { .. } => "validation",
            AppError::UnsupportedMethod(_)
            | AppError::RequestFailed { .. }
            | AppError::Network(_)
            | AppError::Timeout(_)
            | AppError::Serialization(_) => "transport",
            AppError::CreateFailed(_) => "create",
            AppError::UpdateFailed(_) | AppError::UnexpectedStatus(_) => "update",
            AppError::AlertIdUnresolved(_) | AppError::RemoteOperation { .. } => "polling",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
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
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_builder() {
            AppError::Configuration(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::validation("event_id", "must be positive").error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(AppError::UnexpectedStatus(200).error_code(), "UNEXPECTED_STATUS");
        assert_eq!(
            AppError::AlertIdUnresolved("JSM Ops".to_string()).error_code(),
            "ALERT_ID_UNRESOLVED"
        );
    }

    #[test]
    fn test_error_stages() {
        assert_eq!(AppError::Configuration("x".to_string()).stage(), "configuration");
        assert_eq!(
            AppError::RequestFailed { status: 500, message: None }.stage(),
            "transport"
        );
        let err = AppError::RemoteOperation {
            name: "JSM Ops".to_string(),
            status: "x".to_string(),
        };
        assert_eq!(err.stage(), "polling");
    }

    #[test]
    fn test_remote_operation_names_integration() {
        let err = AppError::RemoteOperation {
            name: "JSM Ops".to_string(),
            status: "Integration is disabled".to_string(),
        };
        assert_eq!(err.to_string(), "JSM Ops: Operation status (Integration is disabled)");
        assert_eq!(err.error_code(), "REMOTE_OPERATION_FAILED");
    }

    #[test]
    fn test_request_failed_message() {
        let err = AppError::RequestFailed {
            status: 422,
            message: Some("Alias is invalid".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Request failed with status code 422: Alias is invalid. Check debug log for more information."
        );

        let err = AppError::RequestFailed { status: 500, message: None };
        assert_eq!(
            err.to_string(),
            "Request failed with status code 500. Check debug log for more information."
        );
    }

    #[test]
    fn test_validation_names_field() {
        let err = AppError::validation("event_source", "must be 0-3, got \"9\"");
        assert!(err.to_string().contains("\"event_source\""));
    }
}
