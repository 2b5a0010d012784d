use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {endpoint}: {message}")]
    HttpStatusError {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid report request: {message}")]
    InvalidRequestError { message: String },

    #[error("Cannot {action} while generation is {state}")]
    InvalidTransitionError { action: String, state: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Input,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::ApiError(_) | ReportError::HttpStatusError { .. } => ErrorCategory::Network,
            ReportError::ConfigValidationError { .. } | ReportError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            ReportError::InvalidRequestError { .. } | ReportError::IoError(_) => {
                ErrorCategory::Input
            }
            ReportError::SerializationError(_) | ReportError::InvalidTransitionError { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // Network trouble is usually worth another try.
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ReportError::ApiError(_) => "Check network connectivity and the configured api.base_url",
            ReportError::HttpStatusError { status, .. } if *status == 401 || *status == 403 => {
                "Check that api.token (or PROSPECTX_TOKEN) holds a valid access token"
            }
            ReportError::HttpStatusError { status, .. } if *status == 404 => {
                "Verify the report id exists"
            }
            ReportError::HttpStatusError { .. } => "Retry later; the ProspectX service may be degraded",
            ReportError::IoError(_) => "Make sure the file exists and is readable",
            ReportError::SerializationError(_) => "The service returned an unexpected payload; report this as a bug",
            ReportError::ConfigValidationError { .. } => "Fix the configuration file and try again",
            ReportError::InvalidConfigValueError { .. } => "Correct the highlighted configuration value",
            ReportError::InvalidRequestError { .. } => {
                "Pick a known report type and pass exactly one of --player-id or --team-name"
            }
            ReportError::InvalidTransitionError { .. } => "Start a new generation instead",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::ApiError(_) => "Could not reach the ProspectX service".to_string(),
            ReportError::HttpStatusError { status, message, .. } => {
                format!("The ProspectX service answered with HTTP {}: {}", status, message)
            }
            ReportError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
