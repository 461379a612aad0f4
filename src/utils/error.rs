use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Source not found: {path}")]
    SourceNotFound { path: String },

    #[error("Invalid {format} source: {message}")]
    FormatError { format: String, message: String },

    #[error("Validation failed at record {row}, field '{field}' (value: {value}): {reason}")]
    ValidationError {
        row: usize,
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Upload error: {message}")]
    UploadError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Source,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn format(format: &str, message: impl std::fmt::Display) -> Self {
        ImportError::FormatError {
            format: format.to_string(),
            message: message.to_string(),
        }
    }

    pub fn not_found(path: impl AsRef<std::path::Path>) -> Self {
        ImportError::SourceNotFound {
            path: path.as_ref().display().to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::SourceNotFound { .. } | ImportError::UploadError { .. } => {
                ErrorCategory::Source
            }
            ImportError::FormatError { .. }
            | ImportError::ValidationError { .. }
            | ImportError::UnsupportedFormat(_) => ErrorCategory::Data,
            ImportError::ConfigError { .. }
            | ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ImportError::IoError(_) | ImportError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Source => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ImportError::SourceNotFound { .. } => "Check that the file path exists and is readable",
            ImportError::FormatError { .. } => {
                "Make sure the file content matches the selected format"
            }
            ImportError::ValidationError { .. } => {
                "Fix the reported field and re-submit the whole file"
            }
            ImportError::UnsupportedFormat(_) => {
                "Use one of: csv, txt, json, jsonl, xlsx, xlsx-raw, sqlite"
            }
            ImportError::UploadError { .. } => "Send the file in a multipart field named 'file'",
            ImportError::ConfigError { .. }
            | ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => "Review the configuration file",
            ImportError::IoError(_) => "Check disk space and file permissions",
            ImportError::SerializationError(_) => "Report this as a bug",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Source => format!("Could not read the import source. {}", self),
            ErrorCategory::Data => format!("The import data was rejected. {}", self),
            ErrorCategory::Configuration => format!("The configuration is invalid. {}", self),
            ErrorCategory::System => format!("An internal error occurred. {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// 上傳端點的任何失敗都回 404 `{"error": "..."}`
#[cfg(feature = "server")]
impl axum::response::IntoResponse for ImportError {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            "❌ Upload rejected ({:?}, {:?}): {}",
            self.category(),
            self.severity(),
            self
        );

        let body = serde_json::json!({ "error": self.to_string() });
        (axum::http::StatusCode::NOT_FOUND, axum::Json(body)).into_response()
    }
}
