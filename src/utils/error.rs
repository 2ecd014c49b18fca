use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Catalog request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Catalog error: {message}")]
    CatalogError { message: String },

    #[error("Render error: {0}")]
    RenderError(#[from] std::fmt::Error),
}

/// 錯誤分類，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Io,
    Configuration,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl OrderError {
    pub fn catalog(message: impl Into<String>) -> Self {
        OrderError::CatalogError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        OrderError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            OrderError::ApiError(_) => ErrorCategory::Network,
            OrderError::CsvError(_)
            | OrderError::SerializationError(_)
            | OrderError::CatalogError { .. } => ErrorCategory::Data,
            OrderError::IoError(_) => ErrorCategory::Io,
            OrderError::ConfigError { .. }
            | OrderError::ConfigValidationError { .. }
            | OrderError::InvalidConfigValueError { .. }
            | OrderError::MissingConfigError { .. } => ErrorCategory::Configuration,
            OrderError::RenderError(_) => ErrorCategory::Rendering,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路錯誤通常可以重試
            OrderError::ApiError(_) => ErrorSeverity::Medium,
            OrderError::CsvError(_)
            | OrderError::SerializationError(_)
            | OrderError::CatalogError { .. }
            | OrderError::RenderError(_) => ErrorSeverity::High,
            OrderError::ConfigError { .. }
            | OrderError::ConfigValidationError { .. }
            | OrderError::InvalidConfigValueError { .. }
            | OrderError::MissingConfigError { .. } => ErrorSeverity::High,
            OrderError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            OrderError::ApiError(_) => {
                "Check that the catalog endpoint is reachable and try again".to_string()
            }
            OrderError::CsvError(_) => {
                "Make sure the catalog CSV has the header id,name,price,type,image_url".to_string()
            }
            OrderError::IoError(_) => {
                "Check that the file exists and the output directory is writable".to_string()
            }
            OrderError::SerializationError(_) => {
                "Make sure the catalog JSON is an array of items".to_string()
            }
            OrderError::ConfigError { .. } | OrderError::ConfigValidationError { .. } => {
                "Review the configuration file for syntax errors".to_string()
            }
            OrderError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            OrderError::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            OrderError::CatalogError { .. } => {
                "Verify the catalog source and its item records".to_string()
            }
            OrderError::RenderError(_) => {
                "Try a different output format".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the catalog service: {}", self),
            ErrorCategory::Data => format!("The catalog data could not be read: {}", self),
            ErrorCategory::Io => format!("A file operation failed: {}", self),
            ErrorCategory::Configuration => format!("The configuration is invalid: {}", self),
            ErrorCategory::Rendering => format!("The receipt could not be rendered: {}", self),
        }
    }

    /// 依嚴重程度決定程式退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = OrderError::MissingConfigError {
            field: "catalog.path".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.recovery_suggestion().contains("catalog.path"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: OrderError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.category(), ErrorCategory::Io);
        assert_eq!(err.exit_code(), 3);
        assert!(err.user_friendly_message().contains("missing"));
    }

    #[test]
    fn test_every_error_exits_non_zero() {
        let errors = vec![
            OrderError::catalog("bad rows"),
            OrderError::config("bad pattern"),
            OrderError::RenderError(std::fmt::Error),
            serde_json::from_str::<u32>("x").unwrap_err().into(),
        ];
        for err in errors {
            assert!(err.exit_code() > 0, "{} exited with 0", err);
        }
    }
}
