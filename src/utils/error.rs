use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("Invalid window length: {days} days (must be at least 1)")]
    InvalidWindow { days: i64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
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
    Input,
    Query,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 依錯誤嚴重程度決定程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 查詢參數錯誤
            ErrorSeverity::High => 1,     // 輸入或配置錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::CsvError(_)
            | EtlError::MissingColumns(_)
            | EtlError::MalformedRecord { .. } => ErrorCategory::Input,
            EtlError::InvalidWindow { .. } => ErrorCategory::Query,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ZipError(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::InvalidWindow { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::MissingColumns(_)
            | EtlError::MalformedRecord { .. }
            | EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            EtlError::ZipError(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::MissingColumns(columns) => format!(
                "Make sure the CSV header contains: {}",
                columns.join(", ")
            ),
            EtlError::MalformedRecord { line, .. } => {
                format!("Fix or remove line {} of the input file and retry", line)
            }
            EtlError::CsvError(_) => "Check that the input is a comma-separated file".to_string(),
            EtlError::InvalidWindow { .. } => "Use a window length of at least 1 day".to_string(),
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            EtlError::MissingConfigError { field } => format!("Provide a value for '{}'", field),
            EtlError::ConfigError { .. } => "Review the configuration file".to_string(),
            EtlError::IoError(_) => "Check file paths and permissions".to_string(),
            EtlError::ZipError(_) | EtlError::SerializationError(_) => {
                "Check free disk space and write permissions of the output path".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The sales file could not be read: {}", self),
            ErrorCategory::Query => format!("The requested summary is invalid: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("File or system error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
