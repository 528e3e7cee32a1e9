use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Server responded with status {status}: {message}")]
    HttpStatusError { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

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

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Cannot {action} while popup is {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Interaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DashboardError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DashboardError::ApiError(_) | DashboardError::HttpStatusError { .. } => {
                ErrorCategory::Network
            }
            DashboardError::UrlError(_)
            | DashboardError::ConfigError { .. }
            | DashboardError::ConfigValidationError { .. }
            | DashboardError::InvalidConfigValueError { .. }
            | DashboardError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DashboardError::CsvError(_)
            | DashboardError::IoError(_)
            | DashboardError::SerializationError(_)
            | DashboardError::ValidationError { .. } => ErrorCategory::Data,
            DashboardError::InvalidTransition { .. } => ErrorCategory::Interaction,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DashboardError::InvalidTransition { .. } => ErrorSeverity::Low,
            DashboardError::ApiError(_) | DashboardError::HttpStatusError { .. } => {
                ErrorSeverity::Medium
            }
            DashboardError::CsvError(_)
            | DashboardError::SerializationError(_)
            | DashboardError::ValidationError { .. } => ErrorSeverity::High,
            DashboardError::UrlError(_)
            | DashboardError::IoError(_)
            | DashboardError::ConfigError { .. }
            | DashboardError::ConfigValidationError { .. }
            | DashboardError::InvalidConfigValueError { .. }
            | DashboardError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 顯示給使用者的訊息（對應前端錯誤橫幅）
    pub fn user_friendly_message(&self) -> String {
        match self {
            DashboardError::ApiError(e) if e.is_timeout() => {
                "Tempo de resposta do servidor esgotado".to_string()
            }
            DashboardError::ApiError(_) => "Erro de conexão com o servidor".to_string(),
            DashboardError::HttpStatusError { status, .. } => {
                format!("Erro ao carregar dados do dashboard (HTTP {})", status)
            }
            DashboardError::InvalidTransition { .. } => "Ação indisponível no momento".to_string(),
            DashboardError::ValidationError { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the backend is reachable and try again",
            ErrorCategory::Configuration => "Review the CLI flags or the TOML configuration file",
            ErrorCategory::Data => "Inspect the server response or the output path",
            ErrorCategory::Interaction => "Close the current popup and retry the action",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
