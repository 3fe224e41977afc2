use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevStackError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("PostgreSQL error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Manifest parsing error: {0}")]
    ManifestError(#[from] serde_yaml::Error),

    #[error("Environment file error: {0}")]
    EnvFileError(#[from] dotenv::Error),

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

    #[error("{service} is unavailable: {details}")]
    ServiceUnavailable { service: String, details: String },

    #[error("{service} returned status {status}: {body}")]
    UpstreamError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Unsupported command: {command}")]
    UnsupportedCommand { command: String },

    #[error("Query rejected: {reason}")]
    QueryRejected { reason: String },

    #[error("Operation timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, DevStackError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Query,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DevStackError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::EnvFileError(_)
            | Self::ManifestError(_) => ErrorCategory::Configuration,
            Self::RedisError(_)
            | Self::DatabaseError(_)
            | Self::HttpError(_)
            | Self::ServiceUnavailable { .. }
            | Self::UpstreamError { .. }
            | Self::Timeout { .. } => ErrorCategory::Network,
            Self::UnsupportedCommand { .. } | Self::QueryRejected { .. } => ErrorCategory::Query,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. } => ErrorCategory::Data,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnsupportedCommand { .. } | Self::QueryRejected { .. } => ErrorSeverity::Low,
            Self::ServiceUnavailable { .. }
            | Self::Timeout { .. }
            | Self::HttpError(_)
            | Self::RedisError(_)
            | Self::DatabaseError(_)
            | Self::UpstreamError { .. } => ErrorSeverity::Medium,
            Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::RedisError(_) => {
                "Check that the redis container is running (`docker ps | grep redis`) and port 6379 is free".to_string()
            }
            Self::DatabaseError(_) => {
                "Verify PG_CONN_STR and the testuser/testpass credentials, then check `docker compose logs postgres`".to_string()
            }
            Self::HttpError(_) => {
                "Check that the service is reachable and the configured URL is correct".to_string()
            }
            Self::ServiceUnavailable { service, .. } => format!(
                "Start the stack with `docker compose -f docker-compose.mcp-demo.yml up -d` and wait for {} to become healthy",
                service
            ),
            Self::UpstreamError { status, .. } if *status == 401 => {
                "The API key was rejected; check OPENAI_API_KEY in your .env or secrets file".to_string()
            }
            Self::UpstreamError { service, .. } => {
                format!("Inspect the {} logs for details", service)
            }
            Self::Timeout { .. } => {
                "The service may still be starting; retry once its health check passes".to_string()
            }
            Self::MissingConfigError { field } => {
                format!("Set {} in your .env file or secrets file", field)
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Compare your configuration with .env.template and secrets.toml.template".to_string()
            }
            Self::EnvFileError(_) => "Each line of the env file must be KEY=VALUE".to_string(),
            Self::ManifestError(_) => {
                "Validate the manifest with `docker compose config`".to_string()
            }
            Self::UnsupportedCommand { .. } => {
                "Supported Redis commands: KEYS, GET, HGETALL, SMEMBERS, LRANGE".to_string()
            }
            Self::QueryRejected { .. } => "Only single SELECT statements are allowed".to_string(),
            Self::IoError(_) => "Check file paths and permissions".to_string(),
            Self::CsvError(_) | Self::SerializationError(_) => {
                "The data returned by the service could not be encoded".to_string()
            }
            Self::ProcessingError { .. } => {
                "Reseed the test data with `mcp-devstack seed`".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Service problem: {}", self),
            ErrorCategory::Query => format!("Query problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}
