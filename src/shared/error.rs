use std::fmt;

#[derive(Debug, Clone)]
pub enum AppError {
    Database(String),
    Storage(String),
    NotFound(String),
    DuplicateKey(String),
    QueueFull(String),
    UnsupportedOperation(String),
    Network(String),
    Timeout(String),
    Offline(String),
    SyncInProgress(String),
    ValidationError(String),
    RemoteRejected(String),
    ConfigurationError(String),
    SerializationError(String),
    DeserializationError(String),
    Internal(String),
}

impl AppError {
    /// Whether a failed remote call is worth another attempt on a later pass.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::Timeout(_) | AppError::Offline(_) => true,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => true,
            AppError::UnsupportedOperation(_)
            | AppError::ValidationError(_)
            | AppError::RemoteRejected(_)
            | AppError::NotFound(_)
            | AppError::DuplicateKey(_)
            | AppError::QueueFull(_)
            | AppError::SyncInProgress(_)
            | AppError::ConfigurationError(_)
            | AppError::SerializationError(_)
            | AppError::DeserializationError(_) => false,
        }
    }

    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::QueueFull(_) | AppError::Offline(_) | AppError::SyncInProgress(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::DuplicateKey(msg) => write!(f, "Duplicate key: {}", msg),
            AppError::QueueFull(msg) => write!(f, "Queue full: {}", msg),
            AppError::UnsupportedOperation(msg) => write!(f, "Unsupported operation: {}", msg),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            AppError::Offline(msg) => write!(f, "Offline: {}", msg),
            AppError::SyncInProgress(msg) => write!(f, "Sync in progress: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::RemoteRejected(msg) => write!(f, "Rejected by remote store: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return AppError::DuplicateKey(db_err.message().to_string());
        }
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
