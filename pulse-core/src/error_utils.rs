use crate::error::*;
use crate::error_recovery::{ErrorRecovery, RecoveryStrategy};
use std::fmt;
use std::time::Duration;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_rate_limit(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Database(e) => {
                error!("Database error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_rate_limit(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_rate_limit(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(e) => e.retry_after(),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Database(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::MissingInput { path } => {
                format!("Required input file {} does not exist. Run the previous stage first.", path)
            }
            CoreError::Io(e) => format!("File system error: {}", e),
            CoreError::Serialization(_) => "A data file could not be parsed as JSON.".to_string(),
            CoreError::Internal { .. } => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.error_code(),
            CoreError::Database(e) => e.error_code(),
            CoreError::Config(e) => e.error_code(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::MissingInput { .. } => "MISSING_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn is_rate_limit(&self) -> bool {
        matches!(self, RedditApiError::RateLimitExceeded { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Reddit asked us to wait {} seconds.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. The subreddit may be private or quarantined.",
                resource
            ),
            RedditApiError::RequestTimeout => {
                "Request to Reddit timed out. Please try again.".to_string()
            }
            RedditApiError::InvalidResponse { details } => {
                format!("Reddit returned an unexpected response: {}", details)
            }
            RedditApiError::ServerError { status_code } => {
                format!("Reddit is having trouble (HTTP {}).", status_code)
            }
            RedditApiError::RequestFailed { status_code } => {
                format!("Reddit rejected the request (HTTP {}).", status_code)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
            RedditApiError::RequestFailed { .. } => "REDDIT_REQUEST_FAILED".to_string(),
        }
    }
}

impl ErrorExt for DatabaseError {
    fn log_error(&self) -> &Self {
        error!("DatabaseError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("DatabaseError (warning): {}", self);
        self
    }

    fn is_rate_limit(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => {
                "Could not connect to the database. Check the connection settings.".to_string()
            }
            DatabaseError::QueryFailed { query } => format!("Database query failed: {}", query),
            DatabaseError::SchemaMismatch { column } => format!(
                "The processed data file is missing column '{}'. Re-run the transform stage.",
                column
            ),
            DatabaseError::Sql(_) => "A relational database operation failed.".to_string(),
            DatabaseError::Document(_) => "A document store operation failed.".to_string(),
            DatabaseError::Parquet(_) | DatabaseError::Arrow(_) => {
                "A columnar data file could not be read or written.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => "DB_CONNECTION_FAILED".to_string(),
            DatabaseError::QueryFailed { .. } => "DB_QUERY_FAILED".to_string(),
            DatabaseError::SchemaMismatch { .. } => "DB_SCHEMA_MISMATCH".to_string(),
            DatabaseError::Sql(_) => "DB_SQL".to_string(),
            DatabaseError::Document(_) => "DB_DOCUMENT".to_string(),
            DatabaseError::Parquet(_) => "DB_PARQUET".to_string(),
            DatabaseError::Arrow(_) => "DB_ARROW".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_rate_limit(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file not found at {}", path)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid value '{}' for configuration field '{}'", value, field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable {} is not set. Add it to config/.env or export it.",
                var_name
            ),
            ConfigError::Parse(_) => {
                "Configuration file could not be parsed. Please check the TOML syntax.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

/// What a failed command tells the person who ran it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub code: String,
    pub message: String,
    pub strategy: RecoveryStrategy,
    pub retry_after: Option<Duration>,
}

impl FailureReport {
    pub fn new(error: &CoreError) -> Self {
        Self {
            code: error.error_code(),
            message: error.user_friendly_message(),
            strategy: ErrorRecovery::determine_strategy(error),
            retry_after: error.retry_after(),
        }
    }

    /// Logs the error with its details and returns the summary.
    pub fn emit(error: &CoreError) -> Self {
        error.log_error();
        let report = Self::new(error);
        error!(code = %report.code, strategy = ?report.strategy, "{}", report.message);
        report
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(wait) = self.retry_after {
            write!(f, " Wait {}s before running again.", wait.as_secs())?;
        }
        Ok(())
    }
}
