//! Recovery strategies for failures met while collecting data.
//!
//! The pipeline never retries. Every failure is instead mapped onto one of a
//! small set of reactions: stop reading the current source, halt all further
//! requests, skip the offending unit, or abort the run.

use crate::{CoreError, ErrorExt, RedditApiError};

/// Recovery strategy for handling errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Treat the source as exhausted and keep what was collected
    EndOfSource,
    /// Stop issuing requests altogether, keeping partial results
    Halt,
    /// Skip the current unit and continue with the next one
    Skip,
    /// Abort the whole run
    Fail,
}

impl RecoveryStrategy {
    /// Returns true if the run can keep going after this failure
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RecoveryStrategy::Fail)
    }
}

/// Error recovery handler that maps error types onto strategies
pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine the appropriate recovery strategy for a given error
    pub fn determine_strategy(error: &CoreError) -> RecoveryStrategy {
        match error {
            // Rate limiting is distinguished from every other upstream failure
            _ if error.is_rate_limit() => RecoveryStrategy::Halt,

            // Malformed payloads only poison the unit they belong to
            CoreError::RedditApi(RedditApiError::InvalidResponse { .. })
            | CoreError::Serialization(_)
            | CoreError::InvalidInput { .. } => RecoveryStrategy::Skip,

            // Upstream unavailable
            CoreError::RedditApi(_) | CoreError::Network(_) => RecoveryStrategy::EndOfSource,

            // Preconditions need user intervention
            CoreError::Config(_) | CoreError::MissingInput { .. } => RecoveryStrategy::Fail,

            CoreError::Database(_) | CoreError::Io(_) | CoreError::Internal { .. } => {
                RecoveryStrategy::Fail
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigError, DatabaseError};
    use std::io;

    #[test]
    fn test_rate_limit_halts() {
        let error = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
        assert_eq!(
            ErrorRecovery::determine_strategy(&error),
            RecoveryStrategy::Halt
        );
    }

    #[test]
    fn test_upstream_failures_end_source() {
        let error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 });
        assert_eq!(
            ErrorRecovery::determine_strategy(&error),
            RecoveryStrategy::EndOfSource
        );

        let error = CoreError::RedditApi(RedditApiError::RequestTimeout);
        assert_eq!(
            ErrorRecovery::determine_strategy(&error),
            RecoveryStrategy::EndOfSource
        );
    }

    #[test]
    fn test_malformed_payload_skips() {
        let error = CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: "expected two listings".to_string(),
        });
        let strategy = ErrorRecovery::determine_strategy(&error);
        assert_eq!(strategy, RecoveryStrategy::Skip);
        assert!(strategy.is_recoverable());
    }

    #[test]
    fn test_preconditions_fail() {
        let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
            var_name: "MONGO_URI".to_string(),
        });
        let strategy = ErrorRecovery::determine_strategy(&config_error);
        assert_eq!(strategy, RecoveryStrategy::Fail);
        assert!(!strategy.is_recoverable());

        let missing = CoreError::MissingInput {
            path: "data/processed/posts_clean.parquet".to_string(),
        };
        assert_eq!(
            ErrorRecovery::determine_strategy(&missing),
            RecoveryStrategy::Fail
        );

        let db_error = CoreError::Database(DatabaseError::ConnectionFailed {
            reason: "refused".to_string(),
        });
        assert_eq!(
            ErrorRecovery::determine_strategy(&db_error),
            RecoveryStrategy::Fail
        );

        let io_error = CoreError::Io(io::Error::new(io::ErrorKind::Other, "test"));
        assert_eq!(
            ErrorRecovery::determine_strategy(&io_error),
            RecoveryStrategy::Fail
        );
    }
}
