use pulse_core::{
    ConfigError, CoreError, DatabaseError, ErrorExt, ErrorRecovery, FailureReport,
    RecoveryStrategy, RedditApiError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::RequestTimeout);
    assert_eq!(reddit_error.error_code(), "REDDIT_TIMEOUT");

    let db_error = CoreError::Database(DatabaseError::SchemaMismatch {
        column: "title".to_string(),
    });
    assert_eq!(db_error.error_code(), "DB_SCHEMA_MISMATCH");

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "POSTGRES_HOST".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG_MISSING_ENV_VAR");

    let missing = CoreError::MissingInput {
        path: "data/raw/technology_ai_posts.json".to_string(),
    };
    assert_eq!(missing.error_code(), "MISSING_INPUT");
}

#[test]
fn test_rate_limit_detection() {
    let rate_limited =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert!(rate_limited.is_rate_limit());
    assert_eq!(rate_limited.retry_after(), Some(Duration::from_secs(60)));

    let server_error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 502 });
    assert!(!server_error.is_rate_limit());
    assert_eq!(server_error.retry_after(), None);
}

#[test]
fn test_taxonomy_strategies() {
    let cases = [
        (
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 10 }),
            RecoveryStrategy::Halt,
        ),
        (
            CoreError::RedditApi(RedditApiError::RequestFailed { status_code: 403 }),
            RecoveryStrategy::EndOfSource,
        ),
        (
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "not a list".to_string(),
            }),
            RecoveryStrategy::Skip,
        ),
        (
            CoreError::Config(ConfigError::MissingEnvironmentVariable {
                var_name: "MONGO_DB".to_string(),
            }),
            RecoveryStrategy::Fail,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(ErrorRecovery::determine_strategy(&error), expected, "{}", error);
    }
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 30 });
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("30 seconds"));

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "POSTGRES_PASSWORD".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("POSTGRES_PASSWORD"));
}

#[test]
fn test_failure_report_for_missing_stage_input() {
    let error = CoreError::MissingInput {
        path: "data/processed/technology_ai_posts_clean.parquet".to_string(),
    };
    let report = FailureReport::emit(&error);

    assert_eq!(report.code, "MISSING_INPUT");
    assert!(report.message.contains("technology_ai_posts_clean.parquet"));
    assert!(report.message.contains("previous stage"));
    assert_eq!(report.strategy, RecoveryStrategy::Fail);
    assert_eq!(report.retry_after, None);
    assert_eq!(report, FailureReport::new(&error));
}

#[test]
fn test_failure_report_carries_rate_limit_wait() {
    let error = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 45 });
    let report = FailureReport::new(&error);

    assert_eq!(report.code, "REDDIT_RATE_LIMIT");
    assert_eq!(report.strategy, RecoveryStrategy::Halt);
    assert_eq!(report.retry_after, Some(Duration::from_secs(45)));
    assert_eq!(
        report.to_string(),
        "[REDDIT_RATE_LIMIT] Too many requests. Reddit asked us to wait 45 seconds. \
         Wait 45s before running again."
    );
}

#[test]
fn test_failure_report_display_without_wait() {
    let error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "MONGO_URI".to_string(),
    });
    let shown = FailureReport::new(&error).to_string();
    assert!(shown.starts_with("[CONFIG_MISSING_ENV_VAR] Environment variable MONGO_URI"));
    assert!(!shown.contains("before running again"));
}
