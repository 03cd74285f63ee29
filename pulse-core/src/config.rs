use crate::{ConfigError, CoreError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/pulse.toml";
pub const DEFAULT_ENV_PATH: &str = "config/.env";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub reddit: RedditConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub base_url: String,
    pub user_agent: String,
    pub subreddit: String,
    pub keywords: Vec<String>,
    /// Number of matching posts to collect from the feed
    pub target_posts: usize,
    /// Items requested per listing page (Reddit caps this at 100)
    pub page_limit: u32,
    pub max_comments_per_post: usize,
    pub max_posts_with_comments: usize,
    pub listing_delay_ms: u64,
    pub comment_delay_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub posts_file: String,
    pub comments_file: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            user_agent: "social-pulse/0.1 (data pipeline)".to_string(),
            subreddit: "technology".to_string(),
            keywords: [
                "ai",
                "artificial intelligence",
                "openai",
                "chatgpt",
                "gpt-4",
                "gpt4",
                "machine learning",
                "deep learning",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            target_posts: 1000,
            page_limit: 100,
            max_comments_per_post: 20,
            max_posts_with_comments: 250,
            listing_delay_ms: 2000,
            comment_delay_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            posts_file: "technology_ai_posts.json".to_string(),
            comments_file: "technology_ai_comments.json".to_string(),
        }
    }
}

impl RedditConfig {
    pub fn listing_delay(&self) -> Duration {
        Duration::from_millis(self.listing_delay_ms)
    }

    pub fn comment_delay(&self) -> Duration {
        Duration::from_millis(self.comment_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StorageConfig {
    pub fn raw_posts_path(&self) -> PathBuf {
        self.raw_dir.join(&self.posts_file)
    }

    pub fn raw_comments_path(&self) -> PathBuf {
        self.raw_dir.join(&self.comments_file)
    }

    pub fn clean_posts_path(&self) -> PathBuf {
        self.processed_dir.join("posts_clean.parquet")
    }

    pub fn clean_comments_path(&self) -> PathBuf {
        self.processed_dir.join("comments_clean.parquet")
    }
}

impl PipelineConfig {
    /// Loads the TOML file at `path`. A missing file at the default location
    /// falls back to built-in defaults; a missing explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, CoreError> {
        let config: PipelineConfig = toml::from_str(text).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.reddit.page_limit == 0 || self.reddit.page_limit > 100 {
            return Err(ConfigError::InvalidValue {
                field: "reddit.page_limit".to_string(),
                value: self.reddit.page_limit.to_string(),
            });
        }
        if self.reddit.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reddit.request_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.reddit.subreddit.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "reddit.subreddit".to_string(),
                value: self.reddit.subreddit.clone(),
            });
        }
        Ok(())
    }

    /// Creates the raw and processed data directories.
    pub fn init_directories(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.storage.raw_dir)?;
        std::fs::create_dir_all(&self.storage.processed_dir)?;
        Ok(())
    }
}

/// Loads secrets from `config/.env` if it exists.
pub fn load_env() {
    load_env_from(Path::new(DEFAULT_ENV_PATH));
}

pub fn load_env_from(path: &Path) {
    if path.exists() {
        if let Err(e) = dotenvy::from_path(path) {
            warn!("Failed to read {}: {}", path.display(), e);
        }
    } else {
        warn!(
            "{} not found, relying on system environment variables",
            path.display()
        );
    }
}

pub fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvironmentVariable {
        var_name: name.to_string(),
    })
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl PostgresSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = require_env("POSTGRES_PORT")?;
        Ok(Self {
            host: require_env("POSTGRES_HOST")?,
            port: port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "POSTGRES_PORT".to_string(),
                value: port.clone(),
            })?,
            database: require_env("POSTGRES_DB")?,
            user: require_env("POSTGRES_USER")?,
            password: require_env("POSTGRES_PASSWORD")?,
        })
    }

    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub comments_collection: String,
}

impl MongoSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            uri: require_env("MONGO_URI")?,
            database: require_env("MONGO_DB")?,
            comments_collection: env_or("MONGO_COMMENTS_COLLECTION", "comments"),
        })
    }
}
