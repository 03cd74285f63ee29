use crate::PostSink;
use async_trait::async_trait;
use pulse_core::{CoreError, DatabaseError, EnrichedPost, PostgresSettings};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info};

/// Rows per INSERT statement; keeps bind parameters well under the protocol limit.
const INSERT_CHUNK: usize = 500;

pub(crate) const POST_COLUMNS: &[&str] = &[
    "id",
    "subreddit",
    "title",
    "selftext",
    "score",
    "num_comments",
    "created_utc",
    "created_date",
    "author",
    "url",
    "permalink",
    "over_18",
    "upvote_ratio",
    "title_clean",
    "selftext_clean",
    "text_combined_clean",
    "clean_text",
    "sentiment_neg",
    "sentiment_neu",
    "sentiment_pos",
    "sentiment_compound",
];

const CREATE_POSTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    subreddit TEXT,
    title TEXT,
    selftext TEXT,
    score BIGINT,
    num_comments BIGINT,
    created_utc TIMESTAMPTZ,
    created_date DATE,
    author TEXT,
    url TEXT,
    permalink TEXT,
    over_18 BOOLEAN,
    upvote_ratio DOUBLE PRECISION,
    title_clean TEXT,
    selftext_clean TEXT,
    text_combined_clean TEXT,
    clean_text TEXT,
    sentiment_neg DOUBLE PRECISION,
    sentiment_neu DOUBLE PRECISION,
    sentiment_pos DOUBLE PRECISION,
    sentiment_compound DOUBLE PRECISION
)
"#;

pub(crate) fn insert_prefix() -> String {
    format!("INSERT INTO posts ({}) ", POST_COLUMNS.join(", "))
}

/// Appends enriched posts to the `posts` table.
///
/// Rows whose id already exists are left untouched.
pub struct PostgresPostSink {
    pool: PgPool,
}

impl PostgresPostSink {
    pub async fn connect(settings: &PostgresSettings) -> Result<Self, CoreError> {
        info!(
            "Connecting to Postgres at {}:{}/{}",
            settings.host, settings.port, settings.database
        );
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&settings.connection_url())
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostSink for PostgresPostSink {
    async fn ensure_schema(&self) -> Result<(), CoreError> {
        sqlx::query(CREATE_POSTS_TABLE).execute(&self.pool).await?;
        info!("Ensured 'posts' table exists in Postgres");
        Ok(())
    }

    async fn insert_posts(&self, posts: &[EnrichedPost]) -> Result<u64, CoreError> {
        let mut inserted = 0;

        for chunk in posts.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(insert_prefix());
            builder.push_values(chunk, |mut row, enriched| {
                let clean = &enriched.record;
                let post = &clean.post;
                row.push_bind(post.id.as_str())
                    .push_bind(post.subreddit.as_str())
                    .push_bind(post.title.as_str())
                    .push_bind(post.selftext.as_str())
                    .push_bind(post.score)
                    .push_bind(post.num_comments)
                    .push_bind(clean.created_at)
                    .push_bind(clean.created_date)
                    .push_bind(post.author.as_deref())
                    .push_bind(post.url.as_str())
                    .push_bind(post.permalink.as_str())
                    .push_bind(post.over_18)
                    .push_bind(post.upvote_ratio)
                    .push_bind(clean.title_clean.as_str())
                    .push_bind(clean.selftext_clean.as_str())
                    .push_bind(clean.text_combined_clean.as_str())
                    .push_bind(enriched.clean_text.as_str())
                    .push_bind(enriched.sentiment_neg)
                    .push_bind(enriched.sentiment_neu)
                    .push_bind(enriched.sentiment_pos)
                    .push_bind(enriched.sentiment_compound);
            });
            builder.push(" ON CONFLICT (id) DO NOTHING");

            let result = builder.build().execute(&self.pool).await?;
            debug!(
                "Inserted {} of {} rows in chunk",
                result.rows_affected(),
                chunk.len()
            );
            inserted += result.rows_affected();
        }

        info!("Inserted {} posts into Postgres", inserted);
        Ok(inserted)
    }
}
