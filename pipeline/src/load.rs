use database::{
    comment_document, read_comments, read_posts, DocumentSink, MongoCommentSink, PostSink,
    PostgresPostSink,
};
use pulse_core::{
    CoreError, EnrichedComment, EnrichedPost, MongoSettings, PostgresSettings, StorageConfig,
};
use tracing::info;

/// Which sinks the load stage writes to.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub postgres: bool,
    pub mongo: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            postgres: true,
            mongo: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub posts_read: usize,
    pub posts_inserted: u64,
    pub comments_read: usize,
    pub comments_inserted: usize,
}

pub async fn load_posts(posts: &[EnrichedPost], sink: &dyn PostSink) -> Result<u64, CoreError> {
    sink.ensure_schema().await?;
    sink.insert_posts(posts).await
}

pub async fn load_comments(
    comments: &[EnrichedComment],
    sink: &dyn DocumentSink,
) -> Result<usize, CoreError> {
    if comments.is_empty() {
        info!("No comments to load, skipping '{}'", sink.name());
        return Ok(0);
    }
    let documents = comments.iter().map(comment_document).collect();
    sink.insert_documents(documents).await
}

/// Reads the cleaned Parquet files and pushes them to Postgres and MongoDB.
///
/// The posts file is required. The comments file is optional.
pub async fn load(storage: &StorageConfig, options: LoadOptions) -> Result<LoadSummary, CoreError> {
    let mut summary = LoadSummary::default();

    let posts_path = storage.clean_posts_path();
    info!("Loading posts from {} ...", posts_path.display());
    let posts = read_posts(&posts_path)?;
    summary.posts_read = posts.len();

    let comments_path = storage.clean_comments_path();
    let comments = if comments_path.exists() {
        info!("Loading comments from {} ...", comments_path.display());
        read_comments(&comments_path)?
    } else {
        info!("No comments file found at {}", comments_path.display());
        Vec::new()
    };
    summary.comments_read = comments.len();

    if options.postgres {
        let sink = PostgresPostSink::connect(&PostgresSettings::from_env()?).await?;
        summary.posts_inserted = load_posts(&posts, &sink).await?;
    } else {
        info!("Postgres load disabled");
    }

    if options.mongo {
        let sink = MongoCommentSink::connect(&MongoSettings::from_env()?).await?;
        summary.comments_inserted = load_comments(&comments, &sink).await?;
    } else {
        info!("MongoDB load disabled");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mongodb::bson::Document;
    use pulse_core::{timestamp_from_epoch, Annotated, CleanComment, Comment, SentimentScores};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPostSink {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PostSink for RecordingPostSink {
        async fn ensure_schema(&self) -> Result<(), CoreError> {
            self.calls.lock().unwrap().push("ensure".to_string());
            Ok(())
        }

        async fn insert_posts(&self, posts: &[EnrichedPost]) -> Result<u64, CoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("insert {}", posts.len()));
            Ok(posts.len() as u64)
        }
    }

    #[derive(Default)]
    struct RecordingDocumentSink {
        batches: Mutex<Vec<Vec<Document>>>,
    }

    #[async_trait]
    impl DocumentSink for RecordingDocumentSink {
        fn name(&self) -> &str {
            "comments"
        }

        async fn insert_documents(&self, documents: Vec<Document>) -> Result<usize, CoreError> {
            let count = documents.len();
            self.batches.lock().unwrap().push(documents);
            Ok(count)
        }
    }

    fn comment(id: &str) -> EnrichedComment {
        let created_at = timestamp_from_epoch(1_700_000_000.0);
        Annotated::new(
            CleanComment {
                comment: Comment {
                    post_id: "p1".to_string(),
                    comment_id: id.to_string(),
                    parent_id: "t3_p1".to_string(),
                    body: "ok".to_string(),
                    ..Default::default()
                },
                created_at,
                created_date: created_at.date_naive(),
                body_clean: "ok".to_string(),
            },
            "ok".to_string(),
            SentimentScores::default(),
        )
    }

    #[tokio::test]
    async fn test_load_posts_ensures_table_first() {
        let sink = RecordingPostSink::default();
        let inserted = load_posts(&[], &sink).await.unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(*sink.calls.lock().unwrap(), vec!["ensure", "insert 0"]);
    }

    #[tokio::test]
    async fn test_load_comments_skips_empty_batch() {
        let sink = RecordingDocumentSink::default();
        assert_eq!(load_comments(&[], &sink).await.unwrap(), 0);
        assert!(sink.batches.lock().unwrap().is_empty());

        let inserted = load_comments(&[comment("c1"), comment("c2")], &sink)
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches[0][1].get_str("comment_id").unwrap(), "c2");
        assert_eq!(batches[0][0].get_str("created_date").unwrap(), "2023-11-14");
    }

    #[tokio::test]
    async fn test_load_requires_posts_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = StorageConfig {
            raw_dir: dir.path().join("raw"),
            processed_dir: dir.path().join("processed"),
            ..StorageConfig::default()
        };
        let options = LoadOptions {
            postgres: false,
            mongo: false,
        };

        let err = load(&storage, options).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingInput { .. }));
    }
}
