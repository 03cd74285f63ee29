pub mod columnar;
pub mod files;
pub mod mongo;
pub mod postgres;


use async_trait::async_trait;
use mongodb::bson::Document;
use pulse_core::{CoreError, EnrichedPost};

pub use columnar::{read_comments, read_posts, write_comments, write_posts};
pub use files::{read_json_records, write_json_records};
pub use mongo::{comment_document, strip_generated_id, MongoCommentSink};
pub use postgres::PostgresPostSink;

/// Relational destination for enriched posts.
#[async_trait]
pub trait PostSink: Send + Sync {
    async fn ensure_schema(&self) -> Result<(), CoreError>;

    /// Appends rows, returning how many were written.
    async fn insert_posts(&self, posts: &[EnrichedPost]) -> Result<u64, CoreError>;
}

/// Document destination for enriched comments.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    fn name(&self) -> &str;

    async fn insert_documents(&self, documents: Vec<Document>) -> Result<usize, CoreError>;
}
