use crate::DocumentSink;
use async_trait::async_trait;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::{Client, Collection};
use pulse_core::{CoreError, DatabaseError, EnrichedComment, MongoSettings};
use tracing::info;

/// Builds the stored shape of a comment.
///
/// `created_at` becomes a BSON datetime and `created_date` an ISO string,
/// since BSON has no plain date type.
pub fn comment_document(enriched: &EnrichedComment) -> Document {
    let clean = &enriched.record;
    let comment = &clean.comment;
    doc! {
        "post_id": comment.post_id.as_str(),
        "comment_id": comment.comment_id.as_str(),
        "parent_id": comment.parent_id.as_str(),
        "author": comment.author.as_deref(),
        "body": comment.body.as_str(),
        "score": comment.score,
        "created_utc": comment.created_utc,
        "created_at": BsonDateTime::from_millis(clean.created_at.timestamp_millis()),
        "created_date": clean.created_date.to_string(),
        "body_clean": clean.body_clean.as_str(),
        "clean_text": enriched.clean_text.as_str(),
        "sentiment_neg": enriched.sentiment_neg,
        "sentiment_neu": enriched.sentiment_neu,
        "sentiment_pos": enriched.sentiment_pos,
        "sentiment_compound": enriched.sentiment_compound,
    }
}

/// Drops an `_id` carried over from an earlier export so the store assigns a
/// fresh one.
pub fn strip_generated_id(mut document: Document) -> Document {
    document.remove("_id");
    document
}

pub struct MongoCommentSink {
    collection: Collection<Document>,
}

impl MongoCommentSink {
    pub async fn connect(settings: &MongoSettings) -> Result<Self, CoreError> {
        let client = Client::with_uri_str(&settings.uri)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;
        let collection = client
            .database(&settings.database)
            .collection::<Document>(&settings.comments_collection);
        Ok(Self { collection })
    }
}

#[async_trait]
impl DocumentSink for MongoCommentSink {
    fn name(&self) -> &str {
        self.collection.name()
    }

    async fn insert_documents(&self, documents: Vec<Document>) -> Result<usize, CoreError> {
        if documents.is_empty() {
            info!("No comment documents to insert");
            return Ok(0);
        }

        let documents: Vec<Document> = documents.into_iter().map(strip_generated_id).collect();
        let result = self.collection.insert_many(documents, None).await?;
        let inserted = result.inserted_ids.len();
        info!(
            "Inserted {} comments into MongoDB collection '{}'",
            inserted,
            self.collection.name()
        );
        Ok(inserted)
    }
}
