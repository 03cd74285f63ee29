//! Parquet files holding the cleaned and annotated records.
//!
//! One flat column per field. Timestamps are stored as microseconds in UTC
//! and calendar dates as days since the Unix epoch.

use arrow_array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, RecordBatch,
    StringArray, TimestampMicrosecondArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use pulse_core::{
    Annotated, CleanComment, CleanPost, Comment, CoreError, DatabaseError, EnrichedComment,
    EnrichedPost, Post, SentimentScores,
};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const UTC: &str = "UTC";
/// `NaiveDate::num_days_from_ce` of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some(UTC.into()))
}

fn annotation_fields() -> Vec<Field> {
    vec![
        Field::new("clean_text", DataType::Utf8, false),
        Field::new("sentiment_neg", DataType::Float64, false),
        Field::new("sentiment_neu", DataType::Float64, false),
        Field::new("sentiment_pos", DataType::Float64, false),
        Field::new("sentiment_compound", DataType::Float64, false),
    ]
}

pub fn post_schema() -> SchemaRef {
    let mut fields = vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("subreddit", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("selftext", DataType::Utf8, false),
        Field::new("score", DataType::Int64, false),
        Field::new("num_comments", DataType::Int64, false),
        Field::new("created_utc", DataType::Float64, false),
        Field::new("author", DataType::Utf8, true),
        Field::new("url", DataType::Utf8, false),
        Field::new("permalink", DataType::Utf8, false),
        Field::new("over_18", DataType::Boolean, false),
        Field::new("upvote_ratio", DataType::Float64, false),
        Field::new("created_at", timestamp_type(), false),
        Field::new("created_date", DataType::Date32, false),
        Field::new("title_clean", DataType::Utf8, false),
        Field::new("selftext_clean", DataType::Utf8, false),
        Field::new("text_combined_clean", DataType::Utf8, false),
    ];
    fields.extend(annotation_fields());
    Arc::new(Schema::new(fields))
}

pub fn comment_schema() -> SchemaRef {
    let mut fields = vec![
        Field::new("post_id", DataType::Utf8, false),
        Field::new("comment_id", DataType::Utf8, false),
        Field::new("parent_id", DataType::Utf8, false),
        Field::new("author", DataType::Utf8, true),
        Field::new("body", DataType::Utf8, false),
        Field::new("score", DataType::Int64, false),
        Field::new("created_utc", DataType::Float64, false),
        Field::new("created_at", timestamp_type(), false),
        Field::new("created_date", DataType::Date32, false),
        Field::new("body_clean", DataType::Utf8, false),
    ];
    fields.extend(annotation_fields());
    Arc::new(Schema::new(fields))
}

pub fn write_posts(path: &Path, posts: &[EnrichedPost]) -> Result<(), CoreError> {
    let batch = posts_batch(posts)?;
    write_batch(path, &batch)?;
    info!("Saved {} cleaned posts to {}", posts.len(), path.display());
    Ok(())
}

pub fn write_comments(path: &Path, comments: &[EnrichedComment]) -> Result<(), CoreError> {
    let batch = comments_batch(comments)?;
    write_batch(path, &batch)?;
    info!("Saved {} cleaned comments to {}", comments.len(), path.display());
    Ok(())
}

pub fn read_posts(path: &Path) -> Result<Vec<EnrichedPost>, CoreError> {
    let mut posts = Vec::new();
    for batch in read_batches(path)? {
        posts_from_batch(&batch, &mut posts)?;
    }
    debug!("Read {} posts from {}", posts.len(), path.display());
    Ok(posts)
}

pub fn read_comments(path: &Path) -> Result<Vec<EnrichedComment>, CoreError> {
    let mut comments = Vec::new();
    for batch in read_batches(path)? {
        comments_from_batch(&batch, &mut comments)?;
    }
    debug!("Read {} comments from {}", comments.len(), path.display());
    Ok(comments)
}

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(File::create(path)?, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>, CoreError> {
    if !path.exists() {
        return Err(CoreError::MissingInput {
            path: path.display().to_string(),
        });
    }

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    reader
        .map(|batch| batch.map_err(CoreError::from))
        .collect()
}

fn days_since_epoch(date: &NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn strings<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

fn optional_strings<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(values.collect::<StringArray>())
}

fn floats(values: impl Iterator<Item = f64>) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(values))
}

fn integers(values: impl Iterator<Item = i64>) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(values))
}

fn timestamps<'a>(values: impl Iterator<Item = &'a DateTime<Utc>>) -> ArrayRef {
    Arc::new(
        TimestampMicrosecondArray::from_iter_values(values.map(|ts| ts.timestamp_micros()))
            .with_timezone(UTC),
    )
}

fn dates<'a>(values: impl Iterator<Item = &'a NaiveDate>) -> ArrayRef {
    Arc::new(Date32Array::from_iter_values(values.map(days_since_epoch)))
}

fn annotation_columns<T>(records: &[Annotated<T>]) -> Vec<ArrayRef> {
    vec![
        strings(records.iter().map(|r| r.clean_text.as_str())),
        floats(records.iter().map(|r| r.sentiment_neg)),
        floats(records.iter().map(|r| r.sentiment_neu)),
        floats(records.iter().map(|r| r.sentiment_pos)),
        floats(records.iter().map(|r| r.sentiment_compound)),
    ]
}

fn posts_batch(posts: &[EnrichedPost]) -> Result<RecordBatch, CoreError> {
    let clean = || posts.iter().map(|p| &p.record);
    let raw = || posts.iter().map(|p| &p.record.post);

    let mut columns = vec![
        strings(raw().map(|p| p.id.as_str())),
        strings(raw().map(|p| p.subreddit.as_str())),
        strings(raw().map(|p| p.title.as_str())),
        strings(raw().map(|p| p.selftext.as_str())),
        integers(raw().map(|p| p.score)),
        integers(raw().map(|p| p.num_comments)),
        floats(raw().map(|p| p.created_utc)),
        optional_strings(raw().map(|p| p.author.as_deref())),
        strings(raw().map(|p| p.url.as_str())),
        strings(raw().map(|p| p.permalink.as_str())),
        Arc::new(raw().map(|p| Some(p.over_18)).collect::<BooleanArray>()) as ArrayRef,
        floats(raw().map(|p| p.upvote_ratio)),
        timestamps(clean().map(|c| &c.created_at)),
        dates(clean().map(|c| &c.created_date)),
        strings(clean().map(|c| c.title_clean.as_str())),
        strings(clean().map(|c| c.selftext_clean.as_str())),
        strings(clean().map(|c| c.text_combined_clean.as_str())),
    ];
    columns.extend(annotation_columns(posts));

    Ok(RecordBatch::try_new(post_schema(), columns)?)
}

fn comments_batch(comments: &[EnrichedComment]) -> Result<RecordBatch, CoreError> {
    let clean = || comments.iter().map(|c| &c.record);
    let raw = || comments.iter().map(|c| &c.record.comment);

    let mut columns = vec![
        strings(raw().map(|c| c.post_id.as_str())),
        strings(raw().map(|c| c.comment_id.as_str())),
        strings(raw().map(|c| c.parent_id.as_str())),
        optional_strings(raw().map(|c| c.author.as_deref())),
        strings(raw().map(|c| c.body.as_str())),
        integers(raw().map(|c| c.score)),
        floats(raw().map(|c| c.created_utc)),
        timestamps(clean().map(|c| &c.created_at)),
        dates(clean().map(|c| &c.created_date)),
        strings(clean().map(|c| c.body_clean.as_str())),
    ];
    columns.extend(annotation_columns(comments));

    Ok(RecordBatch::try_new(comment_schema(), columns)?)
}

fn column<'a, A: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a A, DatabaseError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<A>())
        .ok_or_else(|| DatabaseError::SchemaMismatch {
            column: name.to_string(),
        })
}

fn optional_string(array: &StringArray, row: usize) -> Option<String> {
    (!array.is_null(row)).then(|| array.value(row).to_string())
}

fn timestamp_at(array: &TimestampMicrosecondArray, row: usize) -> Result<DateTime<Utc>, CoreError> {
    let micros = array.value(row);
    DateTime::from_timestamp_micros(micros).ok_or_else(|| CoreError::InvalidInput {
        message: format!("timestamp out of range: {micros}"),
    })
}

fn date_at(array: &Date32Array, row: usize) -> Result<NaiveDate, CoreError> {
    let days = array.value(row);
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE).ok_or_else(|| {
        CoreError::InvalidInput {
            message: format!("date out of range: {days}"),
        }
    })
}

struct AnnotationColumns<'a> {
    clean_text: &'a StringArray,
    neg: &'a Float64Array,
    neu: &'a Float64Array,
    pos: &'a Float64Array,
    compound: &'a Float64Array,
}

impl<'a> AnnotationColumns<'a> {
    fn from_batch(batch: &'a RecordBatch) -> Result<Self, DatabaseError> {
        Ok(Self {
            clean_text: column(batch, "clean_text")?,
            neg: column(batch, "sentiment_neg")?,
            neu: column(batch, "sentiment_neu")?,
            pos: column(batch, "sentiment_pos")?,
            compound: column(batch, "sentiment_compound")?,
        })
    }

    fn attach<T>(&self, record: T, row: usize) -> Annotated<T> {
        Annotated::new(
            record,
            self.clean_text.value(row).to_string(),
            SentimentScores {
                neg: self.neg.value(row),
                neu: self.neu.value(row),
                pos: self.pos.value(row),
                compound: self.compound.value(row),
            },
        )
    }
}

fn posts_from_batch(batch: &RecordBatch, out: &mut Vec<EnrichedPost>) -> Result<(), CoreError> {
    let ids = column::<StringArray>(batch, "id")?;
    let subreddits = column::<StringArray>(batch, "subreddit")?;
    let titles = column::<StringArray>(batch, "title")?;
    let selftexts = column::<StringArray>(batch, "selftext")?;
    let scores = column::<Int64Array>(batch, "score")?;
    let num_comments = column::<Int64Array>(batch, "num_comments")?;
    let created_utc = column::<Float64Array>(batch, "created_utc")?;
    let authors = column::<StringArray>(batch, "author")?;
    let urls = column::<StringArray>(batch, "url")?;
    let permalinks = column::<StringArray>(batch, "permalink")?;
    let over_18 = column::<BooleanArray>(batch, "over_18")?;
    let upvote_ratios = column::<Float64Array>(batch, "upvote_ratio")?;
    let created_at = column::<TimestampMicrosecondArray>(batch, "created_at")?;
    let created_date = column::<Date32Array>(batch, "created_date")?;
    let title_clean = column::<StringArray>(batch, "title_clean")?;
    let selftext_clean = column::<StringArray>(batch, "selftext_clean")?;
    let combined = column::<StringArray>(batch, "text_combined_clean")?;
    let annotations = AnnotationColumns::from_batch(batch)?;

    out.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let post = Post {
            id: ids.value(row).to_string(),
            subreddit: subreddits.value(row).to_string(),
            title: titles.value(row).to_string(),
            selftext: selftexts.value(row).to_string(),
            score: scores.value(row),
            num_comments: num_comments.value(row),
            created_utc: created_utc.value(row),
            author: optional_string(authors, row),
            url: urls.value(row).to_string(),
            permalink: permalinks.value(row).to_string(),
            over_18: over_18.value(row),
            upvote_ratio: upvote_ratios.value(row),
        };
        let clean = CleanPost {
            post,
            created_at: timestamp_at(created_at, row)?,
            created_date: date_at(created_date, row)?,
            title_clean: title_clean.value(row).to_string(),
            selftext_clean: selftext_clean.value(row).to_string(),
            text_combined_clean: combined.value(row).to_string(),
        };
        out.push(annotations.attach(clean, row));
    }
    Ok(())
}

fn comments_from_batch(
    batch: &RecordBatch,
    out: &mut Vec<EnrichedComment>,
) -> Result<(), CoreError> {
    let post_ids = column::<StringArray>(batch, "post_id")?;
    let comment_ids = column::<StringArray>(batch, "comment_id")?;
    let parent_ids = column::<StringArray>(batch, "parent_id")?;
    let authors = column::<StringArray>(batch, "author")?;
    let bodies = column::<StringArray>(batch, "body")?;
    let scores = column::<Int64Array>(batch, "score")?;
    let created_utc = column::<Float64Array>(batch, "created_utc")?;
    let created_at = column::<TimestampMicrosecondArray>(batch, "created_at")?;
    let created_date = column::<Date32Array>(batch, "created_date")?;
    let body_clean = column::<StringArray>(batch, "body_clean")?;
    let annotations = AnnotationColumns::from_batch(batch)?;

    out.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let comment = Comment {
            post_id: post_ids.value(row).to_string(),
            comment_id: comment_ids.value(row).to_string(),
            parent_id: parent_ids.value(row).to_string(),
            author: optional_string(authors, row),
            body: bodies.value(row).to_string(),
            score: scores.value(row),
            created_utc: created_utc.value(row),
        };
        let clean = CleanComment {
            comment,
            created_at: timestamp_at(created_at, row)?,
            created_date: date_at(created_date, row)?,
            body_clean: body_clean.value(row).to_string(),
        };
        out.push(annotations.attach(clean, row));
    }
    Ok(())
}
