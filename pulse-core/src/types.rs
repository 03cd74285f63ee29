use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A submission collected from a subreddit listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subreddit: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub selftext: String,
    #[serde(deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub num_comments: i64,
    /// Epoch seconds, UTC
    #[serde(deserialize_with = "null_as_default")]
    pub created_utc: f64,
    pub author: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub permalink: String,
    #[serde(deserialize_with = "null_as_default")]
    pub over_18: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub upvote_ratio: f64,
}

/// A single reply, flattened out of a post's comment tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    #[serde(deserialize_with = "null_as_default")]
    pub post_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub comment_id: String,
    /// `t3_<post>` for top-level replies, `t1_<comment>` otherwise
    #[serde(deserialize_with = "null_as_default")]
    pub parent_id: String,
    pub author: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub created_utc: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

/// A post after text cleaning and timestamp parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanPost {
    #[serde(flatten)]
    pub post: Post,
    pub created_at: DateTime<Utc>,
    pub created_date: NaiveDate,
    pub title_clean: String,
    pub selftext_clean: String,
    pub text_combined_clean: String,
}

/// A comment after text cleaning and timestamp parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub created_at: DateTime<Utc>,
    pub created_date: NaiveDate,
    pub body_clean: String,
}

/// Any record extended with its normalized text and polarity scores.
///
/// The wrapped record keeps all of its own fields; serialization flattens
/// them next to the sentiment columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotated<T> {
    #[serde(flatten)]
    pub record: T,
    pub clean_text: String,
    pub sentiment_neg: f64,
    pub sentiment_neu: f64,
    pub sentiment_pos: f64,
    pub sentiment_compound: f64,
}

impl<T> Annotated<T> {
    pub fn new(record: T, clean_text: String, scores: SentimentScores) -> Self {
        Self {
            record,
            clean_text,
            sentiment_neg: scores.neg,
            sentiment_neu: scores.neu,
            sentiment_pos: scores.pos,
            sentiment_compound: scores.compound,
        }
    }

    pub fn scores(&self) -> SentimentScores {
        SentimentScores {
            neg: self.sentiment_neg,
            neu: self.sentiment_neu,
            pos: self.sentiment_pos,
            compound: self.sentiment_compound,
        }
    }
}

pub type EnrichedPost = Annotated<CleanPost>;
pub type EnrichedComment = Annotated<CleanComment>;

/// Reads an explicit JSON `null` as the type's default value.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Converts fractional epoch seconds to a UTC timestamp with microsecond
/// precision. Out-of-range values collapse to the epoch.
pub fn timestamp_from_epoch(seconds: f64) -> DateTime<Utc> {
    if !seconds.is_finite() {
        return DateTime::default();
    }
    let micros = (seconds * 1_000_000.0).round() as i64;
    DateTime::from_timestamp(
        micros.div_euclid(1_000_000),
        (micros.rem_euclid(1_000_000) * 1_000) as u32,
    )
    .unwrap_or_default()
}

/// Inverse of [`timestamp_from_epoch`].
pub fn epoch_from_timestamp(timestamp: &DateTime<Utc>) -> f64 {
    timestamp.timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_defaults_for_missing_fields() {
        let post: Post = serde_json::from_str(r#"{"id": "abc", "title": "Hello"}"#).unwrap();
        assert_eq!(post.id, "abc");
        assert_eq!(post.title, "Hello");
        assert_eq!(post.selftext, "");
        assert_eq!(post.author, None);
        assert_eq!(post.score, 0);

        let post: Post =
            serde_json::from_str(r#"{"id": "abc", "score": null, "selftext": null}"#).unwrap();
        assert_eq!(post.score, 0);
        assert_eq!(post.selftext, "");
    }

    #[test]
    fn test_timestamp_conversion() {
        let ts = timestamp_from_epoch(1_700_000_000.0);
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(epoch_from_timestamp(&ts), 1_700_000_000.0);
        assert_eq!(ts.date_naive().to_string(), "2023-11-14");

        assert_eq!(timestamp_from_epoch(f64::NAN).timestamp(), 0);
    }

    #[test]
    fn test_annotated_serializes_flat() {
        let comment = Comment {
            post_id: "p1".to_string(),
            comment_id: "c1".to_string(),
            parent_id: "t3_p1".to_string(),
            author: Some("someone".to_string()),
            body: "Nice".to_string(),
            score: 3,
            created_utc: 1_700_000_000.0,
        };
        let annotated = Annotated::new(
            comment,
            "nice".to_string(),
            SentimentScores {
                neg: 0.0,
                neu: 0.0,
                pos: 1.0,
                compound: 0.4215,
            },
        );

        let value = serde_json::to_value(&annotated).unwrap();
        assert_eq!(value["comment_id"], "c1");
        assert_eq!(value["body"], "Nice");
        assert_eq!(value["clean_text"], "nice");
        assert_eq!(value["sentiment_pos"], 1.0);
    }
}
