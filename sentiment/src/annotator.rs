use crate::scorer::{PolarityScorer, VaderScorer};
use pulse_core::{normalize, Annotated, CleanComment, CleanPost, Comment, Post};
use serde_json::{Map, Value};
use tracing::debug;

/// Gives access to the text a record should be scored on.
pub trait TextSource {
    fn primary_text(&self) -> Option<&str>;

    /// Used when the primary text is absent or empty
    fn fallback_text(&self) -> Option<&str> {
        None
    }

    fn scoring_text(&self) -> Option<&str> {
        let non_empty = |t: &&str| !t.is_empty();
        self.primary_text()
            .filter(non_empty)
            .or_else(|| self.fallback_text().filter(non_empty))
    }
}

impl TextSource for Post {
    fn primary_text(&self) -> Option<&str> {
        Some(&self.selftext)
    }

    fn fallback_text(&self) -> Option<&str> {
        Some(&self.title)
    }
}

impl TextSource for Comment {
    fn primary_text(&self) -> Option<&str> {
        Some(&self.body)
    }
}

impl TextSource for CleanPost {
    fn primary_text(&self) -> Option<&str> {
        self.post.primary_text()
    }

    fn fallback_text(&self) -> Option<&str> {
        self.post.fallback_text()
    }
}

impl TextSource for CleanComment {
    fn primary_text(&self) -> Option<&str> {
        self.comment.primary_text()
    }
}

/// Loosely typed records, e.g. comments read back from arbitrary JSON.
impl TextSource for Map<String, Value> {
    fn primary_text(&self) -> Option<&str> {
        self.get("body").and_then(Value::as_str)
    }

    fn fallback_text(&self) -> Option<&str> {
        self.get("comment").and_then(Value::as_str)
    }
}

/// Attaches normalized text and polarity scores to records.
///
/// Holds no state between records, so it can be shared freely.
pub struct Annotator<S = VaderScorer> {
    scorer: S,
}

impl Default for Annotator<VaderScorer> {
    fn default() -> Self {
        Self::new(VaderScorer::new())
    }
}

impl<S: PolarityScorer> Annotator<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn annotate<T: TextSource>(&self, record: T) -> Annotated<T> {
        let clean_text = normalize(record.scoring_text());
        let scores = self.scorer.score(&clean_text);
        Annotated::new(record, clean_text, scores)
    }

    pub fn annotate_all<T: TextSource>(&self, records: Vec<T>) -> Vec<Annotated<T>> {
        debug!("Annotating {} records", records.len());
        records.into_iter().map(|r| self.annotate(r)).collect()
    }

    /// Same as [`Annotator::annotate`] for a JSON object, writing the derived
    /// fields into the object itself.
    pub fn annotate_json(&self, mut record: Map<String, Value>) -> Map<String, Value> {
        let clean_text = normalize(record.scoring_text());
        let scores = self.scorer.score(&clean_text);

        record.insert("clean_text".to_string(), Value::from(clean_text));
        record.insert("sentiment_neg".to_string(), Value::from(scores.neg));
        record.insert("sentiment_neu".to_string(), Value::from(scores.neu));
        record.insert("sentiment_pos".to_string(), Value::from(scores.pos));
        record.insert("sentiment_compound".to_string(), Value::from(scores.compound));
        record
    }
}
