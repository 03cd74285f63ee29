use database::{read_json_records, write_json_records};
use pulse_core::CoreError;
use sentiment::{Annotator, PolarityScorer};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};

/// Adds normalized text and sentiment fields to every object in a JSON array
/// file, keeping all existing fields. Returns the number of records written.
pub fn annotate_json_file<S: PolarityScorer>(
    input: &Path,
    output: &Path,
    annotator: &Annotator<S>,
) -> Result<usize, CoreError> {
    let records: Vec<Value> = read_json_records(input)?;
    info!("Loaded {} records from {}", records.len(), input.display());

    let annotated: Vec<Map<String, Value>> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match record {
            Value::Object(map) => Some(annotator.annotate_json(map)),
            other => {
                warn!("Skipping record {}: expected an object, got {}", index, other);
                None
            }
        })
        .collect();

    write_json_records(output, &annotated)?;
    info!(
        "Saved sentiment results for {} records to {}",
        annotated.len(),
        output.display()
    );
    Ok(annotated.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::SentimentScores;
    use serde_json::json;
    use tempfile::TempDir;

    struct ConstantScorer;

    impl PolarityScorer for ConstantScorer {
        fn score(&self, _text: &str) -> SentimentScores {
            SentimentScores {
                neg: 0.0,
                neu: 0.5,
                pos: 0.5,
                compound: 0.3,
            }
        }
    }

    #[test]
    fn test_annotate_json_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("comments.json");
        let output = dir.path().join("out").join("comments_sentiment.json");
        std::fs::write(
            &input,
            json!([
                {"comment_id": "c1", "body": "Love it: https://x.io"},
                {"comment_id": "c2", "comment": "Fallback TEXT"},
                {"comment_id": "c3", "body": null},
                42
            ])
            .to_string(),
        )
        .unwrap();

        let written = annotate_json_file(&input, &output, &Annotator::new(ConstantScorer)).unwrap();
        assert_eq!(written, 3);

        let text = std::fs::read_to_string(&output).unwrap();
        let records: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(records[0]["clean_text"], "love it");
        assert_eq!(records[0]["comment_id"], "c1");
        assert_eq!(records[1]["clean_text"], "fallback text");
        assert_eq!(records[2]["clean_text"], "");
        assert_eq!(records[2]["sentiment_compound"], 0.3);
    }

    #[test]
    fn test_missing_input_file() {
        let dir = TempDir::new().unwrap();
        let err = annotate_json_file(
            &dir.path().join("missing.json"),
            &dir.path().join("out.json"),
            &Annotator::new(ConstantScorer),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MissingInput { .. }));
    }
}
