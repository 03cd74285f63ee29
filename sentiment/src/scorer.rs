use once_cell::sync::Lazy;
use pulse_core::SentimentScores;
use vader_sentiment::SentimentIntensityAnalyzer;

static ANALYZER: Lazy<SentimentIntensityAnalyzer<'static>> =
    Lazy::new(SentimentIntensityAnalyzer::new);

/// Maps a piece of text to its polarity scores.
pub trait PolarityScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScores;
}

/// Lexicon and rule based scorer (VADER).
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderScorer;

impl VaderScorer {
    pub fn new() -> Self {
        Self
    }
}

impl PolarityScorer for VaderScorer {
    fn score(&self, text: &str) -> SentimentScores {
        if text.trim().is_empty() {
            return SentimentScores::default();
        }

        let scores = ANALYZER.polarity_scores(text);
        let get = |key: &str| scores.get(key).copied().unwrap_or_default();

        SentimentScores {
            neg: get("neg"),
            neu: get("neu"),
            pos: get("pos"),
            compound: get("compound"),
        }
    }
}
