use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid url pattern"));
static MARKDOWN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*_`>#~\[\]()]").expect("valid markdown pattern"));
static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid character class"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Normalizes free text for scoring and storage.
///
/// Lowercases, removes links, markdown markers and any character outside
/// `[a-z0-9]`, then collapses whitespace. Absent input yields an empty
/// string. Applying it twice gives the same result as applying it once.
pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let text = raw.to_lowercase();
    let text = URL_PATTERN.replace_all(&text, "");
    let text = MARKDOWN_PATTERN.replace_all(&text, " ");
    let text = NON_ALPHANUMERIC.replace_all(&text, " ");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_normalized_shape(text: &str) -> bool {
        let shape = Regex::new(r"^[a-z0-9]*( [a-z0-9]+)*$").unwrap();
        shape.is_match(text)
    }

    #[test]
    fn test_absent_input() {
        assert_eq!(normalize(None), "");
        assert_eq!(normalize(Some("")), "");
        assert_eq!(normalize(Some("   \t\n ")), "");
    }

    #[test]
    fn test_basic_cleaning() {
        assert_eq!(
            normalize(Some("Check out https://openai.com/blog NOW!!")),
            "check out now"
        );
        assert_eq!(normalize(Some("see www.example.com/page for more")), "see for more");
        assert_eq!(
            normalize(Some("**Bold** and _italic_ > quoted [link](x) ~strike~ `code`")),
            "bold and italic quoted link x strike code"
        );
        assert_eq!(normalize(Some("GPT-4 is   here\n\nfolks")), "gpt 4 is here folks");
    }

    #[test]
    fn test_non_ascii_is_removed() {
        assert_eq!(normalize(Some("Café déjà vu 🚀")), "caf d j vu");
    }

    #[test]
    fn test_idempotent_and_shape() {
        let samples = [
            "I love this!!!",
            "http://a.b/c http d",
            "http!x and HTTPS://Y.z",
            "www.x.y www. z",
            "  mixed\u{00a0}spaces\tand\r\nbreaks ",
            "[deleted]",
            "ÀÉÎõü ß İstanbul",
            "#hashtag ~~gone~~ >>> quote",
            "",
        ];
        for sample in samples {
            let once = normalize(Some(sample));
            let twice = normalize(Some(&once));
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
            assert!(is_normalized_shape(&once), "bad shape {:?} for {:?}", once, sample);
        }
    }
}
