use crate::api::ListingSource;
use pulse_core::{ErrorExt, ErrorRecovery, Post};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Case-insensitive substring filter over a post's title and body.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// An empty filter matches nothing.
    pub fn matches(&self, title: &str, body: &str) -> bool {
        let text = format!("{} {}", title, body).to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct FeedScanOptions {
    pub target_count: usize,
    pub page_size: u32,
    /// Pause between consecutive page requests
    pub delay: Duration,
}

/// Why a feed scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    TargetReached,
    /// A page came back with no items
    FeedExhausted,
    /// The last page carried no continuation cursor
    EndOfCursor,
    /// The listing request failed; earlier matches are kept
    UpstreamFailed,
}

/// Walks the `/new` listing of a subreddit, appending matching posts to
/// `collected` in feed order until `target_count` new matches were added or
/// the feed ends.
///
/// Matches are pushed as soon as they are seen, so whatever is in
/// `collected` stays valid if the returned future is dropped halfway.
pub async fn scan_feed<S>(
    source: &S,
    subreddit: &str,
    filter: &KeywordFilter,
    options: &FeedScanOptions,
    collected: &mut Vec<Post>,
) -> ScanOutcome
where
    S: ListingSource + ?Sized,
{
    let start = collected.len();
    let mut after: Option<String> = None;

    info!(
        "Scanning r/{}/new for posts containing: {:?}",
        subreddit,
        filter.keywords()
    );

    if options.target_count == 0 {
        return ScanOutcome::TargetReached;
    }

    loop {
        let listing = match source
            .fetch_new(subreddit, options.page_size, after.as_deref())
            .await
        {
            Ok(listing) => listing,
            Err(e) => {
                let strategy = ErrorRecovery::determine_strategy(&e);
                e.log_warn();
                warn!(
                    "Feed request failed ({:?}), stopping with {} posts",
                    strategy,
                    collected.len() - start
                );
                return ScanOutcome::UpstreamFailed;
            }
        };

        let data = listing.data;
        if data.children.is_empty() {
            info!("No more posts in listing");
            return ScanOutcome::FeedExhausted;
        }

        for child in data.children {
            let post = child.data;
            let title = post.title.as_deref().unwrap_or_default();
            let body = post.selftext.as_deref().unwrap_or_default();
            if !filter.matches(title, body) {
                continue;
            }

            collected.push(post.into_post(source.base_url()));
            if collected.len() - start >= options.target_count {
                info!("Finished scanning. Collected {} matching posts", options.target_count);
                return ScanOutcome::TargetReached;
            }
        }

        info!("Collected {} matching posts so far...", collected.len() - start);

        match data.after {
            Some(cursor) if !cursor.is_empty() => after = Some(cursor),
            _ => {
                info!("Reached the end of the /new listing (no 'after' cursor)");
                return ScanOutcome::EndOfCursor;
            }
        }

        if !options.delay.is_zero() {
            sleep(options.delay).await;
        }
    }
}

/// Convenience wrapper around [`scan_feed`] that owns the result buffer.
pub async fn collect_feed<S>(
    source: &S,
    subreddit: &str,
    filter: &KeywordFilter,
    options: &FeedScanOptions,
) -> Vec<Post>
where
    S: ListingSource + ?Sized,
{
    let mut posts = Vec::new();
    scan_feed(source, subreddit, filter, options, &mut posts).await;
    posts
}
