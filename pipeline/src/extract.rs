use database::write_json_records;
use pulse_core::{Comment, CoreError, Post, RedditConfig, StorageConfig};
use reddit_client::{
    fetch_comments_for_posts, scan_feed, CommentFetchOptions, CommentSort, FeedScanOptions,
    FetchSummary, KeywordFilter, ListingSource, RedditApiClient, ScanOutcome,
};
use tracing::info;

/// Records gathered by the extract stage.
///
/// Owned by the caller so that whatever was collected survives an aborted
/// run and can still be saved.
#[derive(Debug, Default)]
pub struct Extraction {
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub scan: ScanOutcome,
    pub fetch: FetchSummary,
}

pub fn reddit_client(config: &RedditConfig) -> Result<RedditApiClient, CoreError> {
    RedditApiClient::new(
        &config.base_url,
        &config.user_agent,
        config.request_timeout(),
    )
}

pub fn scan_options(config: &RedditConfig) -> FeedScanOptions {
    FeedScanOptions {
        target_count: config.target_posts,
        page_size: config.page_limit,
        delay: config.listing_delay(),
    }
}

pub fn fetch_options(config: &RedditConfig) -> CommentFetchOptions {
    CommentFetchOptions {
        per_post_cap: config.max_comments_per_post,
        post_cap: config.max_posts_with_comments,
        delay: config.comment_delay(),
        sort: CommentSort::Top,
    }
}

/// Scans the feed for keyword matches, then pulls the comment trees of the
/// matched posts. Results are appended to `out` as they arrive.
pub async fn extract<S>(source: &S, config: &RedditConfig, out: &mut Extraction) -> ExtractSummary
where
    S: ListingSource + ?Sized,
{
    let filter = KeywordFilter::new(&config.keywords);
    let scan = scan_feed(
        source,
        &config.subreddit,
        &filter,
        &scan_options(config),
        &mut out.posts,
    )
    .await;
    info!("Feed scan finished ({:?}) with {} posts", scan, out.posts.len());

    let fetch =
        fetch_comments_for_posts(source, &out.posts, &fetch_options(config), &mut out.comments)
            .await;

    ExtractSummary { scan, fetch }
}

/// Writes the raw posts and comments as JSON arrays.
pub fn save_extraction(storage: &StorageConfig, extraction: &Extraction) -> Result<(), CoreError> {
    let posts_path = storage.raw_posts_path();
    write_json_records(&posts_path, &extraction.posts)?;
    info!("Saved {} records to {}", extraction.posts.len(), posts_path.display());

    let comments_path = storage.raw_comments_path();
    write_json_records(&comments_path, &extraction.comments)?;
    info!(
        "Saved {} records to {}",
        extraction.comments.len(),
        comments_path.display()
    );
    Ok(())
}
