use crate::api::{parse_comment_thread, CommentSort, ListingSource};
use crate::flatten::flatten_comment_tree;
use pulse_core::{Comment, CoreError, ErrorExt, ErrorRecovery, Post, RecoveryStrategy};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct CommentFetchOptions {
    /// Comments requested per post and hard cap on what is kept
    pub per_post_cap: usize,
    /// Only the first `post_cap` posts are visited
    pub post_cap: usize,
    /// Pause between consecutive post requests
    pub delay: Duration,
    pub sort: CommentSort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub posts_fetched: usize,
    pub posts_skipped: usize,
    pub comments: usize,
    /// Set when a rate limit response stopped the run early
    pub rate_limited: bool,
}

/// Fetches and flattens the comment trees of the first `post_cap` posts,
/// appending to `collected` in post order.
///
/// A rate limit response halts the whole run; any other failure only skips
/// the post at hand. Comments gathered before a halt stay in `collected`.
pub async fn fetch_comments_for_posts<S>(
    source: &S,
    posts: &[Post],
    options: &CommentFetchOptions,
    collected: &mut Vec<Comment>,
) -> FetchSummary
where
    S: ListingSource + ?Sized,
{
    let mut summary = FetchSummary::default();
    let subset = &posts[..posts.len().min(options.post_cap)];
    let total = subset.len();
    info!("Fetching comments for at most {} posts...", total);

    for (index, post) in subset.iter().enumerate() {
        if post.id.is_empty() {
            continue;
        }

        info!("[{}/{}] Fetching comments for post {}...", index + 1, total, post.id);

        match fetch_post_comments(source, &post.id, options).await {
            Ok(comments) => {
                info!("  -> Got {} comments", comments.len());
                summary.posts_fetched += 1;
                summary.comments += comments.len();
                collected.extend(comments);
            }
            Err(e) => match ErrorRecovery::determine_strategy(&e) {
                RecoveryStrategy::Halt => {
                    match e.retry_after() {
                        Some(wait) => warn!(
                            "Hit rate limit (retry after {}s). Stopping further comment requests",
                            wait.as_secs()
                        ),
                        None => warn!("Hit rate limit. Stopping further comment requests"),
                    }
                    summary.rate_limited = true;
                    break;
                }
                RecoveryStrategy::Fail => {
                    e.log_error();
                    error!("Unrecoverable error while fetching comments, stopping");
                    break;
                }
                RecoveryStrategy::Skip | RecoveryStrategy::EndOfSource => {
                    warn!("  -> Skipping post {}: {}", post.id, e);
                    summary.posts_skipped += 1;
                }
            },
        }

        if index + 1 < total && !options.delay.is_zero() {
            sleep(options.delay).await;
        }
    }

    info!("Total flattened comments collected: {}", summary.comments);
    summary
}

async fn fetch_post_comments<S>(
    source: &S,
    post_id: &str,
    options: &CommentFetchOptions,
) -> Result<Vec<Comment>, CoreError>
where
    S: ListingSource + ?Sized,
{
    let thread = source
        .fetch_comments(post_id, options.per_post_cap, options.sort)
        .await?;
    let nodes = parse_comment_thread(thread)?;

    let mut comments = flatten_comment_tree(&nodes, post_id);
    // Upstream does not always honour `limit`
    comments.truncate(options.per_post_cap);
    Ok(comments)
}
