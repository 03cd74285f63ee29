use database::{read_json_records, write_comments, write_posts};
use pulse_core::{
    normalize, timestamp_from_epoch, CleanComment, CleanPost, Comment, CoreError, Post,
    StorageConfig,
};
use sentiment::{Annotator, PolarityScorer};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    pub posts: usize,
    pub comments: usize,
}

pub fn clean_post(post: Post) -> CleanPost {
    let created_at = timestamp_from_epoch(post.created_utc);
    let title_clean = normalize(Some(&post.title));
    let selftext_clean = normalize(Some(&post.selftext));
    let text_combined_clean = format!("{} {}", title_clean, selftext_clean)
        .trim()
        .to_string();

    CleanPost {
        post,
        created_at,
        created_date: created_at.date_naive(),
        title_clean,
        selftext_clean,
        text_combined_clean,
    }
}

pub fn clean_comment(comment: Comment) -> CleanComment {
    let created_at = timestamp_from_epoch(comment.created_utc);
    let body_clean = normalize(Some(&comment.body));

    CleanComment {
        comment,
        created_at,
        created_date: created_at.date_naive(),
        body_clean,
    }
}

fn load_raw_posts(storage: &StorageConfig) -> Result<Vec<Post>, CoreError> {
    let posts: Vec<Post> = read_json_records(&storage.raw_posts_path())?;
    if posts.is_empty() {
        return Err(CoreError::InvalidInput {
            message: "posts file is empty, did extraction fail?".to_string(),
        });
    }
    Ok(posts)
}

/// Comments are optional: a missing file means there is nothing to clean.
fn load_raw_comments(storage: &StorageConfig) -> Result<Vec<Comment>, CoreError> {
    match read_json_records(&storage.raw_comments_path()) {
        Ok(comments) => Ok(comments),
        Err(CoreError::MissingInput { path }) => {
            info!("No comments file found at {}", path);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Cleans and annotates the raw JSON records and writes them as Parquet.
pub fn transform<S: PolarityScorer>(
    storage: &StorageConfig,
    annotator: &Annotator<S>,
) -> Result<TransformSummary, CoreError> {
    info!("Loading and transforming posts...");
    let posts = load_raw_posts(storage)?;
    let posts = annotator.annotate_all(posts.into_iter().map(clean_post).collect());
    info!("Cleaned {} posts", posts.len());

    info!("Loading and transforming comments...");
    let comments = load_raw_comments(storage)?;
    let comments = annotator.annotate_all(comments.into_iter().map(clean_comment).collect());
    info!("Cleaned {} comments", comments.len());

    write_posts(&storage.clean_posts_path(), &posts)?;
    if comments.is_empty() {
        info!("No comments to save");
    } else {
        write_comments(&storage.clean_comments_path(), &comments)?;
    }

    Ok(TransformSummary {
        posts: posts.len(),
        comments: comments.len(),
    })
}
