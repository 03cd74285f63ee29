use async_trait::async_trait;
use pulse_core::{null_as_default, CoreError, Post, RedditApiError};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const REDDIT_PUBLIC_BASE: &str = "https://www.reddit.com";

/// Kind tag of a comment node in a reply tree.
pub const COMMENT_KIND: &str = "t1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RedditListing<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RedditListingData<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// Any field may arrive as `null` (deleted authors, removed posts); those
/// read as the field's default instead of failing the whole page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditPostData {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub author: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub subreddit: String,
    pub url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub permalink: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_utc: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub num_comments: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub over_18: bool,
    pub upvote_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditCommentData {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub parent_id: String,
    pub author: Option<String>,
    pub body: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub created_utc: f64,
    /// Reddit sends an empty string when a comment has no replies
    #[serde(deserialize_with = "lenient_replies")]
    pub replies: Option<RedditListing<RedditCommentData>>,
}

/// A node of a comment tree as delivered in a tagged envelope.
pub type ReplyNode = RedditListingChild<RedditCommentData>;

fn lenient_replies<'de, D>(
    deserializer: D,
) -> Result<Option<RedditListing<RedditCommentData>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(listing) => Ok(Some(listing)),
        Err(e) => {
            debug!("Ignoring malformed replies listing: {}", e);
            Ok(None)
        }
    }
}

impl RedditPostData {
    pub fn into_post(self, base_url: &str) -> Post {
        Post {
            id: self.id,
            subreddit: self.subreddit,
            title: self.title.unwrap_or_default(),
            selftext: self.selftext.unwrap_or_default(),
            score: self.score,
            num_comments: self.num_comments,
            created_utc: self.created_utc,
            author: self.author,
            url: self.url.unwrap_or_default(),
            permalink: format!("{}{}", base_url, self.permalink),
            over_18: self.over_18,
            upvote_ratio: self.upvote_ratio.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSort {
    Top,
    Best,
    New,
    Controversial,
}

impl CommentSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentSort::Top => "top",
            CommentSort::Best => "best",
            CommentSort::New => "new",
            CommentSort::Controversial => "controversial",
        }
    }
}

/// Extracts the comment listing from a thread response.
///
/// A thread response is a two element array: the post's own listing followed
/// by the comment listing.
pub fn parse_comment_thread(value: serde_json::Value) -> Result<Vec<ReplyNode>, RedditApiError> {
    let serde_json::Value::Array(mut parts) = value else {
        return Err(RedditApiError::InvalidResponse {
            details: "comment thread is not an array".to_string(),
        });
    };
    if parts.len() < 2 {
        return Err(RedditApiError::InvalidResponse {
            details: format!("comment thread has {} parts, expected 2", parts.len()),
        });
    }

    let listing: RedditListing<RedditCommentData> = serde_json::from_value(parts.swap_remove(1))
        .map_err(|e| RedditApiError::InvalidResponse {
            details: format!("comment listing could not be parsed: {}", e),
        })?;
    Ok(listing.data.children)
}

/// A paginated source of posts and comment threads.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Base used to turn relative permalinks into absolute URLs
    fn base_url(&self) -> &str;

    async fn fetch_new(
        &self,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError>;

    async fn fetch_comments(
        &self,
        post_id: &str,
        limit: usize,
        sort: CommentSort,
    ) -> Result<serde_json::Value, CoreError>;
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    base_url: String,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn make_request(
        &self,
        endpoint: &str,
        query_params: &[(&str, String)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);

        debug!("Making Reddit request: GET {} {:?}", endpoint, query_params);
        let response = match self.http_client.get(&url).query(query_params).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for GET {}: {}", endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        Err(CoreError::RedditApi(status_error(&response, endpoint)))
    }
}

fn status_error(response: &Response, endpoint: &str) -> RedditApiError {
    let status = response.status();
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|secs| secs.ceil() as u64)
                .unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        StatusCode::FORBIDDEN => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        StatusCode::NOT_FOUND => RedditApiError::InvalidResponse {
            details: format!("{} not found", endpoint),
        },
        s if s.is_server_error() => RedditApiError::ServerError {
            status_code: s.as_u16(),
        },
        s => RedditApiError::RequestFailed {
            status_code: s.as_u16(),
        },
    }
}

#[async_trait]
impl ListingSource for RedditApiClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_new(
        &self,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/new.json", subreddit);
        let mut params = vec![("limit", limit.to_string())];
        if let Some(after_val) = after {
            params.push(("after", after_val.to_string()));
        }

        let response = self.make_request(&endpoint, &params).await?;
        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit listing: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    async fn fetch_comments(
        &self,
        post_id: &str,
        limit: usize,
        sort: CommentSort,
    ) -> Result<serde_json::Value, CoreError> {
        let endpoint = format!("/comments/{}.json", post_id);
        let params = [
            ("limit", limit.to_string()),
            ("sort", sort.as_str().to_string()),
        ];

        let response = self.make_request(&endpoint, &params).await?;
        response.json().await.map_err(|e| {
            error!("Failed to parse comments for {}: {}", post_id, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Comments for {} are not valid JSON", post_id),
            })
        })
    }
}
