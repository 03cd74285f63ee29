pub mod api;
pub mod comments;
pub mod feed;
pub mod flatten;


pub use api::{
    parse_comment_thread, CommentSort, ListingSource, RedditApiClient, RedditCommentData,
    RedditListing, RedditListingChild, RedditListingData, RedditPostData, ReplyNode,
    COMMENT_KIND, REDDIT_PUBLIC_BASE,
};
pub use comments::{fetch_comments_for_posts, CommentFetchOptions, FetchSummary};
pub use feed::{collect_feed, scan_feed, FeedScanOptions, KeywordFilter, ScanOutcome};
pub use flatten::flatten_comment_tree;
