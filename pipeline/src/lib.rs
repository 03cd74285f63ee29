//! Extract, transform and load stages of the Reddit sentiment pipeline.

pub mod annotate;
pub mod extract;
pub mod load;
pub mod transform;

pub use annotate::annotate_json_file;
pub use extract::{extract, reddit_client, save_extraction, ExtractSummary, Extraction};
pub use load::{load, load_comments, load_posts, LoadOptions, LoadSummary};
pub use transform::{clean_comment, clean_post, transform, TransformSummary};
