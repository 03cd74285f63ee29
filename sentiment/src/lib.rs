pub mod annotator;
pub mod scorer;

pub use annotator::{Annotator, TextSource};
pub use scorer::{PolarityScorer, VaderScorer};
