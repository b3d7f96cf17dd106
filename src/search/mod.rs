//! Search execution and result highlighting.

pub mod highlight;
pub mod searcher;

pub use highlight::{HighlightConfig, Highlighter};
pub use searcher::{Searcher, TopDocs};
