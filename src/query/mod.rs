//! Query types, parsing, matching, and result collection.

pub mod boolean;
pub mod collector;
pub mod matcher;
pub mod parser;
pub mod phrase;
pub mod query;
pub mod scorer;
pub mod term;

pub use boolean::{BooleanClause, BooleanQuery, BooleanQueryBuilder, Occur};
pub use collector::{Collector, CountCollector, TopDocsCollector};
pub use matcher::Matcher;
pub use parser::QueryParser;
pub use phrase::PhraseQuery;
pub use query::Query;
pub use scorer::TfIdfScorer;
pub use term::TermQuery;

/// A single search result: a document id and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The matching document id.
    pub doc_id: u64,
    /// The relevance score.
    pub score: f32,
}
