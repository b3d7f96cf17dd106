//! Base query trait.

use std::fmt::Debug;

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::query::matcher::Matcher;

/// Trait for search queries.
///
/// A query is a description of what to match; executing it produces a
/// [`Matcher`] bound to a specific index snapshot. Queries never analyze
/// text themselves, their terms must already be normalized.
pub trait Query: Send + Sync + Debug {
    /// Create a matcher for this query over the given reader.
    ///
    /// The matcher is positioned on its first match, or exhausted if there
    /// is none.
    fn matcher(&self, reader: &dyn IndexReader) -> Result<Box<dyn Matcher>>;

    /// Get a human-readable description of this query.
    fn description(&self) -> String;

    /// Clone this query.
    fn clone_box(&self) -> Box<dyn Query>;

    /// Collect the (field, term) pairs this query matches on.
    ///
    /// Used by the highlighter to know which terms to mark in stored text.
    fn extract_terms(&self, terms: &mut Vec<(String, String)>);
}

impl Clone for Box<dyn Query> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
