//! Term query implementation for exact term matching.

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::query::matcher::{EmptyMatcher, Matcher, TermMatcher};
use crate::query::query::Query;
use crate::query::scorer::TfIdfScorer;

/// A query that matches documents containing a specific term.
#[derive(Debug, Clone)]
pub struct TermQuery {
    /// The field to search in.
    field: String,
    /// The term to search for.
    term: String,
    /// The boost factor for this query.
    boost: f32,
}

impl TermQuery {
    /// Create a new term query.
    ///
    /// The term is matched exactly and is NOT analyzed; it must already be
    /// in normalized form. Use [`crate::query::QueryParser`] to go from raw
    /// query strings to normalized terms.
    pub fn new<F, T>(field: F, term: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        TermQuery {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl Query for TermQuery {
    fn matcher(&self, reader: &dyn IndexReader) -> Result<Box<dyn Matcher>> {
        match reader.postings(&self.field, &self.term) {
            Some(postings) => {
                let scorer =
                    TfIdfScorer::new(postings.doc_frequency(), reader.doc_count(), self.boost);
                Ok(Box::new(TermMatcher::new(postings, scorer)))
            }
            None => Ok(Box::new(EmptyMatcher::new())),
        }
    }

    fn description(&self) -> String {
        if self.boost == 1.0 {
            format!("{}:{}", self.field, self.term)
        } else {
            format!("{}:{}^{}", self.field, self.term, self.boost)
        }
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn extract_terms(&self, terms: &mut Vec<(String, String)>) {
        terms.push((self.field.clone(), self.term.clone()));
    }
}
