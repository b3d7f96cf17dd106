//! Boolean query implementation for combining sub-queries.

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::query::matcher::{
    ConjunctionMatcher, DisjunctionMatcher, EmptyMatcher, Matcher, ReqOptMatcher,
};
use crate::query::query::Query;

/// How a clause participates in a boolean query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause may match; it contributes to the score when it does.
    Should,
}

/// A single clause in a boolean query.
#[derive(Debug, Clone)]
pub struct BooleanClause {
    /// The sub-query for this clause.
    pub query: Box<dyn Query>,
    /// How this clause participates.
    pub occur: Occur,
}

/// A query that combines sub-queries with boolean logic.
///
/// Documents must match every `Must` clause. With no `Must` clauses a
/// document matches when any `Should` clause matches. Scores are summed
/// over the clauses that match a document.
#[derive(Debug, Clone, Default)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
}

impl BooleanQuery {
    /// Create a new empty boolean query. It matches nothing until clauses
    /// are added.
    pub fn new() -> Self {
        BooleanQuery::default()
    }

    /// Add a clause.
    pub fn add_clause(&mut self, query: Box<dyn Query>, occur: Occur) {
        self.clauses.push(BooleanClause { query, occur });
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    /// Whether the query has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl Query for BooleanQuery {
    fn matcher(&self, reader: &dyn IndexReader) -> Result<Box<dyn Matcher>> {
        let mut must = Vec::new();
        let mut should = Vec::new();

        for clause in &self.clauses {
            let matcher = clause.query.matcher(reader)?;
            match clause.occur {
                Occur::Must => must.push(matcher),
                Occur::Should => should.push(matcher),
            }
        }

        match (must.is_empty(), should.is_empty()) {
            (true, true) => Ok(Box::new(EmptyMatcher::new())),
            (false, true) => Ok(Box::new(ConjunctionMatcher::new(must)?)),
            (true, false) => Ok(Box::new(DisjunctionMatcher::new(should))),
            (false, false) => {
                let required = Box::new(ConjunctionMatcher::new(must)?);
                Ok(Box::new(ReqOptMatcher::new(required, should)?))
            }
        }
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|clause| match clause.occur {
                Occur::Must => format!("+{}", clause.query.description()),
                Occur::Should => clause.query.description(),
            })
            .collect();
        format!("({})", parts.join(" "))
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn extract_terms(&self, terms: &mut Vec<(String, String)>) {
        for clause in &self.clauses {
            clause.query.extract_terms(terms);
        }
    }
}

/// A builder for boolean queries.
#[derive(Debug, Default)]
pub struct BooleanQueryBuilder {
    query: BooleanQuery,
}

impl BooleanQueryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        BooleanQueryBuilder::default()
    }

    /// Add a required clause.
    pub fn must(mut self, query: Box<dyn Query>) -> Self {
        self.query.add_clause(query, Occur::Must);
        self
    }

    /// Add an optional clause.
    pub fn should(mut self, query: Box<dyn Query>) -> Self {
        self.query.add_clause(query, Occur::Should);
        self
    }

    /// Build the final query.
    pub fn build(self) -> BooleanQuery {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::index::posting::Posting;
    use crate::index::store::InvertedIndexStore;
    use crate::query::term::TermQuery;
    use crate::storage::MemoryStorage;

    fn reader() -> crate::index::reader::StoreReader {
        let store = InvertedIndexStore::create(Arc::new(MemoryStorage::new())).unwrap();
        // doc 0: tofu; doc 1: tofu spicy; doc 2: spicy
        store.add_posting("body", "tofu", Posting::new(0, vec![0]));
        store.add_posting("body", "tofu", Posting::new(1, vec![0]));
        store.add_posting("body", "spicy", Posting::new(1, vec![1]));
        store.add_posting("body", "spicy", Posting::new(2, vec![0]));
        for _ in 0..3 {
            store.allocate_doc_id();
        }
        store.commit().unwrap();
        store.reader()
    }

    fn drain(mut matcher: Box<dyn Matcher>) -> Vec<u64> {
        let mut docs = Vec::new();
        while !matcher.is_exhausted() {
            docs.push(matcher.doc_id());
            matcher.next().unwrap();
        }
        docs
    }

    #[test]
    fn test_all_must_is_intersection() {
        let query = BooleanQueryBuilder::new()
            .must(Box::new(TermQuery::new("body", "tofu")))
            .must(Box::new(TermQuery::new("body", "spicy")))
            .build();
        assert_eq!(drain(query.matcher(&reader()).unwrap()), vec![1]);
    }

    #[test]
    fn test_all_should_is_union() {
        let query = BooleanQueryBuilder::new()
            .should(Box::new(TermQuery::new("body", "tofu")))
            .should(Box::new(TermQuery::new("body", "spicy")))
            .build();
        assert_eq!(drain(query.matcher(&reader()).unwrap()), vec![0, 1, 2]);
    }

    #[test]
    fn test_must_with_absent_term_matches_nothing() {
        let query = BooleanQueryBuilder::new()
            .must(Box::new(TermQuery::new("body", "tofu")))
            .must(Box::new(TermQuery::new("body", "absent")))
            .build();
        assert!(query.matcher(&reader()).unwrap().is_exhausted());
    }

    #[test]
    fn test_should_with_absent_term_still_matches_others() {
        let query = BooleanQueryBuilder::new()
            .should(Box::new(TermQuery::new("body", "tofu")))
            .should(Box::new(TermQuery::new("body", "absent")))
            .build();
        assert_eq!(drain(query.matcher(&reader()).unwrap()), vec![0, 1]);
    }

    #[test]
    fn test_empty_boolean_matches_nothing() {
        let query = BooleanQuery::new();
        assert!(query.matcher(&reader()).unwrap().is_exhausted());
    }

    #[test]
    fn test_mixed_must_should_scoring() {
        let query = BooleanQueryBuilder::new()
            .must(Box::new(TermQuery::new("body", "tofu")))
            .should(Box::new(TermQuery::new("body", "spicy")))
            .build();
        let mut matcher = query.matcher(&reader()).unwrap();

        // Matches follow the must clause.
        assert_eq!(matcher.doc_id(), 0);
        let score_without_opt = matcher.score();
        matcher.next().unwrap();
        assert_eq!(matcher.doc_id(), 1);
        // Doc 1 also matches the optional clause, so it scores higher.
        assert!(matcher.score() > score_without_opt);
    }

    #[test]
    fn test_extract_terms_recurses() {
        let query = BooleanQueryBuilder::new()
            .must(Box::new(TermQuery::new("body", "tofu")))
            .should(Box::new(TermQuery::new("body", "spicy")))
            .build();
        let mut terms = Vec::new();
        query.extract_terms(&mut terms);
        assert_eq!(
            terms,
            vec![
                ("body".to_string(), "tofu".to_string()),
                ("body".to_string(), "spicy".to_string())
            ]
        );
    }
}
