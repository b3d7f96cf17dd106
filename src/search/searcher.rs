//! The searcher: drives a query's matcher over an index snapshot.

use crate::error::{LanceaError, Result};
use crate::index::reader::IndexReader;
use crate::query::collector::{Collector, CountCollector, TopDocsCollector};
use crate::query::query::Query;
use crate::query::SearchHit;

/// The ranked results of a search.
#[derive(Debug, Clone)]
pub struct TopDocs {
    /// Hits sorted by descending score, ties by ascending doc id.
    pub hits: Vec<SearchHit>,
    /// Total number of matching documents, including those beyond the limit.
    pub total_hits: u64,
}

/// Executes queries against a single index snapshot.
///
/// The searcher sees exactly the commits present in the reader it was built
/// over; concurrent commits do not affect in-flight searches.
#[derive(Debug)]
pub struct Searcher<R: IndexReader> {
    reader: R,
}

impl<R: IndexReader> Searcher<R> {
    /// Create a searcher over a reader.
    pub fn new(reader: R) -> Self {
        Searcher { reader }
    }

    /// The underlying reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Run a query and return the top `limit` hits.
    ///
    /// Deleted documents never appear in results. A limit of zero is an
    /// `InvalidArgument` error, reported before any matching work happens.
    pub fn search(&self, query: &dyn Query, limit: usize) -> Result<TopDocs> {
        if limit == 0 {
            return Err(LanceaError::invalid_argument("search limit must be > 0"));
        }

        let mut collector = Box::new(TopDocsCollector::new(limit));
        self.collect(query, collector.as_mut())?;

        let total_hits = collector.total_hits();
        Ok(TopDocs {
            hits: collector.into_results(),
            total_hits,
        })
    }

    /// Count the documents matching a query.
    pub fn count(&self, query: &dyn Query) -> Result<u64> {
        let mut collector = CountCollector::new();
        self.collect(query, &mut collector)?;
        Ok(collector.count())
    }

    fn collect(&self, query: &dyn Query, collector: &mut dyn Collector) -> Result<()> {
        let mut matcher = query.matcher(&self.reader)?;

        while !matcher.is_exhausted() {
            let doc_id = matcher.doc_id();
            if !self.reader.is_deleted(doc_id) {
                collector.collect(doc_id, matcher.score());
            }
            matcher.next()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::analyzer::StandardAnalyzer;
    use crate::document::Document;
    use crate::index::store::InvertedIndexStore;
    use crate::index::writer::IndexWriter;
    use crate::query::parser::QueryParser;
    use crate::storage::MemoryStorage;

    fn build_index(texts: &[&str]) -> IndexWriter {
        let store = Arc::new(InvertedIndexStore::create(Arc::new(MemoryStorage::new())).unwrap());
        let writer = IndexWriter::new(store, Arc::new(StandardAnalyzer::new()));
        for text in texts {
            let doc = Document::builder().add_text("body", *text).build();
            writer.add_document(&doc).unwrap();
        }
        writer.commit().unwrap();
        writer
    }

    fn parse(query: &str) -> Box<dyn crate::query::Query> {
        QueryParser::new(Arc::new(StandardAnalyzer::new()))
            .parse("body", query)
            .unwrap()
    }

    #[test]
    fn test_search_ranks_by_tf() {
        let writer = build_index(&[
            "tofu",
            "tofu tofu tofu",
            "tofu tofu",
            "rice",
        ]);
        let searcher = Searcher::new(writer.reader());

        let results = searcher.search(parse("tofu").as_ref(), 10).unwrap();
        let ids: Vec<u64> = results.hits.iter().map(|hit| hit.doc_id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert_eq!(results.total_hits, 3);
    }

    #[test]
    fn test_limit_truncates_but_counts_all() {
        let writer = build_index(&["tofu", "tofu", "tofu", "tofu"]);
        let searcher = Searcher::new(writer.reader());

        let results = searcher.search(parse("tofu").as_ref(), 2).unwrap();
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.total_hits, 4);
    }

    #[test]
    fn test_zero_limit_is_invalid() {
        let writer = build_index(&["tofu"]);
        let searcher = Searcher::new(writer.reader());

        let err = searcher.search(parse("tofu").as_ref(), 0).unwrap_err();
        assert!(matches!(err, LanceaError::InvalidArgument(_)));
    }

    #[test]
    fn test_and_query_requires_all_terms() {
        let writer = build_index(&["spicy tofu", "spicy rice", "plain tofu"]);
        let searcher = Searcher::new(writer.reader());

        let results = searcher.search(parse("spicy tofu").as_ref(), 10).unwrap();
        let ids: Vec<u64> = results.hits.iter().map(|hit| hit.doc_id).collect();
        assert_eq!(ids, vec![0]);
    }

    #[test]
    fn test_and_with_absent_term_is_empty_not_error() {
        let writer = build_index(&["spicy tofu"]);
        let searcher = Searcher::new(writer.reader());

        let results = searcher.search(parse("spicy quinoa").as_ref(), 10).unwrap();
        assert!(results.hits.is_empty());
        assert_eq!(results.total_hits, 0);
    }

    #[test]
    fn test_or_query_matches_either() {
        let writer = build_index(&["spicy tofu", "spicy rice", "plain noodles"]);
        let searcher = Searcher::new(writer.reader());

        let results = searcher.search(parse("tofu OR rice").as_ref(), 10).unwrap();
        let mut ids: Vec<u64> = results.hits.iter().map(|hit| hit.doc_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_deleted_docs_filtered() {
        let writer = build_index(&["tofu one", "tofu two"]);
        writer.delete_document(0).unwrap();
        writer.commit().unwrap();
        let searcher = Searcher::new(writer.reader());

        let results = searcher.search(parse("tofu").as_ref(), 10).unwrap();
        let ids: Vec<u64> = results.hits.iter().map(|hit| hit.doc_id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_equal_scores_ordered_by_doc_id() {
        let writer = build_index(&["tofu dish", "tofu meal", "tofu plate"]);
        let searcher = Searcher::new(writer.reader());

        let results = searcher.search(parse("tofu").as_ref(), 10).unwrap();
        let ids: Vec<u64> = results.hits.iter().map(|hit| hit.doc_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_count() {
        let writer = build_index(&["tofu", "tofu", "rice"]);
        let searcher = Searcher::new(writer.reader());
        assert_eq!(searcher.count(parse("tofu").as_ref()).unwrap(), 2);
    }
}
