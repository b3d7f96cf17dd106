//! Collector implementations for gathering search results.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use crate::query::SearchHit;

/// Trait for collecting scored documents during a search.
pub trait Collector: Send + Debug {
    /// Collect a document hit.
    fn collect(&mut self, doc_id: u64, score: f32);

    /// Total number of hits seen, including those not kept.
    fn total_hits(&self) -> u64;

    /// Consume the collector and return its results.
    fn into_results(self: Box<Self>) -> Vec<SearchHit>;
}

/// A scored document in the collector's heap.
///
/// Ordered so the heap's maximum is the worst kept hit: lower score is
/// "greater", and on equal scores the higher doc id is "greater". This
/// makes ranking fully deterministic.
#[derive(Debug, Clone)]
struct ScoredDoc {
    doc_id: u64,
    score: f32,
}

impl PartialEq for ScoredDoc {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.doc_id == other.doc_id
    }
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// A collector that keeps the top N documents by score.
///
/// Ties are broken by ascending doc id, so the same index and query always
/// produce the same ranking.
#[derive(Debug)]
pub struct TopDocsCollector {
    max_docs: usize,
    hits: BinaryHeap<ScoredDoc>,
    total_hits: u64,
}

impl TopDocsCollector {
    /// Create a collector keeping at most `max_docs` hits.
    pub fn new(max_docs: usize) -> Self {
        TopDocsCollector {
            max_docs,
            hits: BinaryHeap::with_capacity(max_docs + 1),
            total_hits: 0,
        }
    }
}

impl Collector for TopDocsCollector {
    fn collect(&mut self, doc_id: u64, score: f32) {
        self.total_hits += 1;

        let candidate = ScoredDoc { doc_id, score };
        if self.hits.len() < self.max_docs {
            self.hits.push(candidate);
        } else if let Some(worst) = self.hits.peek()
            && candidate.cmp(worst) == Ordering::Less
        {
            self.hits.pop();
            self.hits.push(candidate);
        }
    }

    fn total_hits(&self) -> u64 {
        self.total_hits
    }

    fn into_results(self: Box<Self>) -> Vec<SearchHit> {
        let mut results: Vec<SearchHit> = self
            .hits
            .into_iter()
            .map(|doc| SearchHit {
                doc_id: doc.doc_id,
                score: doc.score,
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });

        results
    }
}

/// A collector that only counts matches.
#[derive(Debug, Default)]
pub struct CountCollector {
    count: u64,
}

impl CountCollector {
    /// Create a new count collector.
    pub fn new() -> Self {
        CountCollector::default()
    }

    /// Number of matches counted.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Collector for CountCollector {
    fn collect(&mut self, _doc_id: u64, _score: f32) {
        self.count += 1;
    }

    fn total_hits(&self) -> u64 {
        self.count
    }

    fn into_results(self: Box<Self>) -> Vec<SearchHit> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_top_n_by_score() {
        let mut collector = Box::new(TopDocsCollector::new(2));
        collector.collect(1, 0.5);
        collector.collect(2, 2.0);
        collector.collect(3, 1.0);
        collector.collect(4, 0.1);

        assert_eq!(collector.total_hits(), 4);
        let results = collector.into_results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].doc_id, 2);
        assert_eq!(results[1].doc_id, 3);
    }

    #[test]
    fn test_ties_broken_by_doc_id() {
        let mut collector = Box::new(TopDocsCollector::new(2));
        collector.collect(9, 1.0);
        collector.collect(3, 1.0);
        collector.collect(5, 1.0);

        let results = collector.into_results();
        assert_eq!(results.len(), 2);
        // Equal scores keep the lowest doc ids, in ascending order.
        assert_eq!(results[0].doc_id, 3);
        assert_eq!(results[1].doc_id, 5);
    }

    #[test]
    fn test_results_sorted_score_desc_then_doc_asc() {
        let mut collector = Box::new(TopDocsCollector::new(10));
        collector.collect(7, 1.0);
        collector.collect(1, 3.0);
        collector.collect(4, 1.0);

        let results = collector.into_results();
        let ids: Vec<u64> = results.iter().map(|hit| hit.doc_id).collect();
        assert_eq!(ids, vec![1, 4, 7]);
    }

    #[test]
    fn test_fewer_hits_than_capacity() {
        let mut collector = Box::new(TopDocsCollector::new(10));
        collector.collect(1, 1.0);

        let results = collector.into_results();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_count_collector() {
        let mut collector = CountCollector::new();
        collector.collect(1, 1.0);
        collector.collect(2, 0.0);
        assert_eq!(collector.count(), 2);
    }
}
