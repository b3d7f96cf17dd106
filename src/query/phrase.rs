//! Phrase query implementation for exact consecutive-term matching.

use std::sync::Arc;

use crate::error::Result;
use crate::index::posting::PostingList;
use crate::index::reader::IndexReader;
use crate::query::matcher::{EmptyMatcher, Matcher, NO_MORE_DOCS};
use crate::query::query::Query;
use crate::query::scorer::idf;

/// A query that matches documents containing its terms at consecutive
/// positions, in order.
///
/// A document matches only when for some position `p` the first term occurs
/// at `p`, the second at `p + 1`, and so on. The score is the number of such
/// phrase occurrences times the summed idf of the terms.
#[derive(Debug, Clone)]
pub struct PhraseQuery {
    /// The field to search in.
    field: String,
    /// The phrase terms, in order. Must already be normalized.
    terms: Vec<String>,
    /// The boost factor for this query.
    boost: f32,
}

impl PhraseQuery {
    /// Create a new phrase query.
    pub fn new<F, T>(field: F, terms: Vec<T>) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        PhraseQuery {
            field: field.into(),
            terms: terms.into_iter().map(Into::into).collect(),
            boost: 1.0,
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the phrase terms.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl Query for PhraseQuery {
    fn matcher(&self, reader: &dyn IndexReader) -> Result<Box<dyn Matcher>> {
        if self.terms.is_empty() {
            return Ok(Box::new(EmptyMatcher::new()));
        }

        let mut lists = Vec::with_capacity(self.terms.len());
        let mut idf_sum = 0.0;
        for term in &self.terms {
            match reader.postings(&self.field, term) {
                Some(postings) => {
                    idf_sum += idf(postings.doc_frequency(), reader.doc_count());
                    lists.push(postings);
                }
                // A phrase with an unindexed term cannot match.
                None => return Ok(Box::new(EmptyMatcher::new())),
            }
        }

        Ok(Box::new(PhraseMatcher::new(lists, idf_sum * self.boost)))
    }

    fn description(&self) -> String {
        format!("{}:\"{}\"", self.field, self.terms.join(" "))
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn extract_terms(&self, terms: &mut Vec<(String, String)>) {
        for term in &self.terms {
            terms.push((self.field.clone(), term.clone()));
        }
    }
}

/// A matcher over documents where all phrase terms align consecutively.
#[derive(Debug)]
pub struct PhraseMatcher {
    lists: Vec<Arc<PostingList>>,
    indices: Vec<usize>,
    idf_sum: f32,
    current: u64,
    phrase_freq: u32,
}

impl PhraseMatcher {
    /// Create a matcher positioned on the first phrase match.
    pub fn new(lists: Vec<Arc<PostingList>>, idf_sum: f32) -> Self {
        let indices = vec![0; lists.len()];
        let mut matcher = PhraseMatcher {
            lists,
            indices,
            idf_sum,
            current: NO_MORE_DOCS,
            phrase_freq: 0,
        };
        matcher.seek(0);
        matcher
    }

    /// Position on the first doc id >= target where the phrase occurs.
    fn seek(&mut self, mut target: u64) {
        'docs: loop {
            // Align all lists on one candidate document.
            let mut candidate = target;
            loop {
                let mut aligned = true;
                for (list, index) in self.lists.iter().zip(self.indices.iter_mut()) {
                    while *index < list.len() && list.postings[*index].doc_id < candidate {
                        *index += 1;
                    }
                    match list.postings.get(*index) {
                        Some(posting) => {
                            if posting.doc_id > candidate {
                                candidate = posting.doc_id;
                                aligned = false;
                            }
                        }
                        None => {
                            self.current = NO_MORE_DOCS;
                            self.phrase_freq = 0;
                            return;
                        }
                    }
                }
                if aligned {
                    break;
                }
            }

            let freq = self.phrase_freq_at_candidate();
            if freq > 0 {
                self.current = candidate;
                self.phrase_freq = freq;
                return;
            }

            target = candidate + 1;
            continue 'docs;
        }
    }

    /// Count positions where every term lines up consecutively.
    fn phrase_freq_at_candidate(&self) -> u32 {
        let first = &self.lists[0].postings[self.indices[0]];

        let mut freq = 0;
        'starts: for &start in &first.positions {
            for (offset, (list, &index)) in self
                .lists
                .iter()
                .zip(self.indices.iter())
                .enumerate()
                .skip(1)
            {
                let wanted = start + offset as u32;
                if list.postings[index].positions.binary_search(&wanted).is_err() {
                    continue 'starts;
                }
            }
            freq += 1;
        }
        freq
    }
}

impl Matcher for PhraseMatcher {
    fn doc_id(&self) -> u64 {
        self.current
    }

    fn next(&mut self) -> Result<bool> {
        if self.current == NO_MORE_DOCS {
            return Ok(false);
        }
        let target = self.current + 1;
        self.seek(target);
        Ok(self.current != NO_MORE_DOCS)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.current == NO_MORE_DOCS {
            return Ok(false);
        }
        if self.current < target {
            self.seek(target);
        }
        Ok(self.current != NO_MORE_DOCS)
    }

    fn score(&self) -> f32 {
        self.phrase_freq as f32 * self.idf_sum
    }

    fn cost(&self) -> u64 {
        self.lists
            .iter()
            .map(|list| list.len() as u64)
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::posting::Posting;
    use crate::index::store::InvertedIndexStore;
    use crate::storage::MemoryStorage;

    fn index_texts(texts: &[&str]) -> crate::index::reader::StoreReader {
        let store = InvertedIndexStore::create(Arc::new(MemoryStorage::new())).unwrap();
        for text in texts {
            let doc_id = store.allocate_doc_id();
            let words: Vec<&str> = text.split_whitespace().collect();
            let mut positions: std::collections::HashMap<&str, Vec<u32>> =
                std::collections::HashMap::new();
            for (position, word) in words.iter().enumerate() {
                positions.entry(word).or_default().push(position as u32);
            }
            for (word, positions) in positions {
                store.add_posting("body", word, Posting::new(doc_id, positions));
            }
        }
        store.commit().unwrap();
        store.reader()
    }

    #[test]
    fn test_phrase_requires_adjacency() {
        let reader = index_texts(&[
            "spicy tofu is great",
            "tofu spicy is backwards",
            "spicy red tofu",
        ]);

        let query = PhraseQuery::new("body", vec!["spicy", "tofu"]);
        let mut matcher = query.matcher(&reader).unwrap();

        assert_eq!(matcher.doc_id(), 0);
        assert!(!matcher.next().unwrap());
    }

    #[test]
    fn test_phrase_counts_occurrences() {
        let reader = index_texts(&["spicy tofu and spicy tofu again", "spicy tofu once"]);

        let query = PhraseQuery::new("body", vec!["spicy", "tofu"]);
        let matcher = query.matcher(&reader).unwrap();

        assert_eq!(matcher.doc_id(), 0);
        let single = PhraseQuery::new("body", vec!["spicy", "tofu"])
            .matcher(&reader)
            .unwrap();
        // Two occurrences in doc 0 score double one occurrence.
        let mut one = single;
        one.skip_to(1).unwrap();
        assert!((matcher.score() - 2.0 * one.score()).abs() < 1e-6);
    }

    #[test]
    fn test_phrase_with_missing_term() {
        let reader = index_texts(&["spicy tofu"]);
        let query = PhraseQuery::new("body", vec!["spicy", "noodles"]);
        assert!(query.matcher(&reader).unwrap().is_exhausted());
    }

    #[test]
    fn test_three_term_phrase() {
        let reader = index_texts(&["one two three four", "one two four three"]);
        let query = PhraseQuery::new("body", vec!["two", "three", "four"]);
        let matcher = query.matcher(&reader).unwrap();

        assert_eq!(matcher.doc_id(), 0);
    }

    #[test]
    fn test_empty_phrase() {
        let reader = index_texts(&["anything"]);
        let query = PhraseQuery::new("body", Vec::<String>::new());
        assert!(query.matcher(&reader).unwrap().is_exhausted());
    }

    #[test]
    fn test_skip_to() {
        let reader = index_texts(&["spicy tofu", "plain rice", "spicy tofu again"]);
        let query = PhraseQuery::new("body", vec!["spicy", "tofu"]);
        let mut matcher = query.matcher(&reader).unwrap();

        assert!(matcher.skip_to(1).unwrap());
        assert_eq!(matcher.doc_id(), 2);
    }
}
