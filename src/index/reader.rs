//! Read access to a committed index snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use crate::index::posting::PostingList;
use crate::index::store::Segment;

/// Read-only access to an index.
///
/// A reader is a snapshot: it reflects the commits that existed when it was
/// obtained and never sees later writes. Searches run entirely against one
/// reader, so a commit in the middle of a search cannot tear its results.
pub trait IndexReader: Send + Sync {
    /// Number of live (non-deleted) documents.
    fn doc_count(&self) -> u64;

    /// One past the highest assigned document id.
    fn max_doc(&self) -> u64;

    /// Get the posting list for a term in a field.
    fn postings(&self, field: &str, term: &str) -> Option<Arc<PostingList>>;

    /// Number of documents containing the term in the field.
    fn doc_freq(&self, field: &str, term: &str) -> u64;

    /// Get the stored field values of a document, if any were stored.
    fn stored_fields(&self, doc_id: u64) -> Option<&HashMap<String, String>>;

    /// Whether the document has been deleted.
    fn is_deleted(&self, doc_id: u64) -> bool;
}

/// An [`IndexReader`] over a single committed segment.
#[derive(Debug, Clone)]
pub struct StoreReader {
    segment: Arc<Segment>,
}

impl StoreReader {
    /// Create a reader over a segment snapshot.
    pub(crate) fn new(segment: Arc<Segment>) -> Self {
        StoreReader { segment }
    }

    /// Generation of the underlying committed segment.
    pub fn segment_generation(&self) -> u64 {
        self.segment.generation
    }

    /// All terms indexed under a field, unsorted.
    pub fn field_terms(&self, field: &str) -> Vec<&str> {
        self.segment
            .fields
            .get(field)
            .map(|terms| terms.keys().map(|t| t.as_str()).collect())
            .unwrap_or_default()
    }
}

impl IndexReader for StoreReader {
    fn doc_count(&self) -> u64 {
        self.segment.doc_count
    }

    fn max_doc(&self) -> u64 {
        self.segment.next_doc_id
    }

    fn postings(&self, field: &str, term: &str) -> Option<Arc<PostingList>> {
        self.segment
            .fields
            .get(field)
            .and_then(|terms| terms.get(term))
            .cloned()
    }

    fn doc_freq(&self, field: &str, term: &str) -> u64 {
        self.segment
            .fields
            .get(field)
            .and_then(|terms| terms.get(term))
            .map(|list| list.doc_frequency())
            .unwrap_or(0)
    }

    fn stored_fields(&self, doc_id: u64) -> Option<&HashMap<String, String>> {
        self.segment.stored.get(&doc_id)
    }

    fn is_deleted(&self, doc_id: u64) -> bool {
        self.segment.deleted.contains(&doc_id)
    }
}
