//! The index writer: analysis, document id assignment, buffering.

use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::analyzer::Analyzer;
use crate::document::Document;
use crate::error::{LanceaError, Result};
use crate::index::posting::Posting;
use crate::index::reader::StoreReader;
use crate::index::store::InvertedIndexStore;

/// Writes documents into an [`InvertedIndexStore`].
///
/// The writer owns the analyzer, so every indexed field goes through the
/// same normalization. Added documents are buffered in the store and become
/// searchable only after [`IndexWriter::commit`].
pub struct IndexWriter {
    store: Arc<InvertedIndexStore>,
    analyzer: Arc<dyn Analyzer>,
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("analyzer", &self.analyzer.name())
            .finish_non_exhaustive()
    }
}

impl IndexWriter {
    /// Create a writer over a store with the given analyzer.
    pub fn new(store: Arc<InvertedIndexStore>, analyzer: Arc<dyn Analyzer>) -> Self {
        IndexWriter { store, analyzer }
    }

    /// The analyzer used for indexing.
    ///
    /// Query parsing must use the same analyzer or terms will not line up.
    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Add a document and return its assigned id.
    ///
    /// Ids are assigned in increasing order and never reused. The document
    /// is not searchable until the next commit.
    pub fn add_document(&self, doc: &Document) -> Result<u64> {
        if doc.is_empty() {
            return Err(LanceaError::invalid_argument("document has no fields"));
        }

        let doc_id = self.store.allocate_doc_id();

        for (field, value) in doc.fields() {
            let mut term_positions: AHashMap<String, Vec<u32>> = AHashMap::new();
            for token in self.analyzer.analyze(&value.text)? {
                term_positions
                    .entry(token.text)
                    .or_default()
                    .push(token.position as u32);
            }

            for (term, positions) in term_positions {
                self.store
                    .add_posting(field, &term, Posting::new(doc_id, positions));
            }

            if value.stored {
                self.store.add_stored(doc_id, field, value.text.clone());
            }
        }

        Ok(doc_id)
    }

    /// Mark a document for deletion at the next commit.
    pub fn delete_document(&self, doc_id: u64) -> Result<()> {
        self.store.delete_document(doc_id)
    }

    /// Commit all buffered changes.
    pub fn commit(&self) -> Result<()> {
        self.store.commit()
    }

    /// Get a snapshot reader over the committed state.
    pub fn reader(&self) -> StoreReader {
        self.store.reader()
    }
}
