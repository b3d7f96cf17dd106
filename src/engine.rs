//! The search engine facade: index, parse, search, highlight in one place.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::analysis::analyzer::{Analyzer, StandardAnalyzer};
use crate::document::Document;
use crate::error::Result;
use crate::index::store::InvertedIndexStore;
use crate::index::writer::IndexWriter;
use crate::query::parser::QueryParser;
use crate::search::highlight::{HighlightConfig, Highlighter};
use crate::search::searcher::Searcher;
use crate::storage::{FileStorage, MemoryStorage, Storage, StorageConfig};

/// Configuration for a [`SearchEngine`].
#[derive(Clone)]
pub struct SearchEngineConfig {
    /// Analyzer used for indexing, query parsing, and highlighting.
    pub analyzer: Arc<dyn Analyzer>,
    /// Markup wrapped around highlighted terms in stored fields.
    pub highlight: HighlightConfig,
    /// Result limit for [`SearchEngine::search`].
    pub default_limit: usize,
    /// Longest highlighted fragment returned for a stored field, in bytes.
    pub max_fragment_len: usize,
}

impl Default for SearchEngineConfig {
    fn default() -> Self {
        SearchEngineConfig {
            analyzer: Arc::new(StandardAnalyzer::new()),
            highlight: HighlightConfig::default(),
            default_limit: 10,
            max_fragment_len: 100,
        }
    }
}

impl std::fmt::Debug for SearchEngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngineConfig")
            .field("analyzer", &self.analyzer.name())
            .field("highlight", &self.highlight)
            .field("default_limit", &self.default_limit)
            .field("max_fragment_len", &self.max_fragment_len)
            .finish()
    }
}

/// A search result with its stored fields, highlighted where they match.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matching document id.
    pub doc_id: u64,
    /// The relevance score.
    pub score: f32,
    /// Stored field values, with query terms wrapped in the configured
    /// highlight tags wherever they occur.
    pub fields: HashMap<String, String>,
}

/// A full-text search engine over a single index.
///
/// Ties together the index writer, query parser, searcher, and highlighter,
/// all sharing one analyzer so indexed terms, query terms, and highlight
/// matching agree.
#[derive(Debug)]
pub struct SearchEngine {
    writer: IndexWriter,
    parser: QueryParser,
    highlighter: Highlighter,
    default_limit: usize,
    max_fragment_len: usize,
}

impl SearchEngine {
    /// Open or create an engine over the given storage.
    pub fn new(storage: Arc<dyn Storage>, config: SearchEngineConfig) -> Result<Self> {
        let store = Arc::new(InvertedIndexStore::open_or_create(storage)?);
        let writer = IndexWriter::new(store, Arc::clone(&config.analyzer));
        let parser = QueryParser::new(Arc::clone(&config.analyzer));
        let highlighter = Highlighter::with_config(Arc::clone(&config.analyzer), config.highlight);

        Ok(SearchEngine {
            writer,
            parser,
            highlighter,
            default_limit: config.default_limit,
            max_fragment_len: config.max_fragment_len,
        })
    }

    /// Open or create an engine in a filesystem directory.
    pub fn open_dir<P: AsRef<Path>>(path: P, config: SearchEngineConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(path, StorageConfig::default())?);
        Self::new(storage, config)
    }

    /// Create an engine that lives entirely in memory.
    pub fn in_memory(config: SearchEngineConfig) -> Result<Self> {
        Self::new(Arc::new(MemoryStorage::new()), config)
    }

    /// Add a document and return its assigned id.
    ///
    /// Not searchable until [`SearchEngine::commit`].
    pub fn add_document(&self, doc: &Document) -> Result<u64> {
        self.writer.add_document(doc)
    }

    /// Mark a document for deletion at the next commit.
    pub fn delete_document(&self, doc_id: u64) -> Result<()> {
        self.writer.delete_document(doc_id)
    }

    /// Make all buffered adds and deletes durable and searchable.
    pub fn commit(&self) -> Result<()> {
        self.writer.commit()
    }

    /// Number of live documents in the committed index.
    pub fn doc_count(&self) -> u64 {
        use crate::index::reader::IndexReader;
        self.writer.reader().doc_count()
    }

    /// Search a field with the default result limit.
    pub fn search(&self, field: &str, query_str: &str) -> Result<Vec<SearchResult>> {
        self.search_with_limit(field, query_str, self.default_limit)
    }

    /// Search a field, returning at most `limit` results.
    ///
    /// The query string is parsed with the engine grammar (terms, `OR`,
    /// quoted phrases, parentheses). Results carry the document's stored
    /// fields, each with the query terms highlighted.
    pub fn search_with_limit(
        &self,
        field: &str,
        query_str: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let query = self.parser.parse(field, query_str)?;
        let reader = self.writer.reader();
        let searcher = Searcher::new(reader.clone());

        let top_docs = searcher.search(query.as_ref(), limit)?;

        let mut terms: Vec<(String, String)> = Vec::new();
        query.extract_terms(&mut terms);
        let mut highlight_terms: Vec<String> =
            terms.into_iter().map(|(_, term)| term).collect();
        highlight_terms.sort_unstable();
        highlight_terms.dedup();

        use crate::index::reader::IndexReader;
        let mut results = Vec::with_capacity(top_docs.hits.len());
        for hit in top_docs.hits {
            let mut fields = HashMap::new();
            if let Some(stored) = reader.stored_fields(hit.doc_id) {
                for (name, value) in stored {
                    let highlighted = self.highlighter.highlight(
                        value,
                        &highlight_terms,
                        self.max_fragment_len,
                    )?;
                    fields.insert(name.clone(), highlighted);
                }
            }

            results.push(SearchResult {
                doc_id: hit.doc_id,
                score: hit.score,
                fields,
            });
        }

        Ok(results)
    }
}
