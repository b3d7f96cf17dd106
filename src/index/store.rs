//! The inverted index store: buffered writes, durable commits, snapshots.
//!
//! The store keeps two states. The committed segment is an immutable snapshot
//! behind an `Arc`; readers clone the `Arc` and are unaffected by later
//! writes. Pending changes accumulate in a buffer and become visible only
//! when [`InvertedIndexStore::commit`] succeeds. A failed commit leaves both
//! the committed segment and the pending buffer untouched, so it can be
//! retried.
//!
//! On disk an index is a `metadata.json` plus one generation-stamped segment
//! file. Commits write the new segment to a temporary file, rename it into
//! place, and write the metadata last, so a crash at any point leaves the
//! previous generation readable.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::{LanceaError, Result};
use crate::index::posting::{Posting, PostingList};
use crate::index::reader::StoreReader;
use crate::storage::structured::{StructReader, StructWriter};
use crate::storage::{FileStorage, Storage, StorageConfig};

const SEGMENT_MAGIC: u32 = u32::from_le_bytes(*b"LIDX");
const FORMAT_VERSION: u32 = 1;
const METADATA_FILE: &str = "metadata.json";

/// An immutable committed snapshot of the index.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    /// Commit generation, incremented on every successful commit.
    pub generation: u64,
    /// One past the highest assigned document id.
    pub next_doc_id: u64,
    /// Number of live (non-deleted) documents.
    pub doc_count: u64,
    /// field -> term -> posting list.
    pub fields: AHashMap<String, AHashMap<String, Arc<PostingList>>>,
    /// doc_id -> stored field values.
    pub stored: AHashMap<u64, HashMap<String, String>>,
    /// Tombstoned document ids.
    pub deleted: AHashSet<u64>,
}

impl Segment {
    fn write_to<W: crate::storage::StorageOutput>(
        &self,
        writer: &mut StructWriter<W>,
    ) -> Result<()> {
        writer.write_u32(SEGMENT_MAGIC)?;
        writer.write_u32(FORMAT_VERSION)?;
        writer.write_u64(self.next_doc_id)?;
        writer.write_u64(self.doc_count)?;

        let mut deleted: Vec<u64> = self.deleted.iter().copied().collect();
        deleted.sort_unstable();
        writer.write_varint(deleted.len() as u64)?;
        let mut previous = 0u64;
        for doc_id in deleted {
            writer.write_varint(doc_id.wrapping_sub(previous))?;
            previous = doc_id;
        }

        // Fields and terms are written sorted so identical segments produce
        // identical bytes.
        let mut field_names: Vec<&String> = self.fields.keys().collect();
        field_names.sort();
        writer.write_varint(field_names.len() as u64)?;
        for field in field_names {
            writer.write_string(field)?;

            let terms = &self.fields[field];
            let mut term_names: Vec<&String> = terms.keys().collect();
            term_names.sort();
            writer.write_varint(term_names.len() as u64)?;
            for term in term_names {
                writer.write_string(term)?;
                terms[term].write_to(writer)?;
            }
        }

        let mut doc_ids: Vec<u64> = self.stored.keys().copied().collect();
        doc_ids.sort_unstable();
        writer.write_varint(doc_ids.len() as u64)?;
        for doc_id in doc_ids {
            writer.write_varint(doc_id)?;

            let fields = &self.stored[&doc_id];
            let mut names: Vec<&String> = fields.keys().collect();
            names.sort();
            writer.write_varint(names.len() as u64)?;
            for name in names {
                writer.write_string(name)?;
                writer.write_string(&fields[name])?;
            }
        }

        Ok(())
    }

    fn read_from<R: crate::storage::StorageInput>(
        reader: &mut StructReader<R>,
        generation: u64,
    ) -> Result<Self> {
        let magic = reader.read_u32()?;
        if magic != SEGMENT_MAGIC {
            return Err(LanceaError::malformed_input(format!(
                "bad segment magic: {magic:#010x}"
            )));
        }
        let version = reader.read_u32()?;
        if version != FORMAT_VERSION {
            return Err(LanceaError::malformed_input(format!(
                "unsupported segment format version: {version}"
            )));
        }

        let next_doc_id = reader.read_u64()?;
        let doc_count = reader.read_u64()?;

        let deleted_count = reader.read_varint()? as usize;
        let mut deleted = AHashSet::with_capacity(deleted_count);
        let mut previous = 0u64;
        for _ in 0..deleted_count {
            let doc_id = previous.wrapping_add(reader.read_varint()?);
            deleted.insert(doc_id);
            previous = doc_id;
        }

        let field_count = reader.read_varint()? as usize;
        let mut fields = AHashMap::with_capacity(field_count);
        for _ in 0..field_count {
            let field = reader.read_string()?;
            let term_count = reader.read_varint()? as usize;
            let mut terms = AHashMap::with_capacity(term_count);
            for _ in 0..term_count {
                let term = reader.read_string()?;
                let list = PostingList::read_from(reader)?;
                terms.insert(term, Arc::new(list));
            }
            fields.insert(field, terms);
        }

        let stored_count = reader.read_varint()? as usize;
        let mut stored = AHashMap::with_capacity(stored_count);
        for _ in 0..stored_count {
            let doc_id = reader.read_varint()?;
            let name_count = reader.read_varint()? as usize;
            let mut values = HashMap::with_capacity(name_count);
            for _ in 0..name_count {
                let name = reader.read_string()?;
                let value = reader.read_string()?;
                values.insert(name, value);
            }
            stored.insert(doc_id, values);
        }

        Ok(Segment {
            generation,
            next_doc_id,
            doc_count,
            fields,
            stored,
            deleted,
        })
    }
}

/// Index metadata, written as JSON after the segment file is durable.
#[derive(Debug, Serialize, Deserialize)]
struct IndexMetadata {
    version: u32,
    generation: u64,
    segment_file: String,
    doc_count: u64,
    next_doc_id: u64,
}

/// Uncommitted changes awaiting the next commit.
#[derive(Debug, Default)]
struct PendingBuffer {
    fields: AHashMap<String, AHashMap<String, PostingList>>,
    stored: AHashMap<u64, HashMap<String, String>>,
    deletes: AHashSet<u64>,
    added_docs: u64,
    next_doc_id: u64,
}

impl PendingBuffer {
    fn is_empty(&self) -> bool {
        self.added_docs == 0 && self.deletes.is_empty()
    }

    fn clear_changes(&mut self) {
        self.fields.clear();
        self.stored.clear();
        self.deletes.clear();
        self.added_docs = 0;
    }
}

/// A single-segment inverted index over a storage backend.
#[derive(Debug)]
pub struct InvertedIndexStore {
    storage: Arc<dyn Storage>,
    committed: RwLock<Arc<Segment>>,
    pending: Mutex<PendingBuffer>,
}

impl InvertedIndexStore {
    /// Create a fresh index, overwriting any existing one.
    pub fn create(storage: Arc<dyn Storage>) -> Result<Self> {
        let store = InvertedIndexStore {
            storage,
            committed: RwLock::new(Arc::new(Segment::default())),
            pending: Mutex::new(PendingBuffer::default()),
        };
        let segment = store.committed.read().clone();
        store.persist(&segment)?;
        Ok(store)
    }

    /// Open an existing index.
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self> {
        let metadata = Self::read_metadata(storage.as_ref())?;

        let input = storage.open_input(&metadata.segment_file)?;
        let mut reader = StructReader::new(input)?;
        let segment = Segment::read_from(&mut reader, metadata.generation)?;
        reader.verify_checksum()?;

        let pending = PendingBuffer {
            next_doc_id: segment.next_doc_id,
            ..PendingBuffer::default()
        };

        Ok(InvertedIndexStore {
            storage,
            committed: RwLock::new(Arc::new(segment)),
            pending: Mutex::new(pending),
        })
    }

    /// Open an index if one exists in the storage, otherwise create one.
    pub fn open_or_create(storage: Arc<dyn Storage>) -> Result<Self> {
        if storage.file_exists(METADATA_FILE) {
            Self::open(storage)
        } else {
            Self::create(storage)
        }
    }

    /// Open or create an index in a filesystem directory.
    pub fn open_dir<P: AsRef<Path>>(path: P) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(path, StorageConfig::default())?);
        Self::open_or_create(storage)
    }

    fn read_metadata(storage: &dyn Storage) -> Result<IndexMetadata> {
        let mut input = storage.open_input(METADATA_FILE)?;
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut input, &mut bytes)?;
        let metadata: IndexMetadata = serde_json::from_slice(&bytes)?;

        if metadata.version != FORMAT_VERSION {
            return Err(LanceaError::malformed_input(format!(
                "unsupported index version: {}",
                metadata.version
            )));
        }

        Ok(metadata)
    }

    /// Allocate the next document id.
    pub fn allocate_doc_id(&self) -> u64 {
        let mut pending = self.pending.lock();
        let doc_id = pending.next_doc_id;
        pending.next_doc_id += 1;
        pending.added_docs += 1;
        doc_id
    }

    /// Buffer a posting for an uncommitted document.
    pub fn add_posting(&self, field: &str, term: &str, posting: Posting) {
        let mut pending = self.pending.lock();
        pending
            .fields
            .entry(field.to_string())
            .or_default()
            .entry(term.to_string())
            .or_default()
            .add_posting(posting);
    }

    /// Buffer a stored field value for an uncommitted document.
    pub fn add_stored(&self, doc_id: u64, field: &str, text: String) {
        let mut pending = self.pending.lock();
        pending
            .stored
            .entry(doc_id)
            .or_default()
            .insert(field.to_string(), text);
    }

    /// Mark a document for deletion at the next commit.
    ///
    /// Deletion is a tombstone: postings remain on disk and are filtered at
    /// search time.
    pub fn delete_document(&self, doc_id: u64) -> Result<()> {
        let mut pending = self.pending.lock();
        if doc_id >= pending.next_doc_id {
            return Err(LanceaError::invalid_argument(format!(
                "document {doc_id} was never assigned"
            )));
        }
        pending.deletes.insert(doc_id);
        Ok(())
    }

    /// Whether uncommitted changes exist.
    pub fn has_pending(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Number of live documents in the committed snapshot.
    pub fn doc_count(&self) -> u64 {
        self.committed.read().doc_count
    }

    /// Get a snapshot reader over the committed state.
    pub fn reader(&self) -> StoreReader {
        StoreReader::new(self.committed.read().clone())
    }

    /// Apply all pending changes and make them durable and visible.
    ///
    /// Commit is atomic: either the new segment is fully written, renamed
    /// into place, and published, or the store is unchanged and the pending
    /// buffer is preserved for a retry. Committing with no pending changes
    /// is a no-op.
    pub fn commit(&self) -> Result<()> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return Ok(());
        }

        let base = self.committed.read().clone();
        let mut segment = (*base).clone();
        segment.generation += 1;
        segment.next_doc_id = pending.next_doc_id;
        segment.doc_count += pending.added_docs;

        for (field, terms) in &pending.fields {
            let field_terms = segment.fields.entry(field.clone()).or_default();
            for (term, list) in terms {
                let target = field_terms.entry(term.clone()).or_default();
                let target = Arc::make_mut(target);
                for posting in &list.postings {
                    target.add_posting(posting.clone());
                }
            }
        }

        for (doc_id, values) in &pending.stored {
            segment
                .stored
                .entry(*doc_id)
                .or_default()
                .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        for &doc_id in &pending.deletes {
            if segment.deleted.insert(doc_id) {
                segment.doc_count = segment.doc_count.saturating_sub(1);
            }
        }

        self.persist(&segment)?;

        // Only after the new generation is durable.
        *self.committed.write() = Arc::new(segment);
        pending.clear_changes();

        let old_file = segment_file_name(base.generation);
        let _ = self.storage.delete_file(&old_file);

        Ok(())
    }

    /// Write a segment and its metadata durably.
    fn persist(&self, segment: &Segment) -> Result<()> {
        let segment_file = segment_file_name(segment.generation);

        let (temp_name, output) = self.storage.create_temp_output("segment")?;
        let mut writer = StructWriter::new(output);
        segment.write_to(&mut writer)?;
        writer.close()?;
        self.storage.rename_file(&temp_name, &segment_file)?;

        let metadata = IndexMetadata {
            version: FORMAT_VERSION,
            generation: segment.generation,
            segment_file,
            doc_count: segment.doc_count,
            next_doc_id: segment.next_doc_id,
        };
        let bytes = serde_json::to_vec_pretty(&metadata)?;

        let (temp_name, mut output) = self.storage.create_temp_output("metadata")?;
        std::io::Write::write_all(&mut output, &bytes)?;
        output.close()?;
        self.storage.rename_file(&temp_name, METADATA_FILE)?;

        Ok(())
    }
}

fn segment_file_name(generation: u64) -> String {
    format!("segment_{generation}.idx")
}
