//! Posting lists for term-to-document mapping.
//!
//! A posting records one term's occurrences inside one document. A posting
//! list collects the postings of a term across all documents, sorted
//! ascending by document id so lists can be merged with a linear scan.

use crate::error::Result;
use crate::storage::structured::{StructReader, StructWriter};
use crate::storage::{StorageInput, StorageOutput};

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    /// Document ID.
    pub doc_id: u64,
    /// Term frequency in the document.
    pub frequency: u32,
    /// Positions of the term in the document, sorted ascending.
    pub positions: Vec<u32>,
}

impl Posting {
    /// Create a posting from the term's positions within a document.
    pub fn new(doc_id: u64, positions: Vec<u32>) -> Self {
        let frequency = positions.len() as u32;
        Posting {
            doc_id,
            frequency,
            positions,
        }
    }

    /// Add a position to this posting.
    ///
    /// Positions must be added in ascending order.
    pub fn add_position(&mut self, position: u32) {
        self.positions.push(position);
        self.frequency = self.positions.len() as u32;
    }
}

/// A posting list for a single term within a single field.
///
/// Postings stay sorted ascending by `doc_id`. The document frequency of the
/// term is the length of the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingList {
    /// The postings in this list.
    pub postings: Vec<Posting>,
    /// Total term frequency across all documents.
    pub total_frequency: u64,
}

impl PostingList {
    /// Create a new empty posting list.
    pub fn new() -> Self {
        PostingList::default()
    }

    /// Add a posting, keeping the list sorted by doc_id.
    ///
    /// If a posting for the document already exists its positions are
    /// replaced, which makes re-adding a document idempotent.
    pub fn add_posting(&mut self, posting: Posting) {
        match self
            .postings
            .binary_search_by_key(&posting.doc_id, |p| p.doc_id)
        {
            Ok(index) => {
                let old = std::mem::replace(&mut self.postings[index], posting);
                self.total_frequency -= old.frequency as u64;
                self.total_frequency += self.postings[index].frequency as u64;
            }
            Err(index) => {
                self.total_frequency += posting.frequency as u64;
                self.postings.insert(index, posting);
            }
        }
    }

    /// Document frequency of the term.
    pub fn doc_frequency(&self) -> u64 {
        self.postings.len() as u64
    }

    /// Look up the posting for a document.
    pub fn get(&self, doc_id: u64) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|index| &self.postings[index])
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Number of postings in the list.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Serialize this posting list.
    ///
    /// Doc ids are stored as varint deltas from their predecessor, which is
    /// why the sort invariant matters for the on-disk size.
    pub fn write_to<W: StorageOutput>(&self, writer: &mut StructWriter<W>) -> Result<()> {
        writer.write_varint(self.postings.len() as u64)?;

        let mut previous = 0u64;
        for posting in &self.postings {
            writer.write_varint(posting.doc_id.wrapping_sub(previous))?;
            writer.write_delta_u32s(&posting.positions)?;
            previous = posting.doc_id;
        }

        Ok(())
    }

    /// Deserialize a posting list written by [`PostingList::write_to`].
    pub fn read_from<R: StorageInput>(reader: &mut StructReader<R>) -> Result<Self> {
        let count = reader.read_varint()? as usize;

        let mut list = PostingList::new();
        let mut previous = 0u64;

        for _ in 0..count {
            let doc_id = previous.wrapping_add(reader.read_varint()?);
            let positions = reader.read_delta_u32s()?;
            previous = doc_id;

            let posting = Posting::new(doc_id, positions);
            list.total_frequency += posting.frequency as u64;
            list.postings.push(posting);
        }

        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::traits::Storage;

    #[test]
    fn test_postings_stay_sorted() {
        let mut list = PostingList::new();
        list.add_posting(Posting::new(5, vec![0]));
        list.add_posting(Posting::new(1, vec![2, 4]));
        list.add_posting(Posting::new(3, vec![1]));

        let ids: Vec<u64> = list.postings.iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(list.doc_frequency(), 3);
        assert_eq!(list.total_frequency, 4);
    }

    #[test]
    fn test_readd_replaces_posting() {
        let mut list = PostingList::new();
        list.add_posting(Posting::new(2, vec![0, 1]));
        list.add_posting(Posting::new(2, vec![7]));

        assert_eq!(list.len(), 1);
        assert_eq!(list.get(2).unwrap().positions, vec![7]);
        assert_eq!(list.total_frequency, 1);
    }

    #[test]
    fn test_frequency_tracks_positions() {
        let mut posting = Posting::new(1, vec![0]);
        posting.add_position(3);
        posting.add_position(9);

        assert_eq!(posting.frequency, 3);
        assert_eq!(posting.positions, vec![0, 3, 9]);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut list = PostingList::new();
        list.add_posting(Posting::new(1, vec![0, 5]));
        list.add_posting(Posting::new(4, vec![2]));
        list.add_posting(Posting::new(100, vec![1, 2, 3]));

        let storage = MemoryStorage::new();
        let output = storage.create_output("postings.bin").unwrap();
        let mut writer = StructWriter::new(output);
        list.write_to(&mut writer).unwrap();
        writer.close().unwrap();

        let input = storage.open_input("postings.bin").unwrap();
        let mut reader = StructReader::new(input).unwrap();
        let decoded = PostingList::read_from(&mut reader).unwrap();
        reader.verify_checksum().unwrap();

        assert_eq!(decoded, list);
    }

    #[test]
    fn test_empty_list_roundtrip() {
        let storage = MemoryStorage::new();
        let output = storage.create_output("empty.bin").unwrap();
        let mut writer = StructWriter::new(output);
        PostingList::new().write_to(&mut writer).unwrap();
        writer.close().unwrap();

        let input = storage.open_input("empty.bin").unwrap();
        let mut reader = StructReader::new(input).unwrap();
        let decoded = PostingList::read_from(&mut reader).unwrap();
        assert!(decoded.is_empty());
    }
}
