//! Inverted index structures, persistence, and the index writer.

pub mod posting;
pub mod reader;
pub mod store;
pub mod writer;

pub use posting::{Posting, PostingList};
pub use reader::{IndexReader, StoreReader};
pub use store::InvertedIndexStore;
pub use writer::IndexWriter;
