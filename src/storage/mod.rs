//! Storage abstraction layer.
//!
//! All index files go through the [`Storage`] trait, so the same index code
//! runs over a real directory ([`FileStorage`]) or entirely in memory
//! ([`MemoryStorage`]). [`StructWriter`] and [`StructReader`] layer a
//! checksummed binary format on top of raw storage streams.

pub mod file;
pub mod memory;
pub mod structured;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use structured::{StructReader, StructWriter};
pub use traits::{Storage, StorageConfig, StorageInput, StorageOutput};
