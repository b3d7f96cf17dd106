//! In-memory storage implementation for testing and transient indexes.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{LanceaError, Result};
use crate::storage::traits::{Storage, StorageConfig, StorageInput, StorageOutput};

type FileMap = Arc<Mutex<HashMap<String, Box<[u8]>>>>;

/// An in-memory storage implementation.
///
/// Useful for tests and for temporary indexes that never touch disk. File
/// contents become visible to readers when the output is flushed or closed.
#[derive(Debug)]
pub struct MemoryStorage {
    /// The files stored in memory.
    files: FileMap,
}

impl MemoryStorage {
    /// Create a new memory storage.
    pub fn new() -> Self {
        MemoryStorage {
            files: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the number of files stored.
    pub fn file_count(&self) -> usize {
        self.files.lock().len()
    }

    /// Get the total size of all files.
    pub fn total_size(&self) -> u64 {
        self.files.lock().values().map(|data| data.len() as u64).sum()
    }

    /// Create a new memory storage, ignoring the buffering configuration.
    ///
    /// Accepted for interface parity with [`crate::storage::FileStorage`].
    pub fn with_config(_config: StorageConfig) -> Self {
        Self::new()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let files = self.files.lock();
        let data = files
            .get(name)
            .ok_or_else(|| LanceaError::storage(format!("File not found: {name}")))?;

        Ok(Box::new(MemoryInput::new(data.clone())))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        Ok(Box::new(MemoryOutput::new(
            name.to_string(),
            Arc::clone(&self.files),
        )))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.lock().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files.lock().remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        let files = self.files.lock();
        let data = files
            .get(name)
            .ok_or_else(|| LanceaError::storage(format!("File not found: {name}")))?;
        Ok(data.len() as u64)
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut files = self.files.lock();
        let data = files
            .remove(old_name)
            .ok_or_else(|| LanceaError::storage(format!("File not found: {old_name}")))?;
        files.insert(new_name.to_string(), data);
        Ok(())
    }

    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)> {
        let mut counter = 0;
        let mut temp_name;

        loop {
            temp_name = format!("{prefix}_{counter}.tmp");
            if !self.file_exists(&temp_name) {
                break;
            }
            counter += 1;
        }

        let output = self.create_output(&temp_name)?;
        Ok((temp_name, output))
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// A memory input stream over a snapshot of file contents.
#[derive(Debug)]
pub struct MemoryInput {
    cursor: Cursor<Box<[u8]>>,
    size: u64,
}

impl MemoryInput {
    fn new(data: Box<[u8]>) -> Self {
        let size = data.len() as u64;
        MemoryInput {
            cursor: Cursor::new(data),
            size,
        }
    }
}

impl Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemoryInput {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl StorageInput for MemoryInput {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A memory output stream that publishes its buffer on flush or close.
#[derive(Debug)]
pub struct MemoryOutput {
    name: String,
    buffer: Cursor<Vec<u8>>,
    files: FileMap,
}

impl MemoryOutput {
    fn new(name: String, files: FileMap) -> Self {
        MemoryOutput {
            name,
            buffer: Cursor::new(Vec::new()),
            files,
        }
    }

    fn publish(&self) {
        let data = self.buffer.get_ref().clone().into_boxed_slice();
        self.files.lock().insert(self.name.clone(), data);
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.publish();
        Ok(())
    }
}

impl Seek for MemoryOutput {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.buffer.seek(pos)
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.publish();
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        Ok(self.buffer.position())
    }

    fn close(&mut self) -> Result<()> {
        self.publish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let storage = MemoryStorage::new();

        let mut output = storage.create_output("test.bin").unwrap();
        output.write_all(b"in memory").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("test.bin").unwrap();
        let mut buf = String::new();
        input.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "in memory");
    }

    #[test]
    fn test_unpublished_until_flush() {
        let storage = MemoryStorage::new();

        let mut output = storage.create_output("test.bin").unwrap();
        output.write_all(b"data").unwrap();
        assert!(!storage.file_exists("test.bin"));

        output.close().unwrap();
        assert!(storage.file_exists("test.bin"));
    }

    #[test]
    fn test_rename_and_delete() {
        let storage = MemoryStorage::new();

        let mut output = storage.create_output("a.tmp").unwrap();
        output.write_all(b"x").unwrap();
        output.close().unwrap();

        storage.rename_file("a.tmp", "a.bin").unwrap();
        assert!(storage.file_exists("a.bin"));
        assert!(!storage.file_exists("a.tmp"));

        storage.delete_file("a.bin").unwrap();
        assert_eq!(storage.file_count(), 0);
    }

    #[test]
    fn test_input_is_snapshot() {
        let storage = MemoryStorage::new();

        let mut output = storage.create_output("v.bin").unwrap();
        output.write_all(b"first").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("v.bin").unwrap();

        let mut output = storage.create_output("v.bin").unwrap();
        output.write_all(b"second").unwrap();
        output.close().unwrap();

        let mut buf = String::new();
        input.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "first");
    }
}
