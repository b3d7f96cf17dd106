//! Checksummed binary readers and writers for index files.
//!
//! Every segment file is a sequence of little-endian primitives, varints, and
//! length-prefixed strings, followed by a trailing crc32 of everything before
//! it. [`StructWriter`] maintains the checksum while writing; [`StructReader`]
//! recomputes it while reading and verifies it at the end.

use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher;

use crate::error::{LanceaError, Result};
use crate::storage::traits::{StorageInput, StorageOutput};

/// Encode a u64 with 7 bits per byte and a continuation bit.
fn encode_varint(value: u64, out: &mut Vec<u8>) {
    let mut val = value;
    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;
        if val != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }
}

/// A structured writer for binary index data.
pub struct StructWriter<W: StorageOutput> {
    writer: W,
    hasher: Hasher,
    position: u64,
}

impl<W: StorageOutput> StructWriter<W> {
    /// Create a new structured writer.
    pub fn new(writer: W) -> Self {
        StructWriter {
            writer,
            hasher: Hasher::new(),
            position: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        use std::io::Write;
        self.writer.write_all(bytes)?;
        self.hasher.update(bytes);
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put(&[value])
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    /// Write a u64 value (little-endian).
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    /// Write a f32 value (little-endian).
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    /// Write a variable-length integer.
    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        let mut bytes = Vec::with_capacity(10);
        encode_varint(value, &mut bytes);
        self.put(&bytes)
    }

    /// Write a string with a varint length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_varint(value.len() as u64)?;
        self.put(value.as_bytes())
    }

    /// Write bytes with a varint length prefix.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_varint(value.len() as u64)?;
        self.put(value)
    }

    /// Write a delta-compressed sorted integer array.
    ///
    /// Values must be non-decreasing; each value is stored as a varint delta
    /// from its predecessor.
    pub fn write_delta_u32s(&mut self, values: &[u32]) -> Result<()> {
        self.write_varint(values.len() as u64)?;

        let mut previous = 0u32;
        for &value in values {
            let delta = value.wrapping_sub(previous);
            self.write_varint(delta as u64)?;
            previous = value;
        }

        Ok(())
    }

    /// Get the current file position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Write the trailing checksum, then flush and sync the output.
    pub fn close(mut self) -> Result<()> {
        let checksum = self.hasher.clone().finalize();
        self.writer.write_u32::<LittleEndian>(checksum)?;
        self.writer.flush_and_sync()?;
        self.writer.close()?;
        Ok(())
    }
}

/// A structured reader for binary index data.
pub struct StructReader<R: StorageInput> {
    reader: R,
    hasher: Hasher,
    position: u64,
    file_size: u64,
}

impl<R: StorageInput> StructReader<R> {
    /// Create a new structured reader.
    pub fn new(reader: R) -> Result<Self> {
        let file_size = reader.size()?;
        Ok(StructReader {
            reader,
            hasher: Hasher::new(),
            position: 0,
            file_size,
        })
    }

    fn take(&mut self, buf: &mut [u8]) -> Result<()> {
        use std::io::Read;
        self.reader.read_exact(buf)?;
        self.hasher.update(buf);
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Read a u8 value.
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.take(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a u32 value (little-endian).
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.take(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a u64 value (little-endian).
    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.take(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read a f32 value (little-endian).
    pub fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.take(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Read a variable-length integer.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0;

        loop {
            let byte = self.read_u8()?;

            if shift >= 64 {
                return Err(LanceaError::malformed_input("varint overflow"));
            }

            result |= ((byte & 0x7F) as u64) << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }

            shift += 7;
        }
    }

    /// Read a string with a varint length prefix.
    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_varint()? as usize;
        self.check_remaining(length)?;
        let mut bytes = vec![0u8; length];
        self.take(&mut bytes)?;

        String::from_utf8(bytes)
            .map_err(|e| LanceaError::malformed_input(format!("invalid UTF-8 in string: {e}")))
    }

    /// Read bytes with a varint length prefix.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let length = self.read_varint()? as usize;
        self.check_remaining(length)?;
        let mut bytes = vec![0u8; length];
        self.take(&mut bytes)?;
        Ok(bytes)
    }

    /// Read a delta-compressed sorted integer array.
    pub fn read_delta_u32s(&mut self) -> Result<Vec<u32>> {
        let length = self.read_varint()? as usize;
        if length == 0 {
            return Ok(Vec::new());
        }
        self.check_remaining(length)?;

        let mut values = Vec::with_capacity(length);
        let mut previous = 0u32;

        for _ in 0..length {
            let delta = self.read_varint()? as u32;
            let value = previous.wrapping_add(delta);
            values.push(value);
            previous = value;
        }

        Ok(values)
    }

    /// Get the current file position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Get the file size.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// Read the trailing checksum and verify it against the bytes read.
    pub fn verify_checksum(mut self) -> Result<()> {
        let expected = self.hasher.clone().finalize();
        let mut buf = [0u8; 4];
        {
            use std::io::Read;
            self.reader.read_exact(&mut buf)?;
        }
        let stored = u32::from_le_bytes(buf);

        if stored != expected {
            return Err(LanceaError::malformed_input(format!(
                "checksum mismatch: stored {stored:#010x}, computed {expected:#010x}"
            )));
        }

        Ok(())
    }

    /// Reject length prefixes that exceed the bytes left in the file.
    ///
    /// A corrupt prefix would otherwise allocate an arbitrarily large buffer
    /// before the read fails.
    fn check_remaining(&self, length: usize) -> Result<()> {
        let remaining = self.file_size.saturating_sub(self.position);
        if length as u64 > remaining {
            return Err(LanceaError::malformed_input(format!(
                "length prefix {length} exceeds remaining {remaining} bytes"
            )));
        }
        Ok(())
    }
}
