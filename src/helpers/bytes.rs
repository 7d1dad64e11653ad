//! Binary conversion utilities for the persisted cell content blob.
//! All values are little-endian, matching the layout written by [`ByteWriter`].

use thiserror::Error;

/// Errors raised while reading a truncated or malformed byte buffer.
#[derive(Error, Debug, PartialEq)]
pub enum BytesError {
    #[error("Unexpected end of data: needed {needed} bytes at offset {offset}, {available} available")]
    UnexpectedEnd {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidString(usize),
}

/// Converts the first 8 bytes of a slice to a 64-bit floating point number.
#[inline]
pub(crate) fn to_f64(s: &[u8]) -> f64 {
    let mut buffer = [0u8; 8];
    buffer.copy_from_slice(&s[..8]);
    f64::from_le_bytes(buffer)
}

/// Converts the first 8 bytes of a slice to a 64-bit unsigned integer.
#[inline]
pub(crate) fn to_u64(s: &[u8]) -> u64 {
    let mut buffer = [0u8; 8];
    buffer.copy_from_slice(&s[..8]);
    u64::from_le_bytes(buffer)
}

/// Converts the first 4 bytes of a slice to a 32-bit unsigned integer.
#[inline]
pub(crate) fn to_u32(s: &[u8]) -> u32 {
    let mut buffer = [0u8; 4];
    buffer.copy_from_slice(&s[..4]);
    u32::from_le_bytes(buffer)
}

/// Sequential reader over a borrowed byte slice.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Takes the next `length` bytes, failing if the buffer is too short.
    fn take(&mut self, length: usize) -> Result<&'a [u8], BytesError> {
        let available = self.bytes.len() - self.offset;
        if available < length {
            return Err(BytesError::UnexpectedEnd {
                offset: self.offset,
                needed: length,
                available,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + length];
        self.offset += length;
        Ok(slice)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, BytesError> {
        self.take(4).map(to_u32)
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, BytesError> {
        self.take(8).map(to_u64)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, BytesError> {
        self.take(8).map(to_f64)
    }

    /// Reads a u32 length prefix followed by that many UTF-8 bytes.
    pub(crate) fn read_string(&mut self) -> Result<String, BytesError> {
        let length = self.read_u32()? as usize;
        let start = self.offset;
        let bytes = self.take(length)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| BytesError::InvalidString(start))
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.offset == self.bytes.len()
    }
}

/// Appends little-endian values to an owned buffer.
#[derive(Default)]
pub(crate) struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn write_f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn write_string(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.bytes.extend_from_slice(value.as_bytes());
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
