// Binary Serialization Primitives
// Cursor-based Reader/Writer used for ledger state records and the
// transaction wire format.

use std::string::FromUtf8Error;
use thiserror::Error;

/// Errors raised while decoding bytes
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("not enough bytes to read")]
    NotEnoughBytes,

    #[error("invalid size")]
    InvalidSize,

    #[error("invalid value")]
    InvalidValue,

    #[error("missing required field (tag {0})")]
    MissingField(u8),

    #[error("invalid utf-8 string: {0}")]
    InvalidString(#[from] FromUtf8Error),
}

/// Append-only byte sink
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: &u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: &u64) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.bytes.push(if value { 1 } else { 0 });
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Write a string with a u8 length prefix. Strings longer than 255 bytes
    /// are not representable and must be bounded by the caller.
    pub fn write_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        debug_assert!(bytes.len() <= u8::MAX as usize, "string too long for u8 length prefix");
        self.write_u8(bytes.len() as u8);
        self.write_bytes(bytes);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over a byte slice
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        if self.remaining() < n {
            return Err(ReaderError::NotEnoughBytes);
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReaderError> {
        let bytes: [u8; 2] = self.read_exact(2)?.try_into().map_err(|_| ReaderError::InvalidSize)?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        let bytes: [u8; 4] = self.read_exact(4)?.try_into().map_err(|_| ReaderError::InvalidSize)?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        let bytes: [u8; 8] = self.read_exact(8)?.try_into().map_err(|_| ReaderError::InvalidSize)?;
        Ok(u64::from_be_bytes(bytes))
    }

    pub fn read_bool(&mut self) -> Result<bool, ReaderError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ReaderError::InvalidValue),
        }
    }

    /// Read a string with a u8 length prefix
    pub fn read_string(&mut self) -> Result<String, ReaderError> {
        let len = self.read_u8()? as usize;
        self.read_string_with_size(len)
    }

    pub fn read_string_with_size(&mut self, n: usize) -> Result<String, ReaderError> {
        let bytes = self.read_exact(n)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn has_more(&self) -> bool {
        self.remaining() > 0
    }
}

/// Byte-level codec for ledger state records and wire payloads
pub trait Serializer: Sized {
    fn write(&self, writer: &mut Writer);

    fn read(reader: &mut Reader) -> Result<Self, ReaderError>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.write(&mut writer);
        writer.into_bytes()
    }

    /// Decode a value occupying the whole slice. Trailing bytes are rejected.
    fn from_bytes(bytes: &[u8]) -> Result<Self, ReaderError> {
        let mut reader = Reader::new(bytes);
        let value = Self::read(&mut reader)?;
        if reader.has_more() {
            return Err(ReaderError::InvalidSize);
        }
        Ok(value)
    }

    fn size(&self) -> usize {
        self.to_bytes().len()
    }
}
