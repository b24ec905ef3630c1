// Storage Layer
// Defines the key/value seam to the host's state store, the key scheme and
// the byte-level encodings of state records and the request wire format.
//
// Storage Key Structure:
// - Account:  nft:acc:<address>
// - Registry: nft:reg (single fixed key)

use std::collections::HashMap;

use crate::error::StoreError;
use crate::serializer::{Reader, ReaderError, Serializer, Writer};
use crate::types::{Account, Address, CreateTokenParams, Token, TokenId, MAX_NAME_LENGTH};

// ========================================
// Storage Key Prefixes
// ========================================

/// Storage key prefixes for ledger state
pub mod prefixes {
    /// Account record prefix
    pub const ACCOUNT: &[u8] = b"nft:acc:";

    /// Global token registry key
    pub const REGISTRY: &[u8] = b"nft:reg";
}

/// Generate the storage key for an account record
pub fn account_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefixes::ACCOUNT.len() + address.as_bytes().len());
    key.extend_from_slice(prefixes::ACCOUNT);
    key.extend_from_slice(address.as_bytes());
    key
}

/// The fixed storage key of the token registry
pub fn registry_key() -> Vec<u8> {
    prefixes::REGISTRY.to_vec()
}

// ========================================
// State Store Trait (for dependency injection)
// ========================================

/// Narrow key/value seam to the host's persisted ledger state.
/// Host runtimes provide concrete backends; a failed `set` is expected to
/// leave the key untouched.
pub trait StateStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError>;
}

/// In-memory store backend, for hosts without persistence and for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key.to_vec(), value);
        Ok(())
    }
}

// ========================================
// Wire Contract: Request Field Tags
// ========================================

/// Field tags of the create-token request. These match the host schema and
/// are a wire compatibility contract: all three fields are required.
pub mod field_tags {
    pub const MIN_PURCHASE_MARGIN: u8 = 1;
    pub const INIT_VALUE: u8 = 2;
    pub const NAME: u8 = 3;
}

impl Serializer for CreateTokenParams {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(field_tags::MIN_PURCHASE_MARGIN);
        writer.write_u32(&self.min_purchase_margin);

        writer.write_u8(field_tags::INIT_VALUE);
        writer.write_u64(&self.init_value);

        writer.write_u8(field_tags::NAME);
        writer.write_string(&self.name);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let mut min_purchase_margin = None;
        let mut init_value = None;
        let mut name = None;

        // Fields may arrive in any order; duplicates and unknown tags are
        // wire errors.
        while reader.has_more() {
            match reader.read_u8()? {
                field_tags::MIN_PURCHASE_MARGIN => {
                    if min_purchase_margin.replace(reader.read_u32()?).is_some() {
                        return Err(ReaderError::InvalidValue);
                    }
                }
                field_tags::INIT_VALUE => {
                    if init_value.replace(reader.read_u64()?).is_some() {
                        return Err(ReaderError::InvalidValue);
                    }
                }
                field_tags::NAME => {
                    let len = reader.read_u8()? as usize;
                    if len > MAX_NAME_LENGTH {
                        return Err(ReaderError::InvalidSize);
                    }
                    if name.replace(reader.read_string_with_size(len)?).is_some() {
                        return Err(ReaderError::InvalidValue);
                    }
                }
                _ => return Err(ReaderError::InvalidValue),
            }
        }

        Ok(CreateTokenParams {
            min_purchase_margin: min_purchase_margin
                .ok_or(ReaderError::MissingField(field_tags::MIN_PURCHASE_MARGIN))?,
            init_value: init_value.ok_or(ReaderError::MissingField(field_tags::INIT_VALUE))?,
            name: name.ok_or(ReaderError::MissingField(field_tags::NAME))?,
        })
    }
}

// ========================================
// State Record Encodings
// ========================================

impl Serializer for Token {
    fn write(&self, writer: &mut Writer) {
        self.id.write(writer);
        writer.write_string(&self.name);
        self.owner.write(writer);
        writer.write_u64(&self.value);
        writer.write_u32(&self.min_purchase_margin);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let id = TokenId::read(reader)?;

        let name_len = reader.read_u8()? as usize;
        if name_len > MAX_NAME_LENGTH {
            return Err(ReaderError::InvalidSize);
        }
        let name = reader.read_string_with_size(name_len)?;

        let owner = Address::read(reader)?;
        let value = reader.read_u64()?;
        let min_purchase_margin = reader.read_u32()?;

        Ok(Token {
            id,
            name,
            owner,
            value,
            min_purchase_margin,
        })
    }
}

impl Serializer for Account {
    fn write(&self, writer: &mut Writer) {
        self.address.write(writer);
        writer.write_u64(&self.balance);

        writer.write_u32(&(self.owned_tokens.len() as u32));
        for id in &self.owned_tokens {
            id.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let address = Address::read(reader)?;
        let balance = reader.read_u64()?;

        let count = reader.read_u32()? as usize;
        let mut owned_tokens = Vec::new();
        for _ in 0..count {
            owned_tokens.push(TokenId::read(reader)?);
        }

        Ok(Account {
            address,
            balance,
            owned_tokens,
        })
    }
}
