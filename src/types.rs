// Core Types
// Data model for the create-token transition: addresses, token ids, the
// minted token record, the account record and the request parameters.

use std::{
    convert::TryInto,
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

use blake3::hash as blake3_hash;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer as SerdeSerializer};

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

// ========================================
// Protocol Constants
// ========================================

/// Account address width (bytes)
pub const ADDRESS_SIZE: usize = 20;

/// Token id width (bytes)
pub const TOKEN_ID_SIZE: usize = 32;

/// Maximum token name length on the wire (bytes)
pub const MAX_NAME_LENGTH: usize = 64;

/// Maximum minimum-purchase margin (percent)
pub const MAX_PURCHASE_MARGIN: u32 = 100;

// ========================================
// Address
// ========================================

/// Ledger participant identifier
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Debug, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }

    pub const fn zero() -> Self {
        Address::new([0; ADDRESS_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; ADDRESS_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|_| "Invalid address")?;
        Ok(Address::new(bytes))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: SerdeSerializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Address::from_str(&hex_str).map_err(SerdeError::custom)
    }
}

impl Serializer for Address {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let bytes: [u8; ADDRESS_SIZE] = reader
            .read_exact(ADDRESS_SIZE)?
            .try_into()
            .map_err(|_| ReaderError::InvalidSize)?;
        Ok(Address::new(bytes))
    }

    fn size(&self) -> usize {
        ADDRESS_SIZE
    }
}

// ========================================
// Token Id
// ========================================

/// Unique token identifier, derived from the owner address and the
/// transaction nonce
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Debug, Hash)]
pub struct TokenId([u8; TOKEN_ID_SIZE]);

impl TokenId {
    pub const fn new(bytes: [u8; TOKEN_ID_SIZE]) -> Self {
        TokenId(bytes)
    }

    /// Derive the id for a (owner, nonce) pair. The host guarantees nonce
    /// uniqueness per sender, which makes the derivation collision-free.
    pub fn derive(owner: &Address, nonce: u64) -> Self {
        let mut input = [0u8; ADDRESS_SIZE + 8];
        input[..ADDRESS_SIZE].copy_from_slice(owner.as_bytes());
        input[ADDRESS_SIZE..].copy_from_slice(&nonce.to_be_bytes());
        TokenId(blake3_hash(&input).into())
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for TokenId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; TOKEN_ID_SIZE] = bytes.try_into().map_err(|_| "Invalid token id")?;
        Ok(TokenId::new(bytes))
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for TokenId {
    fn serialize<S: SerdeSerializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        TokenId::from_str(&hex_str).map_err(SerdeError::custom)
    }
}

impl Serializer for TokenId {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let bytes: [u8; TOKEN_ID_SIZE] = reader
            .read_exact(TOKEN_ID_SIZE)?
            .try_into()
            .map_err(|_| ReaderError::InvalidSize)?;
        Ok(TokenId::new(bytes))
    }

    fn size(&self) -> usize {
        TOKEN_ID_SIZE
    }
}

// ========================================
// Request Parameters
// ========================================

/// Parameters of a create-token transition, as submitted by the client.
/// Immutable once constructed; the wire contract lives in `storage`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTokenParams {
    /// Token display name (max 64 bytes on the wire)
    pub name: String,

    /// Initial token value, debited from the sender at mint time
    pub init_value: u64,

    /// Minimum purchase margin in percent (0-100)
    pub min_purchase_margin: u32,
}

// ========================================
// Token
// ========================================

/// A minted token record. Created exactly once and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Unique id, derived from owner address + nonce
    pub id: TokenId,

    /// Token display name
    pub name: String,

    /// Minting owner
    pub owner: Address,

    /// Token value
    pub value: u64,

    /// Minimum purchase margin in percent
    pub min_purchase_margin: u32,
}

impl Token {
    /// Build the token record minted by `owner` at `nonce`
    pub fn create(
        name: String,
        owner: Address,
        nonce: u64,
        value: u64,
        min_purchase_margin: u32,
    ) -> Self {
        let id = TokenId::derive(&owner, nonce);
        Self {
            id,
            name,
            owner,
            value,
            min_purchase_margin,
        }
    }
}

// ========================================
// Account
// ========================================

/// A ledger participant's record. `balance` mirrors the fungible balance
/// held by the ledger authority and is never written by this component;
/// `owned_tokens` preserves mint order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier
    pub address: Address,

    /// Fungible balance, owned by the ledger authority
    pub balance: u64,

    /// Ids of tokens minted by this account, in mint order
    pub owned_tokens: Vec<TokenId>,
}

impl Account {
    pub fn new(address: Address, balance: u64) -> Self {
        Self {
            address,
            balance,
            owned_tokens: Vec::new(),
        }
    }

    /// Append a minted token id, preserving mint order
    pub fn add_token(&mut self, id: TokenId) {
        self.owned_tokens.push(id);
    }

    pub fn owns(&self, id: &TokenId) -> bool {
        self.owned_tokens.contains(id)
    }
}
