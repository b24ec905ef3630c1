// Token Registry Accessor
// Get/set helpers over the global collection of minted tokens, stored as an
// ordered sequence under a single fixed key. Pure pass-through to the state
// store; no business logic beyond (de)serialization.

use crate::error::{ExecutionResult, StoreError};
use crate::serializer::{Reader, ReaderError, Serializer, Writer};
use crate::storage::{registry_key, StateStore};
use crate::types::Token;

/// Read the full token registry. An absent key is an empty registry, not an
/// error.
pub fn get_all_tokens<S: StateStore + ?Sized>(store: &S) -> ExecutionResult<Vec<Token>> {
    match store.get(&registry_key())? {
        None => Ok(Vec::new()),
        Some(bytes) => Ok(decode_tokens(&bytes)?),
    }
}

/// Write the full token registry back to the store
pub fn set_all_tokens<S: StateStore + ?Sized>(
    store: &mut S,
    tokens: &[Token],
) -> Result<(), StoreError> {
    store.set(&registry_key(), encode_tokens(tokens))
}

fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.write_u32(&(tokens.len() as u32));
    for token in tokens {
        token.write(&mut writer);
    }
    writer.into_bytes()
}

fn decode_tokens(bytes: &[u8]) -> Result<Vec<Token>, ReaderError> {
    let mut reader = Reader::new(bytes);
    let count = reader.read_u32()? as usize;
    let mut tokens = Vec::new();
    for _ in 0..count {
        tokens.push(Token::read(&mut reader)?);
    }
    if reader.has_more() {
        return Err(ReaderError::InvalidSize);
    }
    Ok(tokens)
}
