// Error Taxonomy
// Two layers, matching the host pipeline:
// - ValidationError: raised before any mutation, request rejected outright
// - ExecutionError: raised during apply, triggers rollback of staged writes
// Collaborator errors (StoreError, LedgerError) are wrapped, never swallowed.

use thiserror::Error;

use crate::serializer::ReaderError;

/// Result type for transition execution
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Domain constraint violations detected before any state is touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("token init value must be greater than zero")]
    NonPositiveValue,

    #[error("minimum purchase margin must be between 0 and 100")]
    MarginOutOfRange,

    #[error("token name exceeds the maximum length")]
    NameTooLong,
}

/// State store failures, reported by the backing key/value accessor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    ReadFailed(String),

    #[error("store write failed: {0}")]
    WriteFailed(String),
}

/// Balance authority failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// Failures surfaced to the host while applying a transition
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("sender account not found")]
    AccountNotFound,

    #[error("token name exceeds the maximum length")]
    NameTooLong,

    #[error("token id already minted")]
    TokenAlreadyExists,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    #[error("corrupted state record: {0}")]
    Decode(#[from] ReaderError),
}

impl From<LedgerError> for ExecutionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds => ExecutionError::InsufficientFunds,
            other => ExecutionError::Ledger(other),
        }
    }
}
