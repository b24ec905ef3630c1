// Chain-native NFT mint transition handler.
// This crate implements one transaction asset for a host blockchain runtime:
// how a create-token request is validated and how it mutates ledger state.
// Networking, consensus, signatures and persistence are the host's concern
// and reached only through the narrow StateStore / LedgerOps seams.
//
// Module Structure:
// - serializer: binary Reader/Writer primitives
// - error: validation and execution error taxonomy
// - types: Address, TokenId, Token, Account, request parameters
// - storage: StateStore trait, key scheme, wire and state encodings
// - registry: get/set helpers over the global token registry
// - ledger: LedgerOps trait (balance authority)
// - operations: validate() and apply() (the transition itself)

pub mod error;
pub mod ledger;
pub mod operations;
pub mod registry;
pub mod serializer;
pub mod storage;
pub mod types;

pub use error::*;
pub use ledger::*;
pub use operations::*;
pub use storage::*;
pub use types::*;
