// Transition Operations
// Business logic of the create-token transition. Operations are
// runtime-agnostic: the state store and the ledger authority are passed in
// explicitly, which keeps them testable with fakes.

mod create;
mod validation;

pub use create::*;
pub use validation::*;

use crate::types::Address;

// ========================================
// Transition Context
// ========================================

/// Host-supplied context of the transition being applied
pub struct TransitionContext {
    /// Transaction sender (verified by the host before dispatch)
    pub sender: Address,

    /// Transaction nonce, unique per sender
    pub nonce: u64,
}

impl TransitionContext {
    pub fn new(sender: Address, nonce: u64) -> Self {
        Self { sender, nonce }
    }
}
