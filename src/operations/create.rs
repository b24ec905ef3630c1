// Create-Token Transition Executor
// Applies a validated create-token request against the state store and the
// ledger authority. The five steps run in program order; writes staged
// before a failing step are rolled back from their pre-images, and a debit
// is compensated with a credit, so the transition is all-or-nothing.

use log::{debug, error};

use crate::error::{ExecutionError, ExecutionResult};
use crate::ledger::LedgerOps;
use crate::registry;
use crate::serializer::Serializer;
use crate::storage::{account_key, StateStore};
use crate::types::{Account, Address, CreateTokenParams, Token, TokenId, MAX_NAME_LENGTH};

use super::TransitionContext;

/// Apply a create-token transition.
///
/// Must be invoked only after `validate` accepted the request, and must not
/// interleave with another `apply` touching the same sender account or the
/// registry key; the host's store mutation discipline serializes the
/// registry read-modify-write.
///
/// # Returns
/// - `Ok(TokenId)`: the id of the minted token
/// - `Err(ExecutionError)`: no state change is observable
pub fn apply<S, L>(
    store: &mut S,
    ledger: &mut L,
    ctx: &TransitionContext,
    params: CreateTokenParams,
) -> ExecutionResult<TokenId>
where
    S: StateStore + ?Sized,
    L: LedgerOps + ?Sized,
{
    // The state encoding cannot represent longer names; reject before any
    // state is read or written, even if the host skipped validate()
    if params.name.len() > MAX_NAME_LENGTH {
        return Err(ExecutionError::NameTooLong);
    }

    // Step 1: load the sender account. A missing account is a hard error,
    // never auto-created.
    let key = account_key(&ctx.sender);
    let account_pre_image = store
        .get(&key)?
        .ok_or(ExecutionError::AccountNotFound)?;
    let mut account = Account::from_bytes(&account_pre_image)?;

    // Step 2: mint the token record
    let token = Token::create(
        params.name,
        ctx.sender.clone(),
        ctx.nonce,
        params.init_value,
        params.min_purchase_margin,
    );
    let token_id = token.id.clone();

    // Step 3: append the id to the owner list and write the account back
    account.add_token(token_id.clone());
    store.set(&key, account.to_bytes())?;

    // Step 4: debit the mint price from the sender
    if let Err(err) = ledger.debit(&ctx.sender, params.init_value) {
        restore_account(store, &key, account_pre_image);
        return Err(err.into());
    }

    // Step 5: append the token to the global registry
    if let Err(err) = append_to_registry(store, token) {
        refund(ledger, &ctx.sender, params.init_value);
        restore_account(store, &key, account_pre_image);
        return Err(err);
    }

    debug!(
        "minted token {} for sender {} (value {})",
        token_id, ctx.sender, params.init_value
    );
    Ok(token_id)
}

/// Read-append-write of the registry. Rejects an id already minted, which
/// keeps registry ids unique even if the host replays a nonce.
fn append_to_registry<S: StateStore + ?Sized>(store: &mut S, token: Token) -> ExecutionResult<()> {
    let mut tokens = registry::get_all_tokens(store)?;
    if tokens.iter().any(|existing| existing.id == token.id) {
        return Err(ExecutionError::TokenAlreadyExists);
    }
    tokens.push(token);
    registry::set_all_tokens(store, &tokens)?;
    Ok(())
}

/// Restore the sender account record from its pre-image
fn restore_account<S: StateStore + ?Sized>(store: &mut S, key: &[u8], pre_image: Vec<u8>) {
    if let Err(err) = store.set(key, pre_image) {
        // Unrecoverable without host-level store transactionality
        error!("account rollback failed, store left inconsistent: {}", err);
    }
}

/// Compensate a debit after a later step failed
fn refund<L: LedgerOps + ?Sized>(ledger: &mut L, address: &Address, amount: u64) {
    if let Err(err) = ledger.credit(address, amount) {
        error!("debit compensation failed for {}: {}", address, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::error::{LedgerError, StoreError};
    use crate::storage::{registry_key, MemoryStore};
    use crate::types::ADDRESS_SIZE;

    // ========================================
    // Test doubles
    // ========================================

    /// Ledger fake holding its own balances
    struct MockLedger {
        balances: HashMap<Address, u64>,
    }

    impl MockLedger {
        fn new() -> Self {
            Self {
                balances: HashMap::new(),
            }
        }

        fn with_balance(mut self, address: &Address, balance: u64) -> Self {
            self.balances.insert(address.clone(), balance);
            self
        }

        fn balance(&self, address: &Address) -> u64 {
            *self.balances.get(address).unwrap_or(&0)
        }
    }

    impl LedgerOps for MockLedger {
        fn debit(&mut self, address: &Address, amount: u64) -> Result<(), LedgerError> {
            let balance = self.balances.entry(address.clone()).or_insert(0);
            if *balance < amount {
                return Err(LedgerError::InsufficientFunds);
            }
            *balance -= amount;
            Ok(())
        }

        fn credit(&mut self, address: &Address, amount: u64) -> Result<(), LedgerError> {
            let balance = self.balances.entry(address.clone()).or_insert(0);
            *balance = balance.checked_add(amount).ok_or_else(|| {
                LedgerError::Backend("balance overflow".to_string())
            })?;
            Ok(())
        }
    }

    /// Store wrapper that fails writes to the registry key
    struct FlakyStore {
        inner: MemoryStore,
        fail_registry_writes: bool,
    }

    impl StateStore for FlakyStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
            if self.fail_registry_writes && key == registry_key() {
                return Err(StoreError::WriteFailed("registry unavailable".to_string()));
            }
            self.inner.set(key, value)
        }
    }

    fn test_address(byte: u8) -> Address {
        Address::new([byte; ADDRESS_SIZE])
    }

    fn test_params(name: &str, value: u64) -> CreateTokenParams {
        CreateTokenParams {
            name: name.to_string(),
            init_value: value,
            min_purchase_margin: 10,
        }
    }

    fn store_with_account(address: &Address, balance: u64) -> MemoryStore {
        let mut store = MemoryStore::new();
        let account = Account::new(address.clone(), balance);
        store
            .set(&account_key(address), account.to_bytes())
            .unwrap();
        store
    }

    fn load_account<S: StateStore>(store: &S, address: &Address) -> Account {
        let bytes = store.get(&account_key(address)).unwrap().unwrap();
        Account::from_bytes(&bytes).unwrap()
    }

    // ========================================
    // Tests
    // ========================================

    #[test]
    fn test_apply_success() {
        let sender = test_address(1);
        let mut store = store_with_account(&sender, 1000);
        let mut ledger = MockLedger::new().with_balance(&sender, 1000);
        let ctx = TransitionContext::new(sender.clone(), 1);

        let token_id = apply(&mut store, &mut ledger, &ctx, test_params("Art1", 100)).unwrap();

        // Balance debited by exactly init_value
        assert_eq!(ledger.balance(&sender), 900);

        // Owner list grew by exactly the new id
        let account = load_account(&store, &sender);
        assert_eq!(account.owned_tokens, vec![token_id.clone()]);

        // Registry grew by exactly the new token
        let tokens = registry::get_all_tokens(&store).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].id, token_id);
        assert_eq!(tokens[0].name, "Art1");
        assert_eq!(tokens[0].owner, sender);
        assert_eq!(tokens[0].value, 100);
        assert_eq!(tokens[0].min_purchase_margin, 10);
    }

    #[test]
    fn test_sequential_mints_accumulate_in_order() {
        let sender = test_address(1);
        let mut store = store_with_account(&sender, 1000);
        let mut ledger = MockLedger::new().with_balance(&sender, 1000);

        let first = apply(
            &mut store,
            &mut ledger,
            &TransitionContext::new(sender.clone(), 1),
            test_params("Art1", 100),
        )
        .unwrap();
        let second = apply(
            &mut store,
            &mut ledger,
            &TransitionContext::new(sender.clone(), 2),
            test_params("Art2", 200),
        )
        .unwrap();

        assert_ne!(first, second);
        assert_eq!(ledger.balance(&sender), 700);

        let account = load_account(&store, &sender);
        assert_eq!(account.owned_tokens, vec![first.clone(), second.clone()]);

        let tokens = registry::get_all_tokens(&store).unwrap();
        let ids: Vec<_> = tokens.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_overlong_name_rejected_before_state_is_touched() {
        let sender = test_address(1);
        let mut store = store_with_account(&sender, 1000);
        let mut ledger = MockLedger::new().with_balance(&sender, 1000);
        let ctx = TransitionContext::new(sender.clone(), 1);

        let params = test_params(&"x".repeat(MAX_NAME_LENGTH + 1), 100);
        let err = apply(&mut store, &mut ledger, &ctx, params).unwrap_err();
        assert!(matches!(err, ExecutionError::NameTooLong));

        // No debit, no owner-list growth, and the registry stays readable
        assert_eq!(ledger.balance(&sender), 1000);
        assert!(load_account(&store, &sender).owned_tokens.is_empty());
        assert_eq!(registry::get_all_tokens(&store).unwrap(), Vec::new());
    }

    #[test]
    fn test_name_at_max_length_mints_and_registry_stays_readable() {
        let sender = test_address(1);
        let mut store = store_with_account(&sender, 1000);
        let mut ledger = MockLedger::new().with_balance(&sender, 1000);
        let ctx = TransitionContext::new(sender.clone(), 1);

        let name = "x".repeat(MAX_NAME_LENGTH);
        let token_id = apply(&mut store, &mut ledger, &ctx, test_params(&name, 100)).unwrap();

        let tokens = registry::get_all_tokens(&store).expect("registry must decode");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].id, token_id);
        assert_eq!(tokens[0].name, name);
        assert_eq!(ledger.balance(&sender), 900);
    }

    #[test]
    fn test_missing_account_is_hard_error() {
        let sender = test_address(1);
        let mut store = MemoryStore::new();
        let mut ledger = MockLedger::new().with_balance(&sender, 1000);
        let ctx = TransitionContext::new(sender.clone(), 1);

        let err = apply(&mut store, &mut ledger, &ctx, test_params("Art1", 100)).unwrap_err();
        assert!(matches!(err, ExecutionError::AccountNotFound));

        // Nothing written, nothing debited
        assert!(store.is_empty());
        assert_eq!(ledger.balance(&sender), 1000);
    }

    #[test]
    fn test_insufficient_funds_leaves_state_unchanged() {
        let sender = test_address(1);
        let mut store = store_with_account(&sender, 50);
        let mut ledger = MockLedger::new().with_balance(&sender, 50);
        let ctx = TransitionContext::new(sender.clone(), 1);

        let err = apply(&mut store, &mut ledger, &ctx, test_params("Art1", 100)).unwrap_err();
        assert!(matches!(err, ExecutionError::InsufficientFunds));

        // Account restored from pre-image, registry untouched, no debit
        let account = load_account(&store, &sender);
        assert!(account.owned_tokens.is_empty());
        assert_eq!(registry::get_all_tokens(&store).unwrap(), Vec::new());
        assert_eq!(ledger.balance(&sender), 50);
    }

    #[test]
    fn test_registry_write_failure_rolls_back_account_and_debit() {
        let sender = test_address(1);
        let mut store = FlakyStore {
            inner: store_with_account(&sender, 1000),
            fail_registry_writes: true,
        };
        let mut ledger = MockLedger::new().with_balance(&sender, 1000);
        let ctx = TransitionContext::new(sender.clone(), 1);

        let err = apply(&mut store, &mut ledger, &ctx, test_params("Art1", 100)).unwrap_err();
        assert!(matches!(err, ExecutionError::Store(StoreError::WriteFailed(_))));

        // Account restored, debit compensated
        let account = load_account(&store, &sender);
        assert!(account.owned_tokens.is_empty());
        assert_eq!(ledger.balance(&sender), 1000);
        assert_eq!(registry::get_all_tokens(&store).unwrap(), Vec::new());
    }

    #[test]
    fn test_replayed_nonce_rejected() {
        let sender = test_address(1);
        let mut store = store_with_account(&sender, 1000);
        let mut ledger = MockLedger::new().with_balance(&sender, 1000);
        let ctx = TransitionContext::new(sender.clone(), 1);

        apply(&mut store, &mut ledger, &ctx, test_params("Art1", 100)).unwrap();
        let err = apply(&mut store, &mut ledger, &ctx, test_params("Art1", 100)).unwrap_err();
        assert!(matches!(err, ExecutionError::TokenAlreadyExists));

        // Second attempt fully rolled back
        let account = load_account(&store, &sender);
        assert_eq!(account.owned_tokens.len(), 1);
        assert_eq!(registry::get_all_tokens(&store).unwrap().len(), 1);
        assert_eq!(ledger.balance(&sender), 900);
    }

    #[test]
    fn test_concurrent_mints_for_distinct_senders() {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        let ledger = Arc::new(Mutex::new(MockLedger::new()));

        let senders = [test_address(1), test_address(2)];
        for sender in &senders {
            let account = Account::new(sender.clone(), 1000);
            store
                .lock()
                .unwrap()
                .set(&account_key(sender), account.to_bytes())
                .unwrap();
            ledger
                .lock()
                .unwrap()
                .balances
                .insert(sender.clone(), 1000);
        }

        // The registry read-modify-write must be serialized per key; here the
        // store lock is held across the whole apply, as a transactional host
        // store would.
        let handles: Vec<_> = senders
            .iter()
            .cloned()
            .map(|sender| {
                let store = Arc::clone(&store);
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    let mut store = store.lock().unwrap();
                    let mut ledger = ledger.lock().unwrap();
                    let ctx = TransitionContext::new(sender, 1);
                    apply(&mut *store, &mut *ledger, &ctx, test_params("Art1", 100))
                })
            })
            .collect();

        let ids: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert_ne!(ids[0], ids[1]);

        // No lost update: both tokens landed in the registry
        let store = store.lock().unwrap();
        let tokens = registry::get_all_tokens(&*store).unwrap();
        assert_eq!(tokens.len(), 2);
        for sender in &senders {
            assert_eq!(ledger.lock().unwrap().balance(sender), 900);
            assert_eq!(load_account(&*store, sender).owned_tokens.len(), 1);
        }
    }
}
