//! Account Transfer
//!
//! Debits one account and credits another inside a single storage
//! transaction. Either both balance updates commit or neither does.
//!
//! # Safety Invariants
//!
//! 1. **Validate-Before-Begin**: amount and account ids are checked before a connection is taken
//! 2. **Debit-Then-Credit**: the source is debited and checked for a negative balance first
//! 3. **Rollback-On-Any-Failure**: business rejections, storage errors and timeouts all roll back
//! 4. **No Swallowed Errors**: every failure reaches the caller as a [`TransferError`]

pub mod error;
pub mod executor;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use error::TransferError;
pub use executor::TransferExecutor;
pub use store::{AccountStore, AccountTx, MemoryAccountStore, PgAccountStore};
pub use types::{AccountId, AccountRole, TransferReceipt, TransferRequest};
