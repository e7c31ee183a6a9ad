//! Account Stores
//!
//! The executor talks to account storage only through these traits, so the
//! same transfer logic runs against PostgreSQL and the in-memory store.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::error::TransferError;
use super::types::AccountId;

/// Source of account transactions
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Get store name for logging
    fn name(&self) -> &'static str;

    /// Check out a connection and open a transaction on it
    async fn begin(&self) -> Result<Box<dyn AccountTx>, TransferError>;

    /// Read a committed balance, `None` if the account does not exist
    async fn balance(&self, id: AccountId) -> Result<Option<Decimal>, TransferError>;
}

/// One open transaction
///
/// Dropping a transaction without calling [`AccountTx::commit`] rolls it back.
#[async_trait]
pub trait AccountTx: Send {
    /// `balance = balance - amount`, returning the new balance or `None` if no row matched
    async fn debit(
        &mut self,
        id: AccountId,
        amount: Decimal,
    ) -> Result<Option<Decimal>, TransferError>;

    /// `balance = balance + amount`, returning the new balance or `None` if no row matched
    async fn credit(
        &mut self,
        id: AccountId,
        amount: Decimal,
    ) -> Result<Option<Decimal>, TransferError>;

    async fn commit(self: Box<Self>) -> Result<(), TransferError>;

    async fn rollback(self: Box<Self>) -> Result<(), TransferError>;
}
