//! In-memory account store
//!
//! A transaction holds the whole table lock until it ends, which is stricter
//! than row locking but gives the same guarantee for conflicting transfers.
//! Writes are staged and only become visible on commit.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::{AccountStore, AccountTx};
use crate::transfer::error::TransferError;
use crate::transfer::types::AccountId;

type Accounts = HashMap<AccountId, Decimal>;

/// One-shot failures, consumed by the operation they target
#[derive(Default)]
struct Faults {
    fail_debit: AtomicBool,
    fail_credit: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    credit_delay: Mutex<Option<Duration>>,
}

impl Faults {
    fn take(flag: &AtomicBool, op: &str) -> Result<(), TransferError> {
        if flag.swap(false, Ordering::SeqCst) {
            Err(TransferError::TransientStorage(format!(
                "injected {} failure",
                op
            )))
        } else {
            Ok(())
        }
    }
}

pub struct MemoryAccountStore {
    accounts: Arc<AsyncMutex<Accounts>>,
    faults: Arc<Faults>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::with_accounts(std::iter::empty())
    }

    pub fn with_accounts<I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (AccountId, Decimal)>,
    {
        Self {
            accounts: Arc::new(AsyncMutex::new(accounts.into_iter().collect())),
            faults: Arc::new(Faults::default()),
        }
    }

    pub async fn set_balance(&self, id: AccountId, balance: Decimal) {
        self.accounts.lock().await.insert(id, balance);
    }

    pub fn fail_next_debit(&self) {
        self.faults.fail_debit.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_credit(&self) {
        self.faults.fail_credit.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_commit(&self) {
        self.faults.fail_commit.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_rollback(&self) {
        self.faults.fail_rollback.store(true, Ordering::SeqCst);
    }

    /// Stall the next credit, simulating a slow round trip
    pub fn delay_next_credit(&self, delay: Duration) {
        if let Ok(mut slot) = self.faults.credit_delay.lock() {
            *slot = Some(delay);
        }
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn AccountTx>, TransferError> {
        let guard = self.accounts.clone().lock_owned().await;
        Ok(Box::new(MemoryAccountTx {
            guard,
            staged: HashMap::new(),
            faults: self.faults.clone(),
        }))
    }

    async fn balance(&self, id: AccountId) -> Result<Option<Decimal>, TransferError> {
        Ok(self.accounts.lock().await.get(&id).copied())
    }
}

pub struct MemoryAccountTx {
    guard: OwnedMutexGuard<Accounts>,
    staged: Accounts,
    faults: Arc<Faults>,
}

impl MemoryAccountTx {
    fn apply(&mut self, id: AccountId, delta: Decimal) -> Option<Decimal> {
        let current = self
            .staged
            .get(&id)
            .or_else(|| self.guard.get(&id))
            .copied()?;
        let updated = current + delta;
        self.staged.insert(id, updated);
        Some(updated)
    }
}

#[async_trait]
impl AccountTx for MemoryAccountTx {
    async fn debit(
        &mut self,
        id: AccountId,
        amount: Decimal,
    ) -> Result<Option<Decimal>, TransferError> {
        Faults::take(&self.faults.fail_debit, "debit")?;
        Ok(self.apply(id, -amount))
    }

    async fn credit(
        &mut self,
        id: AccountId,
        amount: Decimal,
    ) -> Result<Option<Decimal>, TransferError> {
        let delay = self
            .faults
            .credit_delay
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Faults::take(&self.faults.fail_credit, "credit")?;
        Ok(self.apply(id, amount))
    }

    async fn commit(self: Box<Self>) -> Result<(), TransferError> {
        Faults::take(&self.faults.fail_commit, "commit")?;
        let MemoryAccountTx {
            mut guard, staged, ..
        } = *self;
        guard.extend(staged);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TransferError> {
        // Staged writes die with the transaction whether or not this succeeds,
        // same as a server dropping a broken connection
        Faults::take(&self.faults.fail_rollback, "rollback")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[tokio::test]
    async fn test_staged_writes_visible_only_after_commit() {
        let store = Arc::new(MemoryAccountStore::with_accounts([(AccountId(1), dec(100))]));

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.debit(AccountId(1), dec(30)).await.unwrap(), Some(dec(70)));
        assert_eq!(tx.debit(AccountId(1), dec(30)).await.unwrap(), Some(dec(40)));
        tx.commit().await.unwrap();

        assert_eq!(store.balance(AccountId(1)).await.unwrap(), Some(dec(40)));
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let store = MemoryAccountStore::with_accounts([(AccountId(1), dec(100))]);

        let mut tx = store.begin().await.unwrap();
        tx.credit(AccountId(1), dec(5)).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.credit(AccountId(1), dec(5)).await.unwrap();
        drop(tx);

        assert_eq!(store.balance(AccountId(1)).await.unwrap(), Some(dec(100)));
    }

    #[tokio::test]
    async fn test_failed_rollback_still_discards_writes() {
        let store = MemoryAccountStore::new();
        store.set_balance(AccountId(3), dec(20)).await;
        store.fail_next_rollback();

        let mut tx = store.begin().await.unwrap();
        tx.debit(AccountId(3), dec(5)).await.unwrap();
        assert!(matches!(
            tx.rollback().await,
            Err(TransferError::TransientStorage(_))
        ));

        assert_eq!(store.balance(AccountId(3)).await.unwrap(), Some(dec(20)));
    }

    #[tokio::test]
    async fn test_missing_account_matches_no_row() {
        let store = MemoryAccountStore::new();
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.debit(AccountId(9), dec(1)).await.unwrap(), None);
        assert_eq!(tx.credit(AccountId(9), dec(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_faults_are_one_shot() {
        let store = MemoryAccountStore::with_accounts([(AccountId(1), dec(10))]);
        store.fail_next_debit();

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.debit(AccountId(1), dec(1)).await,
            Err(TransferError::TransientStorage(_))
        ));
        assert_eq!(tx.debit(AccountId(1), dec(1)).await.unwrap(), Some(dec(9)));
    }
}
