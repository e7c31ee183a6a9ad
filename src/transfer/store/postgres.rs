//! PostgreSQL account store
//!
//! Balances live in `accounts(id BIGINT PRIMARY KEY, balance NUMERIC)`.
//! Each UPDATE takes the row lock, so concurrent transfers touching the same
//! account serialize inside PostgreSQL until the holder commits or rolls back.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use super::{AccountStore, AccountTx};
use crate::db::Database;
use crate::transfer::error::TransferError;
use crate::transfer::types::AccountId;

pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> Result<Box<dyn AccountTx>, TransferError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAccountTx { tx }))
    }

    async fn balance(&self, id: AccountId) -> Result<Option<Decimal>, TransferError> {
        let balance =
            sqlx::query_scalar::<_, Decimal>("SELECT balance FROM accounts WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(balance)
    }
}

/// Open transaction on a pooled connection; sqlx rolls back on drop
pub struct PgAccountTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AccountTx for PgAccountTx {
    async fn debit(
        &mut self,
        id: AccountId,
        amount: Decimal,
    ) -> Result<Option<Decimal>, TransferError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "UPDATE accounts SET balance = balance - $1 WHERE id = $2 RETURNING balance",
        )
        .bind(amount)
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(balance)
    }

    async fn credit(
        &mut self,
        id: AccountId,
        amount: Decimal,
    ) -> Result<Option<Decimal>, TransferError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "UPDATE accounts SET balance = balance + $1 WHERE id = $2 RETURNING balance",
        )
        .bind(amount)
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(balance)
    }

    async fn commit(self: Box<Self>) -> Result<(), TransferError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TransferError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
