//! Transfer Executor
//!
//! Moves an amount between two accounts inside one storage transaction.
//!
//! ```text
//! BEGIN → DEBIT source → CREDIT destination → COMMIT
//!             ↓                  ↓
//!          ROLLBACK           ROLLBACK
//! ```
//!
//! The debit always runs first. When the source lacks funds and the
//! destination is also missing, the caller sees `InsufficientFunds`.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::store::{AccountStore, AccountTx};
use super::types::{AccountId, AccountRole, TransferReceipt, TransferRequest};
use crate::config::TransferConfig;
use crate::money::Amount;

pub struct TransferExecutor {
    store: Arc<dyn AccountStore>,
    timeout: Option<Duration>,
}

impl TransferExecutor {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    pub fn from_config(store: Arc<dyn AccountStore>, config: &TransferConfig) -> Self {
        let executor = Self::new(store);
        if config.timeout_ms > 0 {
            executor.with_timeout(Duration::from_millis(config.timeout_ms))
        } else {
            executor
        }
    }

    /// Bound the whole transaction, from connection checkout to commit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt, TransferError> {
        self.execute(TransferRequest { from, to, amount }).await
    }

    /// Execute a transfer, returning the new balances on commit.
    ///
    /// Every failure is rolled back before it is returned.
    pub async fn execute(&self, req: TransferRequest) -> Result<TransferReceipt, TransferError> {
        let result = match Self::validate(&req) {
            Ok(()) => match self.timeout {
                Some(limit) => tokio::time::timeout(limit, self.run(&req))
                    .await
                    .unwrap_or(Err(TransferError::Timeout(limit))),
                None => self.run(&req).await,
            },
            Err(e) => Err(e),
        };

        match &result {
            Ok(receipt) => info!(
                from = %req.from,
                to = %req.to,
                amount = %req.amount,
                from_balance = %receipt.from_balance,
                to_balance = %receipt.to_balance,
                "Transfer committed"
            ),
            Err(e) if e.is_rejection() => warn!(
                from = %req.from,
                to = %req.to,
                amount = %req.amount,
                code = e.code(),
                "Transfer rejected: {}",
                e
            ),
            Err(e) => error!(
                from = %req.from,
                to = %req.to,
                amount = %req.amount,
                code = e.code(),
                store = self.store.name(),
                retryable = e.is_retryable(),
                "Transfer failed: {}",
                e
            ),
        }

        result
    }

    fn validate(req: &TransferRequest) -> Result<(), TransferError> {
        if req.amount.value() <= Decimal::ZERO {
            return Err(TransferError::InvalidAmount(req.amount.to_string()));
        }
        if req.from == req.to {
            return Err(TransferError::SameAccount(req.from));
        }
        Ok(())
    }

    async fn run(&self, req: &TransferRequest) -> Result<TransferReceipt, TransferError> {
        let mut tx = self.store.begin().await?;
        debug!(from = %req.from, to = %req.to, "Transaction started");

        match Self::apply(tx.as_mut(), req).await {
            Ok((from_balance, to_balance)) => {
                tx.commit().await?;
                Ok(TransferReceipt {
                    from: req.from,
                    to: req.to,
                    amount: req.amount.value(),
                    from_balance,
                    to_balance,
                    completed_at: chrono::Utc::now(),
                })
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    // The connection is discarded either way, the debit can't persist
                    warn!(
                        from = %req.from,
                        to = %req.to,
                        "Rollback failed: {}",
                        rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn apply(
        tx: &mut dyn AccountTx,
        req: &TransferRequest,
    ) -> Result<(Decimal, Decimal), TransferError> {
        let amount = req.amount.value();

        let from_balance =
            tx.debit(req.from, amount)
                .await?
                .ok_or(TransferError::AccountNotFound {
                    role: AccountRole::Source,
                    id: req.from,
                })?;
        if from_balance < Decimal::ZERO {
            return Err(TransferError::InsufficientFunds { account: req.from });
        }
        debug!(account = %req.from, balance = %from_balance, "Source debited");

        let to_balance =
            tx.credit(req.to, amount)
                .await?
                .ok_or(TransferError::AccountNotFound {
                    role: AccountRole::Destination,
                    id: req.to,
                })?;
        debug!(account = %req.to, balance = %to_balance, "Destination credited");

        Ok((from_balance, to_balance))
    }
}
