//! Transfer Error Types

use std::time::Duration;
use thiserror::Error;

use super::types::{AccountId, AccountRole};
use crate::money::MoneyError;

/// Transfer error types
///
/// Business-rule rejections, storage failures and pool exhaustion are kept
/// apart so callers can choose between reporting, retrying and escalating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Source and destination account are the same: {0}")]
    SameAccount(AccountId),

    // === Account Errors ===
    #[error("{role} account not found: {id}")]
    AccountNotFound { role: AccountRole, id: AccountId },

    #[error("Insufficient funds in account {account}")]
    InsufficientFunds { account: AccountId },

    // === System Errors ===
    #[error("Transient storage error: {0}")]
    TransientStorage(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Connection pool unavailable: {0}")]
    PoolUnavailable(String),

    #[error("Transfer timed out after {0:?}")]
    Timeout(Duration),
}

impl TransferError {
    /// Get the error code for logs and exit reporting
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount(_) => "INVALID_AMOUNT",
            TransferError::SameAccount(_) => "SAME_ACCOUNT",
            TransferError::AccountNotFound {
                role: AccountRole::Source,
                ..
            } => "SOURCE_ACCOUNT_NOT_FOUND",
            TransferError::AccountNotFound {
                role: AccountRole::Destination,
                ..
            } => "DESTINATION_ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::TransientStorage(_) => "TRANSIENT_STORAGE_ERROR",
            TransferError::Storage(_) => "STORAGE_ERROR",
            TransferError::PoolUnavailable(_) => "POOL_UNAVAILABLE",
            TransferError::Timeout(_) => "TIMEOUT",
        }
    }

    /// The same request may succeed if tried again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::TransientStorage(_) | TransferError::Timeout(_)
        )
    }

    /// Rejected by a business rule; the transaction never committed
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidAmount(_)
                | TransferError::SameAccount(_)
                | TransferError::AccountNotFound { .. }
                | TransferError::InsufficientFunds { .. }
        )
    }

    /// Must be escalated rather than handled per request
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransferError::PoolUnavailable(_))
    }
}

impl From<MoneyError> for TransferError {
    fn from(e: MoneyError) -> Self {
        TransferError::InvalidAmount(e.to_string())
    }
}

/// SQLSTATEs worth retrying: serialization_failure, deadlock_detected, query_canceled
const TRANSIENT_SQLSTATES: &[&str] = &["40001", "40P01", "57014"];

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                TransferError::PoolUnavailable(e.to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed => TransferError::TransientStorage(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let transient = db_err.code().is_some_and(|code| {
                    // class 08: connection exception
                    TRANSIENT_SQLSTATES.contains(&&*code) || code.starts_with("08")
                });
                if transient {
                    TransferError::TransientStorage(e.to_string())
                } else {
                    TransferError::Storage(e.to_string())
                }
            }
            _ => TransferError::Storage(e.to_string()),
        }
    }
}
