//! Account Transfer - atomic balance transfers on PostgreSQL
//!
//! # Modules
//!
//! - [`config`] - YAML configuration with `PG*` environment overrides
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - PostgreSQL connection pool lifecycle
//! - [`money`] - Fixed-point transfer amounts
//! - [`transfer`] - Transfer executor and account stores

pub mod config;
pub mod db;
pub mod logging;
pub mod money;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::Database;
pub use money::{Amount, MoneyError};
pub use transfer::{
    AccountId, AccountRole, AccountStore, MemoryAccountStore, PgAccountStore, TransferError,
    TransferExecutor, TransferReceipt, TransferRequest,
};
