//! Account Transfer CLI
//!
//! Moves an amount between two accounts and exits with a status that tells
//! the caller what happened.
//!
//! ```text
//! account_transfer [--env dev] [--from 1] [--to 2] [--amount 100.00] [--init-schema]
//! ```
//!
//! Exit codes: `0` committed, `1` rejected or failed, `2` fatal (config,
//! logging, database unavailable).

use std::process::ExitCode;
use std::sync::Arc;

use account_transfer::config::AppConfig;
use account_transfer::db::Database;
use account_transfer::money::Amount;
use account_transfer::transfer::{AccountId, PgAccountStore, TransferError, TransferExecutor};

const EXIT_FAILED: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn get_arg(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if names.contains(&args[i].as_str()) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn get_env() -> String {
    get_arg(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string())
}

fn use_init_schema() -> bool {
    std::env::args().any(|a| a == "--init-schema")
}

fn parse_account(flag: &str, default: i64) -> anyhow::Result<AccountId> {
    match get_arg(&[flag]) {
        Some(raw) => raw
            .parse::<i64>()
            .map(AccountId)
            .map_err(|e| anyhow::anyhow!("{} must be an integer account id: {}", flag, e)),
        None => Ok(AccountId(default)),
    }
}

fn main() -> ExitCode {
    let env = get_env();
    let app_config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let _log_guard = match account_transfer::logging::init_logging(&app_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Failed to initialize logging: {}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    tracing::info!("Starting account transfer in {} mode", env);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start tokio runtime: {}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    rt.block_on(run(app_config))
}

async fn run(config: AppConfig) -> ExitCode {
    let scale = config.transfer.amount_scale;
    let request = (|| -> anyhow::Result<_> {
        let from = parse_account("--from", 1)?;
        let to = parse_account("--to", 2)?;
        let raw_amount = get_arg(&["--amount"]).unwrap_or_else(|| "100.00".to_string());
        let amount = Amount::parse(&raw_amount, scale)?;
        Ok((from, to, amount))
    })();
    let (from, to, amount) = match request {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("Invalid arguments: {}", e);
            return ExitCode::from(EXIT_FAILED);
        }
    };

    let db = match Database::connect(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    if use_init_schema() {
        if let Err(e) = db.ensure_schema(scale).await {
            tracing::error!("Failed to create accounts schema: {}", e);
            db.close().await;
            return ExitCode::from(EXIT_FATAL);
        }
    }

    let store = Arc::new(PgAccountStore::from_database(&db));
    let executor = TransferExecutor::from_config(store, &config.transfer);

    let code = match executor.transfer(from, to, amount).await {
        Ok(receipt) => {
            println!(
                "✅ Transferred {} from {} to {} (balances: {} / {})",
                receipt.amount, receipt.from, receipt.to, receipt.from_balance, receipt.to_balance
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Transfer failed [{}]: {}", e.code(), e);
            exit_code_for(&e)
        }
    };

    db.close().await;
    code
}

fn exit_code_for(e: &TransferError) -> ExitCode {
    if e.is_fatal() {
        ExitCode::from(EXIT_FATAL)
    } else {
        ExitCode::from(EXIT_FAILED)
    }
}
