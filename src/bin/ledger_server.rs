//! Ledger service entry point: engine + HTTP facade

use std::sync::Arc;

use anyhow::Result;

use fundrail::config::AppConfig;
use fundrail::db::Database;
use fundrail::ledger::{api, LedgerEngine};
use fundrail::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let env = std::env::var("FUNDRAIL_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = AppConfig::load(&env)?;
    let _guard = logging::init_logging(&config, "ledger");

    tracing::info!(env = %env, git_hash = env!("GIT_HASH"), "Starting ledger service");

    let db = Database::init(&config.database).await?;

    let engine = Arc::new(LedgerEngine::new(db.pool().clone()));
    api::run_server(&config.ledger, engine).await
}
