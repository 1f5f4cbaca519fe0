//! Transfer service entry point: coordinator + worker pool + recovery sweep
//! + HTTP facade

use std::sync::Arc;

use anyhow::{Context, Result};

use fundrail::client::ResilientLedgerClient;
use fundrail::config::AppConfig;
use fundrail::coordinator::api::{self, TransferApiState};
use fundrail::coordinator::{BatchDispatcher, RecoveryWorker, TransferCoordinator};
use fundrail::db::Database;
use fundrail::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let env = std::env::var("FUNDRAIL_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = AppConfig::load(&env)?;
    let _guard = logging::init_logging(&config, "transfer");

    tracing::info!(env = %env, git_hash = env!("GIT_HASH"), "Starting transfer service");

    let db = Database::init(&config.database).await?;

    let client = Arc::new(
        ResilientLedgerClient::over_http(
            &config.transfer.ledger_base_url,
            &config.retry,
            &config.breaker,
            config.transfer.request_timeout(),
        )
        .context("Failed to build ledger client")?,
    );

    let coordinator = Arc::new(TransferCoordinator::new(
        db.pool().clone(),
        client,
        config.transfer.worker_pool_size,
        config.transfer.queue_depth,
    ));
    let batch = Arc::new(BatchDispatcher::new(
        coordinator.clone(),
        config.transfer.batch_cap,
    ));

    // Restart orphans and queue-overflow leftovers converge through the sweep
    let recovery = RecoveryWorker::new(coordinator.clone(), &config.recovery);
    tokio::spawn(async move { recovery.run().await });

    let state = TransferApiState {
        coordinator,
        batch,
        request_timeout: config.transfer.request_timeout(),
    };
    api::run_server(&config.transfer, state).await
}
