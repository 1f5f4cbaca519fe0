//! fundrail - Internal Money Movement Platform
//!
//! Two services over one PostgreSQL store, built step by step.
//!
//! # Modules
//!
//! - [`config`] - YAML configuration with env overrides
//! - [`logging`] - tracing subscriber setup
//! - [`context`] - per-request correlation context
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`ledger`] - authoritative account/journal engine and its HTTP facade
//! - [`client`] - resilient ledger client (retry + circuit breaker)
//! - [`coordinator`] - idempotent transfer coordinator, worker pool, batch
//!   dispatcher and the transfer HTTP facade

pub mod config;
pub mod context;
pub mod logging;

pub mod db;

pub mod client;
pub mod coordinator;
pub mod ledger;

// Convenient re-exports at crate root
pub use client::{LedgerOutcome, ResilientLedgerClient};
pub use config::AppConfig;
pub use context::RequestContext;
pub use coordinator::TransferCoordinator;
pub use ledger::LedgerEngine;
