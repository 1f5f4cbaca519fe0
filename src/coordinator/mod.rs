//! Transfer Coordinator
//!
//! Idempotent front-end for money movement. Two-stage pipeline:
//!
//! ```text
//! intent (PENDING persisted) -> worker pool -> resilient ledger call
//!                                                  |
//!                             COMPLETED <- Applied | Rejected/Unavailable -> FAILED
//! ```
//!
//! Two independent idempotency layers: the client-facing `Idempotency-Key`
//! (unique index on transfer records) and the server-assigned `transfer_id`
//! (journal-entry unique index inside the ledger).

pub mod api;
pub mod batch;
pub mod db;
pub mod error;
pub mod pool;
pub mod recovery;
pub mod service;
pub mod types;

// Re-exports for convenience
pub use batch::BatchDispatcher;
pub use error::CoordinatorError;
pub use recovery::RecoveryWorker;
pub use service::TransferCoordinator;
pub use types::{TransferIntent, TransferRecord, TransferStatus};
