//! Ledger Engine
//!
//! Authoritative account/journal engine. Applies a transfer as one debit plus
//! one credit under ordered row locks, idempotent on `transfer_id`.
//!
//! # Safety Invariants
//!
//! 1. **Conservation**: the sum of balances is unchanged by any transfer
//! 2. **Ordered locking**: account rows are always locked in ascending id
//!    order; this is the sole deadlock-avoidance mechanism
//! 3. **Double entry**: every applied transfer commits exactly one DEBIT and
//!    one CREDIT row of equal amount, atomically
//! 4. **Idempotency**: the `(transfer_id, account_id, entry_type)` unique
//!    index turns a racing duplicate into `AlreadyApplied`, never a double
//!    application

pub mod api;
pub mod engine;
pub mod error;
pub mod models;

pub use engine::LedgerEngine;
pub use error::LedgerError;
pub use models::{Account, ApplyOutcome, EntryType, JournalEntry};
