//! Data models for the ledger engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// An internal account
///
/// `version` advances on every mutation. The pessimistic row lock is the
/// authoritative concurrency control; the version is asserted on update as a
/// second line of defense.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub balance: Decimal,
    pub version: i64,
}

/// Journal entry type: one half of a double-entry pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEBIT" => Some(EntryType::Debit),
            "CREDIT" => Some(EntryType::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One journal row. Append-only; never modified or deleted.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub id: i64,
    pub transfer_id: String,
    pub account_id: i64,
    pub amount: Decimal,
    pub entry_type: EntryType,
    pub created_at: DateTime<Utc>,
}

/// Result of `apply_transfer`
///
/// Both variants are success: a replay of an applied transfer reports
/// `AlreadyApplied` and leaves all state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    AlreadyApplied,
}

impl ApplyOutcome {
    #[inline]
    pub fn is_replay(&self) -> bool {
        matches!(self, ApplyOutcome::AlreadyApplied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_roundtrip() {
        assert_eq!(EntryType::parse("DEBIT"), Some(EntryType::Debit));
        assert_eq!(EntryType::parse("CREDIT"), Some(EntryType::Credit));
        assert_eq!(EntryType::parse("debit"), None);
        assert_eq!(EntryType::parse(""), None);

        assert_eq!(EntryType::Debit.to_string(), "DEBIT");
        assert_eq!(EntryType::Credit.to_string(), "CREDIT");
    }

    #[test]
    fn test_apply_outcome() {
        assert!(!ApplyOutcome::Applied.is_replay());
        assert!(ApplyOutcome::AlreadyApplied.is_replay());
    }
}
