//! Transfer Coordinator Core Types

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Transfer record status
///
/// `Completed` and `Failed` are terminal: a record never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Pending,
    Completed,
    Failed,
}

impl TransferStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransferStatus::Pending),
            "COMPLETED" => Some(TransferStatus::Completed),
            "FAILED" => Some(TransferStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client intent: one requested movement under an idempotency key
#[derive(Debug, Clone)]
pub struct TransferIntent {
    pub idempotency_key: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

/// Durable transfer record owned by the coordinator
#[derive(Debug, Clone)]
pub struct TransferRecord {
    /// Store-assigned row id (0 for synthesized, never-persisted records)
    pub id: i64,
    /// Server-synthesized unique handle; appears in the journal entries
    pub transfer_id: String,
    pub idempotency_key: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub status: TransferStatus,
    /// Populated iff status is FAILED
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferRecord {
    /// Whether a stored record matches a replayed intent's parameters
    pub fn matches_intent(&self, intent: &TransferIntent) -> bool {
        self.from_account_id == intent.from_account_id
            && self.to_account_id == intent.to_account_id
            && self.amount == intent.amount
    }

    /// Synthesize a FAILED record for a batch slot whose intent was rejected
    /// before anything could be persisted
    pub fn failed_intent(intent: &TransferIntent, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            transfer_id: Uuid::new_v4().to_string(),
            idempotency_key: intent.idempotency_key.clone(),
            from_account_id: intent.from_account_id,
            to_account_id: intent.to_account_id,
            amount: intent.amount,
            status: TransferStatus::Failed,
            error_message: Some(reason.into()),
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Display for TransferRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] {} -> {} amount={} status={}",
            self.transfer_id, self.from_account_id, self.to_account_id, self.amount, self.status
        )
    }
}
