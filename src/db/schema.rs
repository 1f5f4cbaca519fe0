//! PostgreSQL schema bootstrap
//!
//! Startup DDL handling, governed by the configured policy. The two unique
//! indexes below are load-bearing: `(transfer_id, account_id, entry_type)` on
//! journal entries and `idempotency_key` on transfer records are the
//! enforcement primitives for idempotency. Dropping either breaks the
//! duplicate-suppression guarantee.

use anyhow::Result;
use sqlx::PgPool;

/// Startup DDL policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlPolicy {
    /// Create tables if missing
    Create,
    /// Drop all tables, then create
    CreateDrop,
    /// Additive update (same as Create: statements are IF NOT EXISTS)
    Update,
    /// Verify the tables exist, fail startup otherwise
    Validate,
    /// Do nothing
    None,
}

impl DdlPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(DdlPolicy::Create),
            "create-drop" => Some(DdlPolicy::CreateDrop),
            "update" => Some(DdlPolicy::Update),
            "validate" => Some(DdlPolicy::Validate),
            "none" => Some(DdlPolicy::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DdlPolicy::Create => "create",
            DdlPolicy::CreateDrop => "create-drop",
            DdlPolicy::Update => "update",
            DdlPolicy::Validate => "validate",
            DdlPolicy::None => "none",
        }
    }
}

/// Apply the configured DDL policy at startup
pub async fn apply_ddl(pool: &PgPool, policy: DdlPolicy) -> Result<()> {
    tracing::info!(policy = policy.as_str(), "Applying schema DDL policy");

    match policy {
        DdlPolicy::Create | DdlPolicy::Update => create_tables(pool).await?,
        DdlPolicy::CreateDrop => {
            drop_tables(pool).await?;
            create_tables(pool).await?;
        }
        DdlPolicy::Validate => validate_tables(pool).await?,
        DdlPolicy::None => {}
    }

    Ok(())
}

async fn create_tables(pool: &PgPool) -> Result<()> {
    for (name, ddl) in [
        ("accounts", CREATE_ACCOUNTS_TABLE),
        ("journal_entries", CREATE_JOURNAL_ENTRIES_TABLE),
        ("transfer_records", CREATE_TRANSFER_RECORDS_TABLE),
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create {} table: {}", name, e))?;
    }

    tracing::info!("PostgreSQL schema initialized");
    Ok(())
}

async fn drop_tables(pool: &PgPool) -> Result<()> {
    sqlx::query("DROP TABLE IF EXISTS journal_entries, transfer_records, accounts")
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to drop tables: {}", e))?;
    Ok(())
}

async fn validate_tables(pool: &PgPool) -> Result<()> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM information_schema.tables
        WHERE table_schema = 'public'
          AND table_name IN ('accounts', 'journal_entries', 'transfer_records')
        "#,
    )
    .fetch_one(pool)
    .await?;

    if count != 3 {
        anyhow::bail!(
            "Schema validation failed: expected 3 tables, found {}",
            count
        );
    }
    Ok(())
}

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id          BIGSERIAL PRIMARY KEY,
    balance     NUMERIC(24, 8) NOT NULL CHECK (balance >= 0),
    version     BIGINT NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_JOURNAL_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS journal_entries (
    id           BIGSERIAL PRIMARY KEY,
    transfer_id  TEXT NOT NULL,
    account_id   BIGINT NOT NULL REFERENCES accounts (id),
    amount       NUMERIC(24, 8) NOT NULL CHECK (amount > 0),
    entry_type   TEXT NOT NULL CHECK (entry_type IN ('DEBIT', 'CREDIT')),
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT journal_entries_transfer_account_type_key
        UNIQUE (transfer_id, account_id, entry_type)
)
"#;

const CREATE_TRANSFER_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfer_records (
    id               BIGSERIAL PRIMARY KEY,
    transfer_id      TEXT NOT NULL UNIQUE,
    idempotency_key  TEXT NOT NULL UNIQUE,
    from_account_id  BIGINT NOT NULL,
    to_account_id    BIGINT NOT NULL,
    amount           NUMERIC(24, 8) NOT NULL,
    status           TEXT NOT NULL CHECK (status IN ('PENDING', 'COMPLETED', 'FAILED')),
    error_message    TEXT,
    created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;
