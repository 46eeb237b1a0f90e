//! Durable persistence of call records
//!
//! One row per processed event, inserted in its own implicit transaction.
//! The table is append-only: this process never updates or deletes. The
//! raw mapping rides along as JSON text so the row stays auditable even
//! when extraction missed a field.

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::types::CallRecord;

/// Failure classes of the durable store
///
/// The split decides the pipeline's reaction: a rejected record is logged
/// and dropped while the stream continues; an unavailable store ends the
/// process so the supervisor restarts it instead of every subsequent
/// write failing the same way.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The statement failed but the connection remains usable
    #[error("record rejected by the store: {0}")]
    Rejected(#[source] sqlx::Error),

    /// Connection-level failure; nothing will persist until it heals
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// The audit serialization of the raw mapping failed
    #[error("audit serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only sink for processed events
#[async_trait]
pub trait CallRecordStore: Send + Sync {
    async fn append(&self, record: &CallRecord) -> Result<(), StoreError>;
}

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS call_records (
    id            BIGSERIAL PRIMARY KEY,
    event_time    TIMESTAMPTZ NOT NULL,
    uniqueid      TEXT,
    linkedid      TEXT,
    src_extension TEXT,
    dialed_raw    TEXT,
    dialed_10     TEXT,
    disposition   TEXT,
    channel       TEXT,
    contact_id    BIGINT,
    contract_id   TEXT,
    contact_name  TEXT,
    raw           TEXT NOT NULL
)";

const INSERT: &str = "\
INSERT INTO call_records (
    event_time, uniqueid, linkedid, src_extension,
    dialed_raw, dialed_10, disposition, channel,
    contact_id, contract_id, contact_name, raw
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

/// Store backed by the `call_records` table
pub struct PgCallRecordStore {
    pool: PgPool,
}

impl PgCallRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `call_records` table when absent
    ///
    /// The external `contacts` table is never touched here.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CallRecordStore for PgCallRecordStore {
    async fn append(&self, record: &CallRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&record.raw)?;
        sqlx::query(INSERT)
            .bind(record.event_time)
            .bind(record.uniqueid.as_deref())
            .bind(record.linkedid.as_deref())
            .bind(record.src_extension.as_deref())
            .bind(record.dialed_raw.as_deref())
            .bind(record.dialed_10.as_deref())
            .bind(record.disposition.as_deref())
            .bind(record.channel.as_deref())
            .bind(record.contact_id)
            .bind(record.contract_id.as_deref())
            .bind(record.contact_name.as_deref())
            .bind(raw)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        debug!(
            "appended call record uniqueid={}",
            record.uniqueid.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}

/// Sort a sqlx failure into the rejected/unavailable split
fn classify(error: sqlx::Error) -> StoreError {
    use sqlx::Error as Sql;
    let unavailable = matches!(
        error,
        Sql::Io(_)
            | Sql::Tls(_)
            | Sql::Protocol(_)
            | Sql::PoolTimedOut
            | Sql::PoolClosed
            | Sql::WorkerCrashed
    );
    if unavailable {
        StoreError::Unavailable(error)
    } else {
        StoreError::Rejected(error)
    }
}

/// In-memory store for tests
#[derive(Debug, Default)]
pub struct MemoryCallRecordStore {
    records: RwLock<Vec<CallRecord>>,
}

impl MemoryCallRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CallRecordStore for MemoryCallRecordStore {
    async fn append(&self, record: &CallRecord) -> Result<(), StoreError> {
        self.records.write().push(record.clone());
        Ok(())
    }
}
