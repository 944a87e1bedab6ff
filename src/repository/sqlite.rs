use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{info, warn};

use super::Repository;
use crate::domain::Signal;
use crate::error::{EngineError, EngineResult};

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS signals (
    signal_id TEXT PRIMARY KEY,
    input_event_hash TEXT NOT NULL,
    generated_at INTEGER NOT NULL,
    payload_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_signals_input_event_hash ON signals(input_event_hash);
CREATE INDEX IF NOT EXISTS idx_signals_generated_at ON signals(generated_at);
"#;

/// Durable repository over SQLite. `save` is an upsert keyed by
/// `signal_id` (deterministic, so retried saves of the same signal are
/// no-ops in effect).
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn open(db_path: &str) -> EngineResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(db_path, flags)
            .map_err(|e| EngineError::LedgerWriteFailed(format!("open sqlite repo: {e}")))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| EngineError::LedgerWriteFailed(format!("init sqlite repo schema: {e}")))?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap_or_default();
        if journal_mode.to_lowercase() != "wal" {
            warn!(journal_mode, "sqlite repository did not enter WAL mode");
        }
        info!(db_path, "durable signal repository initialized");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_signal(payload_json: String) -> EngineResult<Signal> {
        serde_json::from_str(&payload_json).map_err(EngineError::from)
    }
}

impl Repository for SqliteRepository {
    fn save(&self, signal: Signal) -> EngineResult<()> {
        let payload = serde_json::to_string(&signal)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO signals (signal_id, input_event_hash, generated_at, payload_json)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(signal_id) DO UPDATE SET payload_json = excluded.payload_json",
            params![
                signal.signal_id,
                signal.input_event_hash,
                signal.generated_at.timestamp_millis(),
                payload,
            ],
        )
        .map_err(|e| EngineError::LedgerWriteFailed(format!("save signal: {e}")))?;
        Ok(())
    }

    fn find_by_id(&self, signal_id: &str) -> EngineResult<Option<Signal>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT payload_json FROM signals WHERE signal_id = ?1",
            params![signal_id],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(json) => Ok(Some(Self::row_to_signal(json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(EngineError::LedgerWriteFailed(format!("find_by_id: {e}"))),
        }
    }

    fn find_by_hash(&self, input_event_hash: &str) -> EngineResult<Option<Signal>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT payload_json FROM signals WHERE input_event_hash = ?1 ORDER BY generated_at DESC LIMIT 1",
            params![input_event_hash],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(json) => Ok(Some(Self::row_to_signal(json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(EngineError::LedgerWriteFailed(format!("find_by_hash: {e}"))),
        }
    }

    fn find_recent(&self, limit: usize, since: Option<DateTime<Utc>>) -> EngineResult<Vec<Signal>> {
        let conn = self.conn.lock();
        let since_ms = since.map(|d| d.timestamp_millis()).unwrap_or(0);
        let mut stmt = conn
            .prepare(
                "SELECT payload_json FROM signals
                 WHERE generated_at >= ?1
                 ORDER BY generated_at DESC
                 LIMIT ?2",
            )
            .map_err(|e| EngineError::LedgerWriteFailed(format!("find_recent prepare: {e}")))?;

        let rows = stmt
            .query_map(params![since_ms, limit as i64], |row| row.get::<_, String>(0))
            .map_err(|e| EngineError::LedgerWriteFailed(format!("find_recent query: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|e| EngineError::LedgerWriteFailed(format!("find_recent row: {e}")))?;
            out.push(Self::row_to_signal(json)?);
        }
        Ok(out)
    }
}
