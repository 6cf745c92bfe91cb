//! Durable queue and session persistence
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//!
//! The agent only ever sees the [`Store`] trait; implementations own the
//! durable bytes. Queue order is insertion order, carried by the rowid.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::session::SessionRecord;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: singleton session row + FIFO event queue
    r#"
    CREATE TABLE IF NOT EXISTS session (
        id            INTEGER PRIMARY KEY CHECK (id = 0),
        user_id       INTEGER NOT NULL,
        first_seen_at INTEGER NOT NULL,
        previous_at   INTEGER NOT NULL,
        current_at    INTEGER NOT NULL,
        visit_count   INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS events (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        payload TEXT NOT NULL
    );
    "#,
];

/// A pending beacon: a fully formed URL waiting for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEvent {
    /// Store-assigned id, monotonically increasing with insertion order
    pub id: i64,
    /// Complete encoded beacon URL, transmitted verbatim
    pub payload: String,
}

/// Durable store boundary the agent talks to.
///
/// Failures are reported to the caller, but the agent recovers from all of
/// them: reads degrade to "no data", writes are best effort.
pub trait Store: Send + Sync {
    /// Insertion-ordered snapshot of pending events
    fn events(&self) -> Result<Vec<QueuedEvent>>;

    /// Append a new pending event
    fn save_event(&self, payload: &str) -> Result<()>;

    /// Remove a dispatched event
    fn delete_event(&self, id: i64) -> Result<()>;

    /// The stored session record, if any
    fn session(&self) -> Result<Option<SessionRecord>>;

    /// Replace the stored session record
    fn save_session(&self, record: &SessionRecord) -> Result<()>;
}

/// SQLite-backed [`Store`]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Run all pending migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let current_version: i32 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap_or(0);

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                tracing::debug!(version, "Running store migration");
                conn.execute_batch(migration)?;
                conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
            }
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn events(&self) -> Result<Vec<QueuedEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, payload FROM events ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(QueuedEvent {
                id: row.get(0)?,
                payload: row.get(1)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    fn save_event(&self, payload: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO events (payload) VALUES (?1)", params![payload])?;
        Ok(())
    }

    fn delete_event(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn session(&self) -> Result<Option<SessionRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT user_id, first_seen_at, previous_at, current_at, visit_count
             FROM session WHERE id = 0",
            [],
            |row| {
                Ok(SessionRecord {
                    user_id: row.get(0)?,
                    first_seen_at: row.get(1)?,
                    previous_at: row.get(2)?,
                    current_at: row.get(3)?,
                    visit_count: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    fn save_session(&self, record: &SessionRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO session (id, user_id, first_seen_at, previous_at, current_at, visit_count)
             VALUES (0, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                first_seen_at = excluded.first_seen_at,
                previous_at = excluded.previous_at,
                current_at = excluded.current_at,
                visit_count = excluded.visit_count",
            params![
                record.user_id,
                record.first_seen_at,
                record.previous_at,
                record.current_at,
                record.visit_count,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        // running again is a no-op
        store.migrate().unwrap();
    }

    #[test]
    fn test_events_fifo_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_event("http://c/1").unwrap();
        store.save_event("http://c/2").unwrap();
        store.save_event("http://c/3").unwrap();

        let events = store.events().unwrap();
        let payloads: Vec<&str> = events.iter().map(|e| e.payload.as_str()).collect();
        assert_eq!(payloads, vec!["http://c/1", "http://c/2", "http://c/3"]);
        assert!(events[0].id < events[1].id && events[1].id < events[2].id);
    }

    #[test]
    fn test_delete_event_removes_exactly_one() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_event("http://c/1").unwrap();
        store.save_event("http://c/2").unwrap();

        let events = store.events().unwrap();
        store.delete_event(events[0].id).unwrap();

        let remaining = store.events().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].payload, "http://c/2");
    }

    #[test]
    fn test_session_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.session().unwrap().is_none());

        let record = SessionRecord {
            user_id: 7,
            first_seen_at: 1,
            previous_at: 1,
            current_at: 2,
            visit_count: 2,
        };
        store.save_session(&record).unwrap();
        assert_eq!(store.session().unwrap().unwrap(), record);

        // saving again replaces the singleton row
        let mut advanced = record.clone();
        advanced.visit_count = 3;
        store.save_session(&advanced).unwrap();
        assert_eq!(store.session().unwrap().unwrap().visit_count, 3);
    }
}
