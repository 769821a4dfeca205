//! SQLite-backed store

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection};

use crate::application::errors::StorageError;
use crate::domain::traits::Store;

/// Store implementation over a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                opened_by TEXT NOT NULL,
                subject TEXT,
                status TEXT NOT NULL DEFAULT 'open',
                created_at TEXT NOT NULL,
                closed_at TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status)",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Internal("connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn execute(&self, sql: &str, params: &[&str]) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        Ok(conn.execute(sql, params_from_iter(params.iter().copied()))?)
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Vec<String>>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(params.iter().copied()), |row| {
            let mut columns = Vec::with_capacity(column_count);
            for i in 0..column_count {
                columns.push(row.get::<_, Option<String>>(i)?.unwrap_or_default());
            }
            Ok(columns)
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query_map([key], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(value) => Ok(Some(value?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn kv_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("color", "blue").await.unwrap();
        assert_eq!(store.get("color").await.unwrap().as_deref(), Some("blue"));
        store.set("color", "red").await.unwrap();
        assert_eq!(store.get("color").await.unwrap().as_deref(), Some("red"));
        store.delete("color").await.unwrap();
        assert_eq!(store.get("color").await.unwrap(), None);
    }

    #[test]
    fn poisoned_lock_is_an_internal_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.conn.lock().unwrap();
            panic!("poison the connection lock");
        }));

        let err = store.lock().unwrap_err();
        assert!(matches!(err, StorageError::Internal(_)));
    }

    #[tokio::test]
    async fn query_returns_rows_as_strings() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .execute(
                "INSERT INTO tickets (id, opened_by, subject, created_at)
                 VALUES (?1, ?2, ?3, datetime('now'))",
                &["t-1", "user-9", "broken button"],
            )
            .await
            .unwrap();

        let rows = store
            .query(
                "SELECT id, status FROM tickets WHERE opened_by = ?1",
                &["user-9"],
            )
            .await
            .unwrap();
        assert_eq!(rows, vec![vec!["t-1".to_string(), "open".to_string()]]);
    }
}
