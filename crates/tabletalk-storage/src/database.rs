// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use tabletalk_core::TabletalkError;
use tracing::info;

use crate::migrations;

/// Maps a tokio-rusqlite error into the storage error kind.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> TabletalkError {
    TabletalkError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database backing the session store.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (or creates) the database file, applies PRAGMAs, and runs all
    /// pending migrations.
    pub async fn open(path: &Path, wal_mode: bool) -> Result<Self, TabletalkError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| TabletalkError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_tr_err)?;

        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            migrations::run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %path.display(), wal_mode, "session store opened");
        Ok(Self { conn })
    }

    /// Opens an in-memory database with migrations applied.
    pub async fn open_in_memory() -> Result<Self, TabletalkError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(map_tr_err)?;
        conn.call(move |conn| {
            migrations::run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// The underlying serialized connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Closes the connection, flushing pending work.
    pub async fn close(self) -> Result<(), TabletalkError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_file_and_applies_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabletalk.db");
        let db = Database::open(&path, true).await.unwrap();

        // Migrations created both tables.
        let count: i64 = db
            .connection()
            .call(|conn| {
                let n = conn.query_row(
                    "SELECT count(*) FROM sqlite_master
                     WHERE type = 'table' AND name IN ('checkpoints', 'messages')",
                    [],
                    |row| row.get(0),
                )?;
                Ok(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert!(path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabletalk.db");
        let db = Database::open(&path, false).await.unwrap();
        db.close().await.unwrap();
        // Reopening re-runs the migration runner without error.
        let db = Database::open(&path, false).await.unwrap();
        db.close().await.unwrap();
    }
}
