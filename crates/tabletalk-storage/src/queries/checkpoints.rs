// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context checkpoint CRUD operations.
//!
//! One row per (session_id, actor_id); saving replaces both text fields.

use rusqlite::params;
use tabletalk_core::{ContextCheckpoint, TabletalkError};

use crate::database::{map_tr_err, Database};

/// Insert or replace the checkpoint for a session.
pub async fn upsert_checkpoint(
    db: &Database,
    session_id: &str,
    actor_id: &str,
    checkpoint: &ContextCheckpoint,
) -> Result<(), TabletalkError> {
    let session_id = session_id.to_string();
    let actor_id = actor_id.to_string();
    let checkpoint = checkpoint.clone();
    let updated_at = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO checkpoints (session_id, actor_id, schema_text, sample_text, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (session_id, actor_id) DO UPDATE SET
                     schema_text = excluded.schema_text,
                     sample_text = excluded.sample_text,
                     updated_at = excluded.updated_at",
                params![
                    session_id,
                    actor_id,
                    checkpoint.schema_text,
                    checkpoint.sample_text,
                    updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get the checkpoint for a session, if one was ever saved.
pub async fn get_checkpoint(
    db: &Database,
    session_id: &str,
    actor_id: &str,
) -> Result<Option<ContextCheckpoint>, TabletalkError> {
    let session_id = session_id.to_string();
    let actor_id = actor_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT schema_text, sample_text FROM checkpoints
                 WHERE session_id = ?1 AND actor_id = ?2",
            )?;
            let mut rows = stmt.query_map(params![session_id, actor_id], |row| {
                Ok(ContextCheckpoint {
                    schema_text: row.get(0)?,
                    sample_text: row.get(1)?,
                })
            })?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}
