// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation message CRUD operations.

use rusqlite::params;
use tabletalk_core::{StoredMessage, TabletalkError};

use crate::database::{map_tr_err, Database};

/// Insert a new message.
pub async fn insert_message(db: &Database, msg: &StoredMessage) -> Result<(), TabletalkError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, session_id, actor_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.id,
                    msg.session_id,
                    msg.actor_id,
                    msg.role,
                    msg.content,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get all messages for a session in chronological order.
pub async fn get_messages(
    db: &Database,
    session_id: &str,
    actor_id: &str,
) -> Result<Vec<StoredMessage>, TabletalkError> {
    let session_id = session_id.to_string();
    let actor_id = actor_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, actor_id, role, content, created_at
                 FROM messages WHERE session_id = ?1 AND actor_id = ?2
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![session_id, actor_id], |row| {
                Ok(StoredMessage {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    actor_id: row.get(2)?,
                    role: row.get(3)?,
                    content: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, role: &str, content: &str) -> StoredMessage {
        StoredMessage {
            id: id.into(),
            session_id: "s1".into(),
            actor_id: "a1".into(),
            role: role.into(),
            content: content.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn messages_round_trip_in_order() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message("m1", "user", "show me sales"))
            .await
            .unwrap();
        insert_message(&db, &message("m2", "assistant", "here are the sales"))
            .await
            .unwrap();

        let messages = get_messages(&db, "s1", "a1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].content, "here are the sales");
    }

    #[tokio::test]
    async fn messages_are_scoped_to_session_and_actor() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message("m1", "user", "hello"))
            .await
            .unwrap();
        assert!(get_messages(&db, "s1", "other").await.unwrap().is_empty());
        assert!(get_messages(&db, "other", "a1").await.unwrap().is_empty());
    }
}
