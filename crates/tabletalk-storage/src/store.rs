// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store: persisted context checkpoints and conversation messages,
//! keyed by (session_id, actor_id).
//!
//! Checkpoint loading degrades to the empty checkpoint on any failure so a
//! storage hiccup never blocks a conversational turn; the failure is logged.

use std::path::Path;

use tabletalk_core::{ContextCheckpoint, StoredMessage, TabletalkError};
use tabletalk_config::model::StorageConfig;
use tracing::warn;

use crate::database::Database;
use crate::queries;

/// Persistence facade used by the agent.
#[derive(Clone)]
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the store at the configured path, creating it if needed.
    pub async fn open_from_config(config: &StorageConfig) -> Result<Self, TabletalkError> {
        let db = Database::open(Path::new(&config.database_path), config.wal_mode).await?;
        Ok(Self::new(db))
    }

    /// Opens an in-memory store (tests and ephemeral sessions).
    pub async fn open_in_memory() -> Result<Self, TabletalkError> {
        Ok(Self::new(Database::open_in_memory().await?))
    }

    /// Loads the checkpoint for a session.
    ///
    /// Returns the empty checkpoint both when none was saved and when the
    /// lookup fails; a failure is logged but never raised.
    pub async fn load_checkpoint(&self, session_id: &str, actor_id: &str) -> ContextCheckpoint {
        match queries::checkpoints::get_checkpoint(&self.db, session_id, actor_id).await {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => ContextCheckpoint::default(),
            Err(e) => {
                warn!(session_id, actor_id, error = %e, "could not load checkpoint, starting fresh");
                ContextCheckpoint::default()
            }
        }
    }

    /// Saves (or replaces) the checkpoint for a session.
    pub async fn save_checkpoint(
        &self,
        session_id: &str,
        actor_id: &str,
        checkpoint: &ContextCheckpoint,
    ) -> Result<(), TabletalkError> {
        queries::checkpoints::upsert_checkpoint(&self.db, session_id, actor_id, checkpoint).await
    }

    /// Appends one message to the session's conversation.
    pub async fn append_message(
        &self,
        session_id: &str,
        actor_id: &str,
        role: &str,
        content: &str,
    ) -> Result<StoredMessage, TabletalkError> {
        let message = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            actor_id: actor_id.to_string(),
            role: role.to_string(),
            content: content.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        queries::messages::insert_message(&self.db, &message).await?;
        Ok(message)
    }

    /// Loads the session's conversation in chronological order.
    pub async fn load_messages(
        &self,
        session_id: &str,
        actor_id: &str,
    ) -> Result<Vec<StoredMessage>, TabletalkError> {
        queries::messages::get_messages(&self.db, session_id, actor_id).await
    }
}
