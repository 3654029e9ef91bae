//! Session list operations offered to the UI.

use super::trash::SessionTrash;
use chrono::{DateTime, Utc};
use lantern_core::error::{LanternError, Result};
use lantern_core::session::SharedConversationStore;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Mutex;

/// One row of the session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Coordinates the store with the undo buffer.
///
/// # Responsibilities
///
/// - Listing sessions by recency
/// - Switching the active session
/// - Deleting sessions with a time-boxed undo
pub struct ConversationService {
    store: SharedConversationStore,
    trash: Mutex<SessionTrash>,
}

impl ConversationService {
    pub fn new(store: SharedConversationStore, undo_window: Duration) -> Self {
        Self {
            store,
            trash: Mutex::new(SessionTrash::new(undo_window)),
        }
    }

    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let store = self.store.read().await;
        let active = store.active_session_id();
        store
            .sessions_by_recency()
            .into_iter()
            .map(|s| SessionSummary {
                id: s.id.clone(),
                title: s.title.clone(),
                message_count: s.messages.len(),
                updated_at: s.updated_at,
                is_active: active == Some(s.id.as_str()),
            })
            .collect()
    }

    pub async fn switch_session(&self, session_id: &str) -> Result<()> {
        self.store.write().await.set_active_session(session_id)?;
        tracing::info!("[ConversationService] Switched to session {}", session_id);
        Ok(())
    }

    /// Deletes a session; it stays restorable for the undo window.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let removed = self
            .store
            .write()
            .await
            .delete_session(session_id)
            .ok_or_else(|| LanternError::not_found("Session", session_id))?;
        tracing::info!(
            "[ConversationService] Deleted session {} ({} message(s))",
            removed.id,
            removed.messages.len()
        );
        self.trash.lock().await.put(removed);
        Ok(())
    }

    /// Restores a deleted session, or the most recent deletion when
    /// `session_id` is `None`. Returns the restored id.
    pub async fn undo_delete(&self, session_id: Option<&str>) -> Result<String> {
        let session = {
            let mut trash = self.trash.lock().await;
            match session_id {
                Some(id) => trash.take(id),
                None => trash.take_latest(),
            }
        }
        .ok_or_else(|| LanternError::not_found("DeletedSession", session_id.unwrap_or("latest")))?;

        let restored_id = session.id.clone();
        self.store.write().await.restore_session(session);
        tracing::info!("[ConversationService] Restored session {}", restored_id);
        Ok(restored_id)
    }

    pub async fn restorable_sessions(&self) -> Vec<String> {
        self.trash.lock().await.restorable_ids()
    }

    pub async fn dismiss_recovery_notice(&self) {
        self.store.write().await.dismiss_recovery_notice();
    }
}
