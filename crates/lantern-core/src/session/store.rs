//! The canonical in-memory record of sessions and messages.
//!
//! `ConversationStore` is the single owner of mutable conversation state.
//! Every mutation goes through one of its operations, which also raises the
//! dirty flag and bumps a revision counter that subscribers can watch.
//! Clearing the dirty flag is reserved for the persistence flush.

use super::message::{FinishReason, InferenceInfo, Message, MessageMetadata, NewMessage};
use super::model::{PersistedState, Session};
use crate::error::{LanternError, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// Store handle shared between the orchestrator, services and the autosave task.
pub type SharedConversationStore = Arc<RwLock<ConversationStore>>;

#[derive(Debug)]
pub struct ConversationStore {
    /// Sessions in list order (newest first).
    sessions: VecDeque<Session>,
    active_session_id: Option<String>,
    /// Message id -> position inside its session's `messages`.
    message_slots: HashMap<String, usize>,
    is_dirty: bool,
    last_saved_at: Option<DateTime<Utc>>,
    recovered: bool,
    revision: u64,
    changes: watch::Sender<u64>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            sessions: VecDeque::new(),
            active_session_id: None,
            message_slots: HashMap::new(),
            is_dirty: false,
            last_saved_at: None,
            recovered: false,
            revision: 0,
            changes,
        }
    }

    /// Wraps the store for sharing across tasks.
    pub fn into_shared(self) -> SharedConversationStore {
        Arc::new(RwLock::new(self))
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// Creates a session titled after `first_message`, puts it at the head of
    /// the list and makes it active.
    pub fn create_session(&mut self, first_message: &str) -> String {
        let session = Session::new(first_message);
        let session_id = session.id.clone();
        tracing::debug!(
            "[ConversationStore] Created session: id={}, title={}",
            session_id,
            session.title
        );
        self.sessions.push_front(session);
        self.active_session_id = Some(session_id.clone());
        self.record_change();
        session_id
    }

    /// Appends a message to a session and returns its id.
    ///
    /// A caller-supplied id is kept as is; otherwise a new UUID is generated.
    pub fn add_message(&mut self, session_id: &str, message: NewMessage) -> Result<String> {
        let index = self.session_index(session_id)?;
        let message_id = message
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if self.message_slots.contains_key(&message_id) {
            return Err(LanternError::internal(format!(
                "Duplicate message id: {}",
                message_id
            )));
        }

        let session = &mut self.sessions[index];
        let position = session.messages.len();
        session.messages.push(Message {
            id: message_id.clone(),
            role: message.role,
            content: message.content,
            timestamp: Utc::now(),
            metadata: None,
        });
        session.touch();
        self.message_slots.insert(message_id.clone(), position);
        self.record_change();
        Ok(message_id)
    }

    /// Replaces a message's content.
    ///
    /// Called once per streamed increment, so lookup goes through the
    /// message-position index and never scans the history.
    pub fn update_message_content(
        &mut self,
        session_id: &str,
        message_id: &str,
        content: impl Into<String>,
    ) -> Result<()> {
        let (index, position) = self.locate_message(session_id, message_id)?;
        let session = &mut self.sessions[index];
        session.messages[position].content = content.into();
        session.touch();
        self.record_change();
        Ok(())
    }

    /// Attaches inference details to a message.
    ///
    /// A message without metadata is treated as completed, since inference
    /// details only exist for a finished run.
    pub fn set_message_inference_metadata(
        &mut self,
        session_id: &str,
        message_id: &str,
        inference: InferenceInfo,
    ) -> Result<()> {
        let (index, position) = self.locate_message(session_id, message_id)?;
        let session = &mut self.sessions[index];
        session.messages[position]
            .metadata
            .get_or_insert_with(|| MessageMetadata::new(FinishReason::Completed))
            .inference = Some(inference);
        session.touch();
        self.record_change();
        Ok(())
    }

    /// Attaches terminal metadata to a message.
    ///
    /// Inference details already on the message survive unless `metadata`
    /// carries its own.
    pub fn finalize_message(
        &mut self,
        session_id: &str,
        message_id: &str,
        mut metadata: MessageMetadata,
    ) -> Result<()> {
        let (index, position) = self.locate_message(session_id, message_id)?;
        let session = &mut self.sessions[index];
        let message = &mut session.messages[position];
        if metadata.inference.is_none() {
            metadata.inference = message.metadata.take().and_then(|m| m.inference);
        }
        tracing::debug!(
            "[ConversationStore] Finalized message: id={}, reason={}",
            message_id,
            metadata.finish_reason
        );
        message.metadata = Some(metadata);
        session.touch();
        self.record_change();
        Ok(())
    }

    /// Removes a session and returns it so the caller can offer undo.
    ///
    /// When the removed session was active, the session that took its list
    /// position becomes active, then the one before it, then none.
    pub fn delete_session(&mut self, session_id: &str) -> Option<Session> {
        let index = self.position_of(session_id)?;
        let removed = self.sessions.remove(index)?;
        for message in &removed.messages {
            self.message_slots.remove(&message.id);
        }

        if self.active_session_id.as_deref() == Some(session_id) {
            self.active_session_id = self
                .sessions
                .get(index)
                .or_else(|| index.checked_sub(1).and_then(|prev| self.sessions.get(prev)))
                .map(|s| s.id.clone());
            tracing::debug!(
                "[ConversationStore] Active session reassigned after delete: {:?}",
                self.active_session_id
            );
        }

        self.record_change();
        Some(removed)
    }

    /// Re-inserts a previously removed session and re-sorts the list by
    /// `updated_at`, newest first.
    pub fn restore_session(&mut self, session: Session) {
        if let Some(existing) = self.position_of(&session.id) {
            if let Some(stale) = self.sessions.remove(existing) {
                for message in &stale.messages {
                    self.message_slots.remove(&message.id);
                }
            }
        }

        self.index_messages(&session);
        if self.active_session_id.is_none() {
            self.active_session_id = Some(session.id.clone());
        }
        self.sessions.push_back(session);
        self.sessions
            .make_contiguous()
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.record_change();
    }

    /// Makes an existing session the active one.
    pub fn set_active_session(&mut self, session_id: &str) -> Result<()> {
        self.session_index(session_id)?;
        self.active_session_id = Some(session_id.to_string());
        self.record_change();
        Ok(())
    }

    /// Loads persisted state on boot.
    ///
    /// Returns the recovery flag, which is set iff the loaded list is
    /// non-empty. Nothing is repaired here.
    pub fn initialize_sessions(&mut self, state: PersistedState) -> bool {
        self.sessions = state.sessions.into();
        self.active_session_id = state.active_session_id;
        self.message_slots.clear();
        for session in &self.sessions {
            for (position, message) in session.messages.iter().enumerate() {
                self.message_slots.insert(message.id.clone(), position);
            }
        }
        self.recovered = !self.sessions.is_empty();
        self.is_dirty = false;
        tracing::info!(
            "[ConversationStore] Initialized with {} session(s), recovered={}",
            self.sessions.len(),
            self.recovered
        );
        self.recovered
    }

    // ============================================================================
    // Dirty tracking
    // ============================================================================

    pub fn mark_dirty(&mut self) {
        self.record_change();
    }

    /// Clears the dirty flag. Only a successful persistence flush calls this.
    pub fn clear_dirty(&mut self) {
        self.is_dirty = false;
    }

    /// Records a successful flush of the snapshot taken at `revision`.
    ///
    /// The dirty flag is only cleared when nothing changed since that
    /// snapshot; returns whether it was cleared.
    pub fn mark_saved(&mut self, revision: u64, saved_at: DateTime<Utc>) -> bool {
        self.last_saved_at = Some(saved_at);
        if revision == self.revision {
            self.clear_dirty();
            true
        } else {
            false
        }
    }

    pub fn dismiss_recovery_notice(&mut self) {
        self.recovered = false;
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn message(&self, session_id: &str, message_id: &str) -> Option<&Message> {
        let session = self.session(session_id)?;
        match self.message_slots.get(message_id) {
            Some(&position) => session
                .messages
                .get(position)
                .filter(|m| m.id == message_id),
            None => None,
        }
    }

    /// Sessions in list order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// Sessions sorted by `updated_at`, newest first.
    pub fn sessions_by_recency(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.iter().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_session_id
            .as_deref()
            .and_then(|id| self.session(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn was_recovered(&self) -> bool {
        self.recovered
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Copies the durable state together with the revision it reflects.
    pub fn snapshot(&self) -> (u64, PersistedState) {
        let state = PersistedState {
            sessions: self.sessions.iter().cloned().collect(),
            active_session_id: self.active_session_id.clone(),
        };
        (self.revision, state)
    }

    /// Subscribes to the revision counter; it changes on every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn record_change(&mut self) {
        self.is_dirty = true;
        self.revision += 1;
        self.changes.send_replace(self.revision);
    }

    fn position_of(&self, session_id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == session_id)
    }

    fn session_index(&self, session_id: &str) -> Result<usize> {
        self.position_of(session_id)
            .ok_or_else(|| LanternError::not_found("Session", session_id))
    }

    fn locate_message(&mut self, session_id: &str, message_id: &str) -> Result<(usize, usize)> {
        let index = self.session_index(session_id)?;
        let messages = &self.sessions[index].messages;

        if let Some(&position) = self.message_slots.get(message_id) {
            if messages.get(position).is_some_and(|m| m.id == message_id) {
                return Ok((index, position));
            }
        }

        // Slot missing or stale: fall back to a scan and repair the index.
        let position = messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| LanternError::not_found("Message", message_id))?;
        tracing::warn!(
            "[ConversationStore] Repaired message index entry: id={}",
            message_id
        );
        self.message_slots.insert(message_id.to_string(), position);
        Ok((index, position))
    }

    fn index_messages(&mut self, session: &Session) {
        for (position, message) in session.messages.iter().enumerate() {
            self.message_slots.insert(message.id.clone(), position);
        }
    }
}
