//! Time-boxed holding area for deleted sessions.

use lantern_core::session::Session;
use std::time::Duration;
use tokio::time::Instant;

/// Default window during which a deletion can be undone.
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct TrashEntry {
    session: Session,
    deleted_at: Instant,
}

/// Keeps deleted sessions around for the undo window.
///
/// Entries are ordered oldest deletion first. Expired entries are dropped
/// lazily on access.
#[derive(Debug)]
pub struct SessionTrash {
    entries: Vec<TrashEntry>,
    window: Duration,
}

impl Default for SessionTrash {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}

impl SessionTrash {
    pub fn new(window: Duration) -> Self {
        Self {
            entries: Vec::new(),
            window,
        }
    }

    pub fn put(&mut self, session: Session) {
        self.purge_expired();
        self.entries.retain(|e| e.session.id != session.id);
        self.entries.push(TrashEntry {
            session,
            deleted_at: Instant::now(),
        });
    }

    /// Takes a specific session back out, if still within the window.
    pub fn take(&mut self, session_id: &str) -> Option<Session> {
        self.purge_expired();
        let index = self
            .entries
            .iter()
            .position(|e| e.session.id == session_id)?;
        Some(self.entries.remove(index).session)
    }

    /// Takes the most recently deleted session back out.
    pub fn take_latest(&mut self) -> Option<Session> {
        self.purge_expired();
        self.entries.pop().map(|e| e.session)
    }

    /// Ids of sessions that can still be restored, oldest deletion first.
    pub fn restorable_ids(&mut self) -> Vec<String> {
        self.purge_expired();
        self.entries.iter().map(|e| e.session.id.clone()).collect()
    }

    fn purge_expired(&mut self) {
        let window = self.window;
        let before = self.entries.len();
        self.entries.retain(|e| e.deleted_at.elapsed() < window);
        let purged = before - self.entries.len();
        if purged > 0 {
            tracing::debug!("[SessionTrash] Purged {} expired session(s)", purged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_restore_within_window() {
        let mut trash = SessionTrash::default();
        let session = Session::new("keep me");
        let id = session.id.clone();
        trash.put(session);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(trash.take(&id).map(|s| s.id), Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_gone() {
        let mut trash = SessionTrash::new(Duration::from_secs(5));
        trash.put(Session::new("old"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(trash.take_latest().is_none());
        assert!(trash.restorable_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_latest_is_lifo() {
        let mut trash = SessionTrash::default();
        let first = Session::new("first");
        let second = Session::new("second");
        let second_id = second.id.clone();
        trash.put(first);
        trash.put(second);

        assert_eq!(trash.take_latest().map(|s| s.id), Some(second_id));
        assert_eq!(trash.restorable_ids().len(), 1);
    }
}
