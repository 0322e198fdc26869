//! Presence registry holding the single live session per user.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use chathub_core::types::id::UserId;

use crate::connection::SessionHandle;

/// Thread-safe map from user to that user's one active session.
///
/// Every mutation is a single per-key atomic map operation; no store call
/// or await ever happens while a shard lock is held. The `*_then` variants
/// run a non-blocking callback under that same lock, so side effects
/// queued from it are ordered exactly like the map mutations.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    sessions: DashMap<UserId, Arc<SessionHandle>>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `session` for its user, returning the session it replaced.
    pub fn register(&self, session: Arc<SessionHandle>) -> Option<Arc<SessionHandle>> {
        self.register_then(session, || {})
    }

    /// [`register`](Self::register), calling `installed` before the entry
    /// lock is released. `installed` must not block.
    pub fn register_then(
        &self,
        session: Arc<SessionHandle>,
        installed: impl FnOnce(),
    ) -> Option<Arc<SessionHandle>> {
        match self.sessions.entry(session.user_id) {
            Entry::Occupied(mut entry) => {
                let previous = entry.insert(session);
                installed();
                Some(previous)
            }
            Entry::Vacant(entry) => {
                let _guard = entry.insert(session);
                installed();
                None
            }
        }
    }

    /// Current session for a user.
    pub fn lookup(&self, user_id: UserId) -> Option<Arc<SessionHandle>> {
        self.sessions.get(&user_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes the entry for `user_id` only if it still points at `session`.
    ///
    /// Returns whether an entry was removed. A stale session whose entry
    /// was already replaced leaves the newer one untouched.
    pub fn deregister(&self, user_id: UserId, session: &SessionHandle) -> bool {
        self.deregister_then(user_id, session, || {})
    }

    /// [`deregister`](Self::deregister), calling `removed` under the entry
    /// lock only when the entry is removed. `removed` must not block.
    pub fn deregister_then(
        &self,
        user_id: UserId,
        session: &SessionHandle,
        removed: impl FnOnce(),
    ) -> bool {
        match self.sessions.entry(user_id) {
            Entry::Occupied(entry) if entry.get().id == session.id => {
                removed();
                entry.remove();
                true
            }
            _ => false,
        }
    }

    /// Whether the user has a live session.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.sessions.contains_key(&user_id)
    }

    /// Number of users with a live session.
    pub fn online_count(&self) -> usize {
        self.sessions.len()
    }

    /// IDs of every user with a live session.
    pub fn online_user_ids(&self) -> Vec<UserId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Closes every registered session. Entries are left for each
    /// session's own teardown to remove.
    pub fn close_all(&self) -> usize {
        let sessions: Vec<Arc<SessionHandle>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for session in &sessions {
            session.close();
        }
        sessions.len()
    }
}
