//! Named sessions.
//!
//! Applications that run several independent searches (a header search box
//! and a side panel, say) keep them here and look them up by id.

use dashmap::DashMap;
use tracing::debug;

use crate::session::{SearchSession, SessionError};

/// Concurrent map of session id → session handle.
pub struct SessionRegistry<T> {
    sessions: DashMap<String, SearchSession<T>>,
}

impl<T> Default for SessionRegistry<T> {
    fn default() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

impl<T> SessionRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `session` under its own id.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyRegistered`] if the id is taken.
    pub fn register(&self, session: SearchSession<T>) -> Result<(), SessionError> {
        let id = session.id().to_string();
        match self.sessions.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(SessionError::AlreadyRegistered(id)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(session);
                debug!(session = %id, "Session registered");
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<SearchSession<T>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Remove and return a session. Its background tasks stop once the last
    /// handle is dropped.
    pub fn remove(&self, id: &str) -> Option<SearchSession<T>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}
