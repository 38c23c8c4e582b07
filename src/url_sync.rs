// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Mirror a session's term, page and filters into a key-value store.
//!
//! For a session with id `main` the store keys are `main_search`,
//! `main_page` and `main_filters` (filters as a JSON object). Defaults are
//! never written: an empty term, page 1 and an empty filter set remove
//! their key instead.
//!
//! On attach, values already present in the store are applied to the
//! session once, so a shared link restores the view. Malformed values are
//! skipped.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::filters::FilterSet;
use crate::metrics;
use crate::session::{SearchSession, SessionError, SessionSnapshot};

/// Minimal string store (URL query, local storage, ...).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    /// `None` removes the key.
    fn set(&self, name: &str, value: Option<&str>);
}

/// In-process [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|v| v.value().clone())
    }

    fn set(&self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.entries.insert(name.to_string(), value.to_string());
            }
            None => {
                self.entries.remove(name);
            }
        }
    }
}

/// Store key names for one session.
#[derive(Debug, Clone)]
struct StoreKeys {
    search: String,
    page: String,
    filters: String,
}

impl StoreKeys {
    fn new(session_id: &str) -> Self {
        Self {
            search: format!("{}_search", session_id),
            page: format!("{}_page", session_id),
            filters: format!("{}_filters", session_id),
        }
    }
}

/// The slice of session state that is mirrored.
#[derive(Debug, Clone, PartialEq)]
struct Mirrored {
    term: String,
    page: u32,
    filters: FilterSet,
}

impl Mirrored {
    fn of<T>(snapshot: &SessionSnapshot<T>) -> Self {
        Self {
            term: snapshot.term.clone(),
            page: snapshot.page,
            filters: snapshot.filters.clone(),
        }
    }
}

/// Live link between a session and a store. Dropping it stops mirroring.
pub struct UrlSync {
    keys: StoreKeys,
    store: Arc<dyn KeyValueStore>,
    watcher: JoinHandle<()>,
}

impl std::fmt::Debug for UrlSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSync")
            .field("keys", &self.keys)
            .field("active", &!self.watcher.is_finished())
            .finish()
    }
}

impl UrlSync {
    /// Restore state from `store` into `session`, then keep `store` updated.
    ///
    /// # Errors
    ///
    /// [`SessionError::UrlSyncDisabled`] when the session was configured
    /// without `enable_url_sync`.
    pub fn attach<T>(session: &SearchSession<T>, store: Arc<dyn KeyValueStore>) -> Result<Self, SessionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !session.config().enable_url_sync {
            return Err(SessionError::UrlSyncDisabled(session.id().to_string()));
        }

        let keys = StoreKeys::new(session.id());
        import(session, &keys, store.as_ref());

        let mut rx = session.subscribe();
        let mut last = Mirrored::of(&rx.borrow_and_update());
        export(store.as_ref(), &keys, None, &last);

        let watcher = {
            let store = Arc::clone(&store);
            let keys = keys.clone();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let next = Mirrored::of(&rx.borrow_and_update());
                    if next != last {
                        export(store.as_ref(), &keys, Some(&last), &next);
                        last = next;
                    }
                }
            })
        };

        debug!(session = %session.id(), "URL sync attached");
        Ok(Self { keys, store, watcher })
    }

    /// Current term stored for the session, if any.
    #[must_use]
    pub fn stored_term(&self) -> Option<String> {
        self.store.get(&self.keys.search)
    }

    /// Stop mirroring. Stored values are left in place.
    pub fn detach(self) {}
}

impl Drop for UrlSync {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

fn import<T>(session: &SearchSession<T>, keys: &StoreKeys, store: &dyn KeyValueStore)
where
    T: Clone + Send + Sync + 'static,
{
    // Term and filters both reset the page, so the page goes last
    if let Some(term) = store.get(&keys.search) {
        if term != session.term() {
            session.set_term(term);
            metrics::record_url_sync("import");
        }
    }

    if let Some(raw) = store.get(&keys.filters) {
        match serde_json::from_str::<FilterSet>(&raw) {
            Ok(filters) => {
                if filters != session.filters() {
                    session.set_filters(filters);
                    metrics::record_url_sync("import");
                }
            }
            Err(e) => {
                warn!(key = %keys.filters, error = %e, "Ignoring malformed stored filters");
                metrics::record_url_sync("malformed");
            }
        }
    }

    if let Some(raw) = store.get(&keys.page) {
        match raw.trim().parse::<u32>() {
            Ok(page) if page >= 1 => {
                if page != session.page() {
                    session.set_page(i64::from(page));
                    metrics::record_url_sync("import");
                }
            }
            _ => {
                warn!(key = %keys.page, value = %raw, "Ignoring malformed stored page");
                metrics::record_url_sync("malformed");
            }
        }
    }
}

/// Write the fields of `next` that differ from `prev` (all of them when `prev` is `None`).
fn export(store: &dyn KeyValueStore, keys: &StoreKeys, prev: Option<&Mirrored>, next: &Mirrored) {
    if prev.map_or(true, |p| p.term != next.term) {
        let term = next.term.as_str();
        store.set(&keys.search, (!term.is_empty()).then_some(term));
    }

    if prev.map_or(true, |p| p.page != next.page) {
        let page = next.page.to_string();
        store.set(&keys.page, (next.page > 1).then_some(page.as_str()));
    }

    if prev.map_or(true, |p| p.filters != next.filters) {
        if next.filters.is_empty() {
            store.set(&keys.filters, None);
        } else {
            match serde_json::to_string(&next.filters) {
                Ok(json) => store.set(&keys.filters, Some(&json)),
                Err(e) => warn!(error = %e, "Could not encode filters for URL sync"),
            }
        }
    }

    metrics::record_url_sync("export");
}
