// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search session engine.
//!
//! The [`SearchSession`] is the orchestrator that ties together all components:
//! - Validation of the raw term
//! - Debounced search and suggestion terms
//! - The FIFO/TTL result cache
//! - Pagination and infinite-scroll cursors
//! - Autocomplete state and keyboard navigation
//!
//! # Request lifecycle
//!
//! ```text
//! Idle → Validating → CacheCheck → CacheHit ──────────────→ Settled
//!                          └─────→ Fetching → Settled | Failed
//! ```
//!
//! Every request that may write results takes a fresh generation number.
//! A completion is applied only if its generation is still the latest, so
//! the visible outcome is always that of the most recently *issued* request.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use search_session::{SearchSession, SearchSessionConfig, InMemoryBackend};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = Arc::new(InMemoryBackend::new(
//!     vec![json!({"title": "Rust in Action"}), json!({"title": "Go in Practice"})],
//!     "title",
//! ));
//! let config = SearchSessionConfig { auto_search: false, ..Default::default() };
//! let session = SearchSession::<serde_json::Value>::new("main", config, backend);
//!
//! session.set_term("rust");
//! session.search(Some("rust")).await;
//!
//! let snapshot = session.snapshot();
//! assert_eq!(snapshot.results.unwrap().data.len(), 1);
//! assert_eq!(snapshot.history, vec!["rust".to_string()]);
//! # }
//! ```

mod types;
mod hooks;
mod driver;
mod search_api;
mod pagination;
mod filter_api;
mod suggestions;

pub use types::{
    Direction, LoadingFlags, SearchError, SearchMetrics, SessionError, SessionSnapshot,
    SuggestionState,
};
pub use hooks::{CacheHitHook, ErrorHook, SessionHooks};
pub use suggestions::navigate;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::SearchBackend;
use crate::cache::{ResultCache, ResultCacheStats};
use crate::config::{PaginationMode, SearchSessionConfig};
use crate::debounce::Debouncer;
use crate::filters::{default_filters, FilterSet};
use crate::results::ResultSet;
use crate::validation::validate;

use types::LoadingFlag;

/// Most recent distinct terms kept in the history
pub const HISTORY_LIMIT: usize = 10;

/// Mutable session state. Guarded by one lock, never held across `.await`.
pub(crate) struct SessionState<T> {
    pub(crate) term: String,
    pub(crate) filters: FilterSet,
    pub(crate) page: u32,
    pub(crate) cursor: Option<String>,
    pub(crate) results: Option<ResultSet<T>>,
    /// Term that produced `results`; load-more continues this query
    pub(crate) results_term: Option<String>,
    pub(crate) error: Option<SearchError>,
    pub(crate) loading: LoadingFlags,
    pub(crate) suggestions: SuggestionState,
    pub(crate) history: Vec<String>,
    pub(crate) metrics: SearchMetrics,
}

impl<T> SessionState<T> {
    fn new(filters: FilterSet) -> Self {
        Self {
            term: String::new(),
            filters,
            page: 1,
            cursor: None,
            results: None,
            results_term: None,
            error: None,
            loading: LoadingFlags {
                initial: true,
                ..Default::default()
            },
            suggestions: SuggestionState::default(),
            history: Vec::new(),
            metrics: SearchMetrics::default(),
        }
    }

    /// The result set's meaning changed: go back to the first page / no cursor.
    pub(crate) fn reset_position(&mut self, mode: PaginationMode) {
        match mode {
            PaginationMode::Pagination => self.page = 1,
            PaginationMode::Infinite => self.cursor = None,
        }
    }

    /// Push `term` to the front of the history, de-duplicated and capped.
    pub(crate) fn remember(&mut self, term: &str) {
        self.history.retain(|t| t != term);
        self.history.insert(0, term.to_string());
        self.history.truncate(HISTORY_LIMIT);
    }
}

pub(crate) struct Shared<T> {
    pub(crate) id: String,
    /// Immutable config value; `update_config` swaps the Arc, never mutates in place
    pub(crate) config: RwLock<Arc<SearchSessionConfig>>,
    pub(crate) backend: Arc<dyn SearchBackend<T>>,
    pub(crate) hooks: SessionHooks,
    pub(crate) state: RwLock<SessionState<T>>,
    pub(crate) cache: ResultCache<ResultSet<T>>,
    pub(crate) term_debouncer: Debouncer<String>,
    pub(crate) suggestion_debouncer: Debouncer<String>,
    /// Latest issued request that may write `results`/`error`
    pub(crate) search_generation: AtomicU64,
    pub(crate) suggestion_generation: AtomicU64,
    pub(crate) refresh_generation: AtomicU64,
    pub(crate) snapshot_tx: watch::Sender<SessionSnapshot<T>>,
    pub(crate) driver: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.driver.get_mut().take() {
            handle.abort();
        }
    }
}

/// Handle to one search session. Cheap to clone; all clones share state.
pub struct SearchSession<T> {
    pub(crate) shared: Arc<Shared<T>>,
}

impl<T> Clone for SearchSession<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for SearchSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("id", &self.shared.id)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SearchSession`].
pub struct SearchSessionBuilder<T> {
    id: String,
    backend: Arc<dyn SearchBackend<T>>,
    config: SearchSessionConfig,
    hooks: SessionHooks,
}

impl<T> SearchSessionBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn config(mut self, config: SearchSessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: SessionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Create the session and start its background driver.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> SearchSession<T> {
        SearchSession::assemble(self.id, self.config, self.backend, self.hooks)
    }
}

impl<T> SearchSession<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a session with default hooks.
    ///
    /// Must be called from within a Tokio runtime: the session spawns a
    /// driver task that reacts to debounced terms.
    pub fn new(
        id: impl Into<String>,
        config: SearchSessionConfig,
        backend: Arc<dyn SearchBackend<T>>,
    ) -> Self {
        Self::assemble(id.into(), config, backend, SessionHooks::default())
    }

    pub fn builder(id: impl Into<String>, backend: Arc<dyn SearchBackend<T>>) -> SearchSessionBuilder<T> {
        SearchSessionBuilder {
            id: id.into(),
            backend,
            config: SearchSessionConfig::default(),
            hooks: SessionHooks::default(),
        }
    }

    fn assemble(
        id: String,
        config: SearchSessionConfig,
        backend: Arc<dyn SearchBackend<T>>,
        hooks: SessionHooks,
    ) -> Self {
        let state = SessionState::new(default_filters(&config.filter_definitions));
        let cache = ResultCache::new(config.cache_size, config.cache_ttl());
        let term_debouncer = Debouncer::new(String::new(), config.debounce());
        let suggestion_debouncer = Debouncer::new(String::new(), config.suggestion_debounce());
        let term_rx = term_debouncer.subscribe();
        let suggestion_rx = suggestion_debouncer.subscribe();

        let placeholder = SessionSnapshot {
            session_id: id.clone(),
            term: String::new(),
            debounced_term: String::new(),
            filters: state.filters.clone(),
            page: 1,
            cursor: None,
            results: None,
            error: None,
            loading: state.loading,
            suggestions: SuggestionState::default(),
            history: Vec::new(),
            metrics: SearchMetrics::default(),
            validation_errors: Vec::new(),
            total_pages: 0,
            has_next_page: false,
            has_prev_page: false,
        };
        let (snapshot_tx, _) = watch::channel(placeholder);

        info!(session = %id, mode = %config.mode, caching = config.enable_caching, "Search session created");

        let session = Self {
            shared: Arc::new(Shared {
                id,
                config: RwLock::new(Arc::new(config)),
                backend,
                hooks,
                state: RwLock::new(state),
                cache,
                term_debouncer,
                suggestion_debouncer,
                search_generation: AtomicU64::new(0),
                suggestion_generation: AtomicU64::new(0),
                refresh_generation: AtomicU64::new(0),
                snapshot_tx,
                driver: Mutex::new(None),
            }),
        };

        let handle = driver::spawn(Arc::downgrade(&session.shared), term_rx, suggestion_rx);
        *session.shared.driver.lock() = Some(handle);
        session.publish();
        session
    }

    // --- Accessors ---

    #[must_use]
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Current configuration. The returned value never changes; a later
    /// [`update_config`](Self::update_config) swaps in a new one.
    #[must_use]
    pub fn config(&self) -> Arc<SearchSessionConfig> {
        Arc::clone(&self.shared.config.read())
    }

    #[must_use]
    pub fn term(&self) -> String {
        self.shared.state.read().term.clone()
    }

    /// Last term that stayed unchanged for the debounce delay.
    #[must_use]
    pub fn debounced_term(&self) -> String {
        self.shared.term_debouncer.latest()
    }

    #[must_use]
    pub fn results(&self) -> Option<ResultSet<T>> {
        self.shared.state.read().results.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<SearchError> {
        self.shared.state.read().error.clone()
    }

    #[must_use]
    pub fn loading(&self) -> LoadingFlags {
        self.shared.state.read().loading
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.shared.state.read().history.clone()
    }

    #[must_use]
    pub fn metrics(&self) -> SearchMetrics {
        self.shared.state.read().metrics
    }

    #[must_use]
    pub fn cursor(&self) -> Option<String> {
        self.shared.state.read().cursor.clone()
    }

    #[must_use]
    pub fn cache_stats(&self) -> ResultCacheStats {
        self.shared.cache.stats()
    }

    /// Clear every cached result of this session.
    pub fn clear_cache(&self) {
        self.shared.cache.clear();
        debug!(session = %self.shared.id, "Result cache cleared");
    }

    /// Validation messages for the current raw term.
    #[must_use]
    pub fn validation_errors(&self) -> Vec<String> {
        let config = self.config();
        let term = self.term();
        validate(&term, &config.validation_rules, config.min_length, config.max_length)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Full view of the session including derived values.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot<T> {
        let config = self.config();
        let debounced_term = self.shared.term_debouncer.latest();
        let state = self.shared.state.read();

        let total_pages = pagination::total_pages(state.results.as_ref(), &config);
        let has_next_page = pagination::has_next_page(state.page, state.results.as_ref(), &config);

        SessionSnapshot {
            session_id: self.shared.id.clone(),
            term: state.term.clone(),
            debounced_term,
            filters: state.filters.clone(),
            page: state.page,
            cursor: state.cursor.clone(),
            results: state.results.clone(),
            error: state.error.clone(),
            loading: state.loading,
            suggestions: state.suggestions.clone(),
            history: state.history.clone(),
            metrics: state.metrics,
            validation_errors: validate(
                &state.term,
                &config.validation_rules,
                config.min_length,
                config.max_length,
            ),
            total_pages,
            has_next_page,
            has_prev_page: state.page > 1,
        }
    }

    /// Watch the session. A new snapshot is published after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot<T>> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Recompute and broadcast the snapshot.
    pub(crate) fn publish(&self) {
        self.shared.snapshot_tx.send_replace(self.snapshot());
    }

    // --- Mutations ---

    /// Replace the raw term.
    ///
    /// Resets the page (or cursor), clears the suggestion highlight and feeds
    /// both debouncers. Does not fetch; a fetch follows once the debounced
    /// term settles (with `auto_search`) or on an explicit [`search`](Self::search).
    pub fn set_term(&self, term: impl Into<String>) {
        let term = term.into();
        let config = self.config();
        {
            let mut state = self.shared.state.write();
            state.term = term.clone();
            state.reset_position(config.mode);
            state.suggestions.selected_index = None;
        }

        if config.enable_suggestions {
            self.shared.suggestion_debouncer.push(term.clone());
        }
        self.shared.term_debouncer.push(term);
        self.publish();
    }

    /// Return term, filters, position, results, error and suggestions to
    /// their initial values. Cache, history and metrics survive.
    /// Completions of requests issued before the reset are discarded.
    pub fn reset(&self) {
        let config = self.config();
        {
            let mut state = self.shared.state.write();
            self.shared.search_generation.fetch_add(1, Ordering::AcqRel);
            self.shared.suggestion_generation.fetch_add(1, Ordering::AcqRel);

            state.term.clear();
            state.filters = default_filters(&config.filter_definitions);
            state.page = 1;
            state.cursor = None;
            state.results = None;
            state.results_term = None;
            state.error = None;
            state.suggestions = SuggestionState::default();
            state.loading.set(LoadingFlag::Searching, false);
            state.loading.set(LoadingFlag::LoadingMore, false);
            state.loading.set(LoadingFlag::Suggestions, false);
        }

        self.shared.term_debouncer.reset(String::new());
        self.shared.suggestion_debouncer.reset(String::new());
        info!(session = %self.shared.id, "Search session reset");
        self.publish();
    }

    /// Swap in a new configuration.
    ///
    /// Debounce delays apply to the next keystroke; cache limits apply
    /// immediately (shrinking evicts oldest entries).
    pub fn update_config(&self, config: SearchSessionConfig) {
        self.shared.term_debouncer.set_delay(config.debounce());
        self.shared.suggestion_debouncer.set_delay(config.suggestion_debounce());
        self.shared.cache.reconfigure(config.cache_size, config.cache_ttl());
        if !config.enable_caching {
            self.shared.cache.clear();
        }

        info!(
            session = %self.shared.id,
            debounce_ms = config.debounce_ms,
            cache_size = config.cache_size,
            "Config updated"
        );
        *self.shared.config.write() = Arc::new(config);
        self.publish();
    }

    /// Stop the background driver. Explicit operations keep working;
    /// debounced terms no longer trigger searches or suggestions.
    pub fn close(&self) {
        self.shared.term_debouncer.cancel();
        self.shared.suggestion_debouncer.cancel();
        if let Some(handle) = self.shared.driver.lock().take() {
            handle.abort();
        }
        debug!(session = %self.shared.id, "Search session closed");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;
    use crate::backend::InMemoryBackend;

    fn backend() -> Arc<InMemoryBackend> {
        Arc::new(InMemoryBackend::new(
            vec![json!({"title": "Rust in Action"}), json!({"title": "Go in Practice"})],
            "title",
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_snapshot() {
        let session = SearchSession::<Value>::new("main", SearchSessionConfig::default(), backend());
        let snap = session.snapshot();

        assert_eq!(snap.session_id, "main");
        assert_eq!(snap.page, 1);
        assert!(snap.loading.initial);
        assert!(!snap.is_loading());
        assert!(snap.results.is_none());
        assert!(!snap.is_empty());
        assert!(snap.is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_search_after_debounce() {
        let backend = backend();
        let session: SearchSession<Value> =
            SearchSession::<Value>::new("main", SearchSessionConfig::default(), backend.clone());

        session.set_term("r");
        session.set_term("ru");
        session.set_term("rust");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(backend.search_calls(), 0);
        assert_eq!(session.debounced_term(), "");

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(session.debounced_term(), "rust");
        assert_eq!(backend.search_calls(), 1);
        assert_eq!(session.results().map(|r| r.len()), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_mode_never_auto_searches() {
        let backend = backend();
        let config = SearchSessionConfig {
            auto_search: false,
            ..Default::default()
        };
        let session = SearchSession::<Value>::new("main", config, backend.clone());

        session.set_term("rust");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(session.debounced_term(), "rust");
        assert_eq!(backend.search_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_sees_mutations() {
        let config = SearchSessionConfig {
            auto_search: false,
            ..Default::default()
        };
        let session = SearchSession::<Value>::new("main", config, backend());
        let mut rx = session.subscribe();

        session.set_term("go");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().term, "go");

        session.search(Some("go")).await;
        assert_eq!(rx.borrow_and_update().results.as_ref().map(|r| r.len()), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_keeps_cache_history_metrics() {
        let config = SearchSessionConfig {
            auto_search: false,
            ..Default::default()
        };
        let session = SearchSession::<Value>::new("main", config, backend());
        session.set_term("rust");
        session.search(Some("rust")).await;
        session.set_filter("lang", "en");

        session.reset();

        let snap = session.snapshot();
        assert_eq!(snap.term, "");
        assert_eq!(snap.debounced_term, "");
        assert!(snap.filters.is_empty());
        assert!(snap.results.is_none());
        assert!(snap.error.is_none());
        assert_eq!(snap.history, vec!["rust".to_string()]);
        assert_eq!(snap.metrics.total_searches, 1);
        assert_eq!(session.cache_stats().size, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_dedup_and_cap() {
        let config = SearchSessionConfig {
            auto_search: false,
            enable_caching: false,
            ..Default::default()
        };
        let session = SearchSession::<Value>::new("main", config, backend());
        for i in 0..12 {
            session.search(Some(&format!("term{}", i))).await;
        }
        session.search(Some("term5")).await;

        let history = session.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], "term5");
        assert_eq!(history.iter().filter(|t| *t == "term5").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_config_swaps_value() {
        let session = SearchSession::<Value>::new("main", SearchSessionConfig::default(), backend());
        let before = session.config();

        session.update_config(SearchSessionConfig {
            debounce_ms: 50,
            cache_size: 1,
            ..Default::default()
        });

        assert_eq!(before.debounce_ms, 300);
        assert_eq!(session.config().debounce_ms, 50);
        assert_eq!(session.shared.term_debouncer.delay(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_term_resets_page() {
        let docs: Vec<Value> = (0..60).map(|i| json!({"title": format!("doc {}", i)})).collect();
        let config = SearchSessionConfig {
            auto_search: false,
            ..Default::default()
        };
        let session: SearchSession<Value> =
            SearchSession::<Value>::new("main", config, Arc::new(InMemoryBackend::new(docs, "title")));
        session.search(Some("doc")).await;
        session.set_page(3);

        session.set_term("doc 1");
        assert_eq!(session.page(), 1);
    }
}
