//! Search, load-more, retry and refresh.
//!
//! All of these share one generation counter: whichever of them was issued
//! last is the only one allowed to write `results` and `error`.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::backend::{LoadMoreRequest, SearchRequest};
use crate::config::PaginationMode;
use crate::key::{build_key, KeyParts};
use crate::metrics::{self, LatencyTimer};
use crate::validation::validate;

use super::types::{LoadingFlag, SearchError};
use super::{SearchSession, SessionState, Shared};

/// Which generation counter a loading flag is tied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counter {
    Search,
    Suggestion,
    Refresh,
}

impl<T> Shared<T> {
    pub(crate) fn counter(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::Search => &self.search_generation,
            Counter::Suggestion => &self.suggestion_generation,
            Counter::Refresh => &self.refresh_generation,
        }
    }

    pub(crate) fn is_current(&self, counter: Counter, generation: u64) -> bool {
        self.counter(counter).load(Ordering::Acquire) == generation
    }

    /// Issue a new result-writing generation.
    ///
    /// Must be called with the state lock held. Flags owned by superseded
    /// requests are cleared here since their guards will no longer touch them.
    pub(crate) fn begin_search(&self, state: &mut SessionState<T>) -> u64 {
        state.loading.set(LoadingFlag::Searching, false);
        state.loading.set(LoadingFlag::LoadingMore, false);
        self.search_generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Clears a loading flag when the owning request ends, however it ends.
///
/// The flag is only cleared while `generation` is still current; a newer
/// request owns it otherwise.
pub(crate) struct LoadingGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    session: SearchSession<T>,
    flag: LoadingFlag,
    counter: Counter,
    generation: u64,
}

impl<T> LoadingGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(session: &SearchSession<T>, flag: LoadingFlag, counter: Counter, generation: u64) -> Self {
        Self {
            session: session.clone(),
            flag,
            counter,
            generation,
        }
    }
}

impl<T> Drop for LoadingGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let shared = &self.session.shared;
        {
            let mut state = shared.state.write();
            if shared.is_current(self.counter, self.generation) {
                state.loading.set(self.flag, false);
            }
        }
        self.session.publish();
    }
}

impl<T> SearchSession<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run a search for `term_override`, or for the debounced term when `None`.
    ///
    /// Does nothing when the trimmed term is empty or fails validation.
    /// Failures are stored in the session's `error` field rather than returned.
    #[tracing::instrument(skip(self), fields(session = %self.shared.id))]
    pub async fn search(&self, term_override: Option<&str>) {
        let config = self.config();
        let term = match term_override {
            Some(term) => term.trim().to_string(),
            None => self.shared.term_debouncer.latest().trim().to_string(),
        };
        if term.is_empty() {
            return;
        }

        let problems = validate(&term, &config.validation_rules, config.min_length, config.max_length);
        if !problems.is_empty() {
            debug!(term = %term, problems = problems.len(), "Search blocked by validation");
            metrics::record_validation_block();
            return;
        }

        let (generation, request, key) = {
            let mut state = self.shared.state.write();
            let generation = self.shared.begin_search(&mut state);
            // Results are replaced, so infinite mode restarts from the first page
            if config.mode == PaginationMode::Infinite {
                state.cursor = None;
            }
            let request = SearchRequest {
                term: term.clone(),
                filters: state.filters.clone(),
                search_mode: config.search_mode,
                mode: config.mode,
                page: state.page,
                page_size: config.page_size,
                cursor: state.cursor.clone(),
            };
            let key = build_key(KeyParts {
                session_id: &self.shared.id,
                mode: config.mode,
                term: &term,
                filters: &request.filters,
                page: request.page,
                page_size: request.page_size,
                cursor: request.cursor.as_deref(),
            });
            (generation, request, key)
        };

        if config.enable_caching {
            if let Some(cached) = self.shared.cache.get(&key) {
                let applied = {
                    let mut state = self.shared.state.write();
                    let current = self.shared.is_current(Counter::Search, generation);
                    if current {
                        state.results = Some(cached);
                        state.results_term = Some(term.clone());
                        state.error = None;
                        state.loading.initial = false;
                    }
                    current
                };
                if applied {
                    debug!(key = %key, "Serving search from cache");
                    self.shared.hooks.cache_hit(&key);
                    metrics::record_operation("search", "cache_hit");
                    self.publish();
                }
                return;
            }
        }

        {
            let mut state = self.shared.state.write();
            state.loading.set(LoadingFlag::Searching, true);
            state.error = None;
        }
        self.publish();

        let _loading = LoadingGuard::new(self, LoadingFlag::Searching, Counter::Search, generation);
        let timer = LatencyTimer::new("search");
        let outcome = self.shared.backend.search(&request).await;
        let latency = timer.elapsed();
        drop(timer);

        match outcome {
            Ok(results) => {
                let applied = {
                    let mut state = self.shared.state.write();
                    let current = self.shared.is_current(Counter::Search, generation);
                    if current {
                        if config.enable_caching {
                            self.shared.cache.insert(key.clone(), results.clone());
                        }
                        debug!(count = results.len(), total = ?results.total, "Search settled");
                        state.results = Some(results);
                        state.results_term = Some(term.clone());
                        state.loading.initial = false;
                        state.remember(&term);
                        state.metrics.record(latency.as_secs_f64() * 1000.0);
                    }
                    current
                };
                if applied {
                    metrics::record_operation("search", "success");
                } else {
                    self.discard_stale("search", generation);
                }
            }
            Err(err) => {
                let error = SearchError::from_fetch(err);
                let applied = {
                    let mut state = self.shared.state.write();
                    let current = self.shared.is_current(Counter::Search, generation);
                    if current {
                        state.error = Some(error.clone());
                        state.loading.initial = false;
                    }
                    current
                };
                if applied {
                    warn!(term = %term, kind = %error.kind, error = %error.message, "Search failed");
                    self.shared.hooks.error(&error);
                    metrics::record_error("search", error.kind.as_str());
                    metrics::record_operation("search", "error");
                } else {
                    self.discard_stale("search", generation);
                }
            }
        }
    }

    /// Append the next page of results (infinite mode).
    ///
    /// No-op outside infinite mode, when the backend reported no more data,
    /// or while a search or another load-more is in flight.
    #[tracing::instrument(skip(self), fields(session = %self.shared.id))]
    pub async fn load_more(&self) {
        let config = self.config();
        if config.mode != PaginationMode::Infinite {
            return;
        }

        let prepared = {
            let mut state = self.shared.state.write();
            let busy = state.loading.searching || state.loading.loading_more;
            let cursor = match &state.results {
                Some(results) if results.has_more == Some(true) && !busy => Some(results.next_cursor.clone()),
                _ => None,
            };
            cursor.map(|cursor| {
                let term = state
                    .results_term
                    .clone()
                    .unwrap_or_else(|| self.shared.term_debouncer.latest().trim().to_string());
                let request = LoadMoreRequest {
                    term,
                    filters: state.filters.clone(),
                    search_mode: config.search_mode,
                    page_size: config.page_size,
                    cursor,
                };
                let generation = self.shared.begin_search(&mut state);
                state.loading.set(LoadingFlag::LoadingMore, true);
                (generation, request)
            })
        };
        let Some((generation, request)) = prepared else {
            return;
        };
        self.publish();

        let _loading = LoadingGuard::new(self, LoadingFlag::LoadingMore, Counter::Search, generation);
        let outcome = {
            let _timer = LatencyTimer::new("load_more");
            self.shared.backend.load_more(&request).await
        };

        match outcome {
            Ok(page) => {
                let applied = {
                    let mut state = self.shared.state.write();
                    let current = self.shared.is_current(Counter::Search, generation);
                    if current {
                        let mut merged = state.results.take().unwrap_or_default();
                        merged.append(page);
                        if let Some(next) = &merged.next_cursor {
                            state.cursor = Some(next.clone());
                        }
                        if config.enable_caching {
                            let key = build_key(KeyParts {
                                session_id: &self.shared.id,
                                mode: config.mode,
                                term: &request.term,
                                filters: &state.filters,
                                page: state.page,
                                page_size: config.page_size,
                                cursor: state.cursor.as_deref(),
                            });
                            self.shared.cache.insert(key, merged.clone());
                        }
                        debug!(count = merged.len(), has_more = ?merged.has_more, "Loaded more results");
                        state.results = Some(merged);
                    }
                    current
                };
                if applied {
                    metrics::record_operation("load_more", "success");
                } else {
                    self.discard_stale("load_more", generation);
                }
            }
            Err(err) => {
                let error = SearchError::from_fetch(err);
                let applied = {
                    let mut state = self.shared.state.write();
                    let current = self.shared.is_current(Counter::Search, generation);
                    if current {
                        state.error = Some(error.clone());
                    }
                    current
                };
                if applied {
                    warn!(kind = %error.kind, error = %error.message, "Load more failed");
                    self.shared.hooks.error(&error);
                    metrics::record_error("load_more", error.kind.as_str());
                    metrics::record_operation("load_more", "error");
                } else {
                    self.discard_stale("load_more", generation);
                }
            }
        }
    }

    /// Clear the error and search the debounced term again.
    pub async fn retry_search(&self) {
        self.shared.state.write().error = None;
        self.publish();
        self.search(None).await;
    }

    /// Drop every cached result and search the debounced term again.
    ///
    /// `loading.refreshing` stays set until the search settles.
    #[tracing::instrument(skip(self), fields(session = %self.shared.id))]
    pub async fn refresh(&self) {
        let generation = {
            let mut state = self.shared.state.write();
            state.loading.set(LoadingFlag::Refreshing, true);
            self.shared.refresh_generation.fetch_add(1, Ordering::AcqRel) + 1
        };
        self.shared.cache.clear();
        self.publish();

        let _refreshing = LoadingGuard::new(self, LoadingFlag::Refreshing, Counter::Refresh, generation);
        self.search(None).await;
    }

    fn discard_stale(&self, operation: &'static str, generation: u64) {
        debug!(
            operation,
            generation,
            latest = self.shared.search_generation.load(Ordering::Acquire),
            "Discarding stale response"
        );
        metrics::record_operation(operation, "stale");
        metrics::record_stale_response(operation);
    }
}
