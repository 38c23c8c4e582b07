// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Autocomplete.
//!
//! Suggestions are fetched for the suggestion-debounced term and written only
//! by the latest issued fetch. Failures are swallowed: the list simply
//! disappears, the session `error` is never touched.

use std::sync::atomic::Ordering;

use tracing::debug;

use crate::metrics::{self, LatencyTimer};
use crate::results::Suggestion;

use super::search_api::{Counter, LoadingGuard};
use super::types::{Direction, LoadingFlag, SuggestionState};
use super::SearchSession;

/// Move the highlight one step, wrapping around at both ends.
///
/// Returns the current selection unchanged when the list is hidden or empty.
///
/// ```
/// use search_session::session::{navigate, Direction};
///
/// assert_eq!(navigate(None, 3, true, Direction::Up), Some(2));
/// assert_eq!(navigate(Some(2), 3, true, Direction::Down), Some(0));
/// assert_eq!(navigate(Some(1), 3, false, Direction::Down), Some(1));
/// ```
#[must_use]
pub fn navigate(selected: Option<usize>, len: usize, visible: bool, direction: Direction) -> Option<usize> {
    if !visible || len == 0 {
        return selected;
    }
    let next = match (direction, selected) {
        (Direction::Down, None) => 0,
        (Direction::Up, None) => len - 1,
        (Direction::Down, Some(i)) => (i + 1) % len,
        (Direction::Up, Some(0)) => len - 1,
        (Direction::Up, Some(i)) => (i - 1).min(len - 1),
    };
    Some(next)
}

impl SuggestionState {
    /// Replace the items with a fresh fetch result.
    pub(crate) fn apply(&mut self, mut items: Vec<Suggestion>, max: usize) {
        items.truncate(max);
        self.visible = !items.is_empty();
        self.items = items;
        self.selected_index = None;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn hide(&mut self) {
        self.visible = false;
        self.selected_index = None;
    }
}

impl<T> SearchSession<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn suggestions(&self) -> SuggestionState {
        self.shared.state.read().suggestions.clone()
    }

    /// The highlighted suggestion, if any.
    #[must_use]
    pub fn highlighted_suggestion(&self) -> Option<Suggestion> {
        let state = self.shared.state.read();
        let suggestions = &state.suggestions;
        suggestions
            .selected_index
            .and_then(|i| suggestions.items.get(i))
            .cloned()
    }

    pub fn navigate_suggestions(&self, direction: Direction) {
        let moved = {
            let mut state = self.shared.state.write();
            let s = &mut state.suggestions;
            let next = navigate(s.selected_index, s.items.len(), s.visible, direction);
            let changed = next != s.selected_index;
            s.selected_index = next;
            changed
        };
        if moved {
            self.publish();
        }
    }

    /// Take `suggestion` as the new term and close the list.
    ///
    /// The list stays closed: the pending suggestion debounce for the new term
    /// is dropped and any fetch still in flight is superseded.
    pub fn select_suggestion(&self, suggestion: &Suggestion) {
        self.set_term(suggestion.value.clone());
        self.shared.suggestion_debouncer.cancel();
        {
            let mut state = self.shared.state.write();
            self.shared.suggestion_generation.fetch_add(1, Ordering::AcqRel);
            state.loading.set(LoadingFlag::Suggestions, false);
            state.suggestions.hide();
        }
        self.publish();
    }

    pub fn hide_suggestions(&self) {
        self.shared.state.write().suggestions.hide();
        self.publish();
    }

    /// Fetch suggestions for `term` directly, bypassing the debounce.
    ///
    /// An empty term clears the list without calling the backend.
    #[tracing::instrument(skip(self), fields(session = %self.shared.id))]
    pub async fn fetch_suggestions(&self, term: &str) {
        let config = self.config();
        let term = term.trim();

        let generation = {
            let mut state = self.shared.state.write();
            let generation = self.shared.suggestion_generation.fetch_add(1, Ordering::AcqRel) + 1;
            if term.is_empty() || !config.enable_suggestions {
                state.suggestions.clear();
                state.loading.set(LoadingFlag::Suggestions, false);
                None
            } else {
                state.loading.set(LoadingFlag::Suggestions, true);
                Some(generation)
            }
        };
        self.publish();
        let Some(generation) = generation else {
            return;
        };

        let _loading = LoadingGuard::new(self, LoadingFlag::Suggestions, Counter::Suggestion, generation);
        let outcome = {
            let _timer = LatencyTimer::new("suggestions");
            self.shared.backend.suggestions(term).await
        };

        let mut state = self.shared.state.write();
        if !self.shared.is_current(Counter::Suggestion, generation) {
            drop(state);
            metrics::record_stale_response("suggestions");
            return;
        }
        match outcome {
            Ok(items) => {
                debug!(count = items.len(), "Suggestions loaded");
                state.suggestions.apply(items, config.max_suggestions);
                drop(state);
                metrics::record_operation("suggestions", "success");
            }
            Err(err) => {
                debug!(error = %err, "Suggestion fetch failed");
                state.suggestions.clear();
                drop(state);
                metrics::record_operation("suggestions", "error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{json, Value};

    use crate::backend::{FetchError, InMemoryBackend};
    use crate::config::SearchSessionConfig;

    use super::*;

    fn items(n: usize) -> Vec<Suggestion> {
        (0..n).map(|i| Suggestion::new(format!("s{}", i))).collect()
    }

    #[test]
    fn test_navigate_wraps() {
        assert_eq!(navigate(None, 3, true, Direction::Down), Some(0));
        assert_eq!(navigate(Some(0), 3, true, Direction::Down), Some(1));
        assert_eq!(navigate(Some(2), 3, true, Direction::Down), Some(0));
        assert_eq!(navigate(Some(0), 3, true, Direction::Up), Some(2));
        assert_eq!(navigate(Some(2), 3, true, Direction::Up), Some(1));
        assert_eq!(navigate(None, 3, true, Direction::Up), Some(2));
    }

    #[test]
    fn test_navigate_noop_when_hidden_or_empty() {
        assert_eq!(navigate(None, 0, true, Direction::Down), None);
        assert_eq!(navigate(None, 3, false, Direction::Down), None);
    }

    #[test]
    fn test_apply_truncates_and_resets_selection() {
        let mut state = SuggestionState {
            selected_index: Some(1),
            ..Default::default()
        };
        state.apply(items(12), 10);
        assert_eq!(state.items.len(), 10);
        assert!(state.visible);
        assert_eq!(state.selected_index, None);

        state.apply(Vec::new(), 10);
        assert!(!state.visible);
    }

    fn session(backend: Arc<InMemoryBackend>) -> SearchSession<Value> {
        let config = SearchSessionConfig {
            enable_suggestions: true,
            auto_search: false,
            max_suggestions: 2,
            ..Default::default()
        };
        SearchSession::<Value>::new("sg", config, backend)
    }

    fn backend() -> Arc<InMemoryBackend> {
        Arc::new(InMemoryBackend::new(
            vec![
                json!({"title": "rust"}),
                json!({"title": "rustc"}),
                json!({"title": "rustup"}),
                json!({"title": "ruby"}),
            ],
            "title",
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_term_fetches_suggestions() {
        let backend = backend();
        let s = session(backend.clone());

        s.set_term("ru");
        s.set_term("rus");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let suggestions = s.suggestions();
        assert_eq!(backend.suggestion_calls(), 1);
        assert_eq!(suggestions.items.len(), 2);
        assert!(suggestions.visible);
        assert!(!s.loading().suggestions);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_and_selection() {
        let s = session(backend());
        s.fetch_suggestions("ru").await;

        s.navigate_suggestions(Direction::Up);
        let highlighted = s.highlighted_suggestion().expect("highlighted");
        assert_eq!(highlighted.value, "rustc");

        s.select_suggestion(&highlighted);
        assert_eq!(s.term(), "rustc");
        let state = s.suggestions();
        assert!(!state.visible);
        assert_eq!(state.selected_index, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_stays_closed_after_debounce() {
        let backend = backend();
        let s = session(backend.clone());

        s.set_term("ru");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.suggestion_calls(), 1);

        s.navigate_suggestions(Direction::Down);
        let picked = s.highlighted_suggestion().expect("highlighted");
        s.select_suggestion(&picked);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(s.term(), "rust");
        assert_eq!(backend.suggestion_calls(), 1);
        assert!(!s.suggestions().visible);

        // Typing again reopens the list
        s.set_term("rub");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.suggestion_calls(), 2);
        assert!(s.suggestions().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_silent() {
        let backend = backend();
        let s = session(backend.clone());
        s.fetch_suggestions("ru").await;
        assert!(s.suggestions().visible);

        backend.fail_next(FetchError::network("offline"));
        s.fetch_suggestions("rus").await;

        assert!(s.suggestions().items.is_empty());
        assert!(!s.suggestions().visible);
        assert!(s.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_term_clears_without_fetch() {
        let backend = backend();
        let s = session(backend.clone());
        s.fetch_suggestions("ru").await;
        assert_eq!(backend.suggestion_calls(), 1);

        s.fetch_suggestions("  ").await;
        assert_eq!(backend.suggestion_calls(), 1);
        assert!(s.suggestions().items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_resets_selection() {
        let s = session(backend());
        s.fetch_suggestions("ru").await;
        s.navigate_suggestions(Direction::Down);
        assert_eq!(s.suggestions().selected_index, Some(0));

        s.hide_suggestions();
        assert_eq!(s.suggestions().selected_index, None);
        s.navigate_suggestions(Direction::Down);
        assert_eq!(s.suggestions().selected_index, None);
    }
}
