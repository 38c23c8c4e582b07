//! Public types for the search session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{ErrorKind, FetchError};
use crate::filters::FilterSet;
use crate::results::{ResultSet, Suggestion};

/// Error record stored on the session after a failed search or load-more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchError {
    pub message: String,
    pub code: Option<String>,
    pub kind: ErrorKind,
    /// Epoch millis at which the failure was recorded
    pub timestamp_ms: u64,
}

impl SearchError {
    /// Build from a backend failure; unclassified failures count as network errors.
    pub fn from_fetch(error: FetchError) -> Self {
        Self {
            message: error.message,
            code: error.code,
            kind: error.kind.unwrap_or(ErrorKind::Network),
            timestamp_ms: now_millis(),
        }
    }
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} error [{}]: {}", self.kind, code, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Independent loading indicators. Any combination may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingFlags {
    /// No search has settled yet
    pub initial: bool,
    pub searching: bool,
    pub loading_more: bool,
    pub refreshing: bool,
    pub suggestions: bool,
}

impl LoadingFlags {
    /// Whether any request is in flight. `initial` is not counted.
    #[must_use]
    pub fn any(&self) -> bool {
        self.searching || self.loading_more || self.refreshing || self.suggestions
    }
}

/// Which loading flag a guard owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadingFlag {
    Searching,
    LoadingMore,
    Refreshing,
    Suggestions,
}

impl LoadingFlags {
    pub(crate) fn set(&mut self, flag: LoadingFlag, value: bool) {
        match flag {
            LoadingFlag::Searching => self.searching = value,
            LoadingFlag::LoadingMore => self.loading_more = value,
            LoadingFlag::Refreshing => self.refreshing = value,
            LoadingFlag::Suggestions => self.suggestions = value,
        }
    }
}

/// Running search statistics. Cache hits are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMetrics {
    pub total_searches: u64,
    pub average_latency_ms: f64,
}

impl SearchMetrics {
    pub(crate) fn record(&mut self, latency_ms: f64) {
        self.total_searches += 1;
        let n = self.total_searches as f64;
        self.average_latency_ms += (latency_ms - self.average_latency_ms) / n;
    }
}

/// Autocomplete state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionState {
    pub items: Vec<Suggestion>,
    /// `None` when nothing is highlighted
    pub selected_index: Option<usize>,
    pub visible: bool,
}

/// Keyboard direction for suggestion navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Point-in-time view of a session, published after every mutation.
///
/// Besides the raw state it carries the derived values a UI usually needs,
/// computed once per mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot<T> {
    pub session_id: String,
    pub term: String,
    pub debounced_term: String,
    pub filters: FilterSet,
    pub page: u32,
    pub cursor: Option<String>,
    pub results: Option<ResultSet<T>>,
    pub error: Option<SearchError>,
    pub loading: LoadingFlags,
    pub suggestions: SuggestionState,
    pub history: Vec<String>,
    pub metrics: SearchMetrics,
    pub validation_errors: Vec<String>,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> SessionSnapshot<T> {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }

    /// A search settled with zero results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.as_ref().is_some_and(|r| r.is_empty())
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.any()
    }
}

/// Errors for session-level misuse. Search failures never surface here;
/// they land in the session's `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("URL sync is disabled for session '{0}'")]
    UrlSyncDisabled(String),
    #[error("Session '{0}' is already registered")]
    AlreadyRegistered(String),
}
