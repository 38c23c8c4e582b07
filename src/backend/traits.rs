use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{PaginationMode, SearchMode};
use crate::filters::FilterSet;
use crate::results::{ResultSet, Suggestion};

/// Failure classification carried by [`FetchError`] and
/// [`SearchError`](crate::SearchError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Input failed configured rules (never produced by a backend call)
    Validation,
    /// Transport or connectivity failure
    Network,
    /// Backend reported an explicit failure
    Server,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Server => "server",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a [`SearchBackend`] call.
///
/// `kind` is optional: the session treats an unclassified failure as
/// [`ErrorKind::Network`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    pub kind: Option<ErrorKind>,
    pub code: Option<String>,
}

impl FetchError {
    /// Unclassified failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            code: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Network)
    }

    pub fn server(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            code,
            ..Self::new(message).with_kind(ErrorKind::Server)
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Unknown)
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Everything a backend needs to run one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Trimmed, validated term
    pub term: String,
    pub filters: FilterSet,
    /// Passed through untouched; interpretation is up to the backend
    pub search_mode: SearchMode,
    pub mode: PaginationMode,
    pub page: u32,
    pub page_size: u32,
    /// Infinite mode only; `None` requests the first page
    pub cursor: Option<String>,
}

/// Request for the page following the current results (infinite mode).
#[derive(Debug, Clone, PartialEq)]
pub struct LoadMoreRequest {
    pub term: String,
    pub filters: FilterSet,
    pub search_mode: SearchMode,
    pub page_size: u32,
    /// `next_cursor` of the results loaded so far
    pub cursor: Option<String>,
}

/// Transport seam for searches, autocomplete and infinite scroll.
#[async_trait]
pub trait SearchBackend<T>: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<ResultSet<T>, FetchError>;

    /// Autocomplete candidates for `term`. Backends without autocomplete
    /// return nothing.
    async fn suggestions(&self, _term: &str) -> Result<Vec<Suggestion>, FetchError>
    where
        T: 'static,
    {
        Ok(Vec::new())
    }

    /// Next page in infinite mode.
    async fn load_more(&self, _request: &LoadMoreRequest) -> Result<ResultSet<T>, FetchError>
    where
        T: 'static,
    {
        Err(FetchError::server("load more is not supported by this backend", None))
    }
}
