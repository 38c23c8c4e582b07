//! Result payloads exchanged with the search backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page (or, in infinite mode, the accumulated pages) of search results.
///
/// # Example
///
/// ```
/// use search_session::ResultSet;
///
/// let mut first = ResultSet::new(vec![1, 2]).with_has_more(true);
/// let second = ResultSet::new(vec![3, 4]).with_next_cursor("x").with_has_more(false);
///
/// first.append(second);
/// assert_eq!(first.data, vec![1, 2, 3, 4]);
/// assert_eq!(first.next_cursor.as_deref(), Some("x"));
/// assert_eq!(first.has_more, Some(false));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet<T> {
    pub data: Vec<T>,
    /// Total matches across all pages, when the backend knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    /// Opaque boundary of the next page (infinite scroll)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> ResultSet<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            total: None,
            has_more: None,
            next_cursor: None,
        }
    }

    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    #[must_use]
    pub fn with_has_more(mut self, has_more: bool) -> Self {
        self.has_more = Some(has_more);
        self
    }

    #[must_use]
    pub fn with_next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    /// Append the next page: data is concatenated in order, every other
    /// field is taken from `next`.
    pub fn append(&mut self, next: ResultSet<T>) {
        self.data.extend(next.data);
        self.total = next.total;
        self.has_more = next.has_more;
        self.next_cursor = next.next_cursor;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Default for ResultSet<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// An autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Text that replaces the search term when selected
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Grouping hint, e.g. "recent" or "popular"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Suggestion {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
            category: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Label if present, otherwise the value.
    #[must_use]
    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}
