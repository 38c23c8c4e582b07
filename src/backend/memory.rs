use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::RegexBuilder;
use serde_json::Value;

use crate::config::{PaginationMode, SearchMode};
use crate::filters::FilterSet;
use crate::results::{ResultSet, Suggestion};
use super::traits::{FetchError, LoadMoreRequest, SearchBackend, SearchRequest};

/// Backend over a fixed list of JSON documents.
///
/// The term is matched against the string at `text_field` according to the
/// request's [`SearchMode`]; every filter must equal the document's field of
/// the same name. Cursors are stringified offsets.
pub struct InMemoryBackend {
    documents: Vec<Value>,
    text_field: String,
    search_calls: AtomicU64,
    suggestion_calls: AtomicU64,
    load_more_calls: AtomicU64,
    /// Injected failure for the next call of any kind
    fail_next: Mutex<Option<FetchError>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(documents: Vec<Value>, text_field: impl Into<String>) -> Self {
        Self {
            documents,
            text_field: text_field.into(),
            search_calls: AtomicU64::new(0),
            suggestion_calls: AtomicU64::new(0),
            load_more_calls: AtomicU64::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// Make the next backend call fail with `error`.
    pub fn fail_next(&self, error: FetchError) {
        *self.fail_next.lock() = Some(error);
    }

    #[must_use]
    pub fn search_calls(&self) -> u64 {
        self.search_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn suggestion_calls(&self) -> u64 {
        self.suggestion_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn load_more_calls(&self) -> u64 {
        self.load_more_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn take_failure(&self) -> Result<(), FetchError> {
        match self.fail_next.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn text_of<'a>(&self, doc: &'a Value) -> Option<&'a str> {
        doc.get(&self.text_field).and_then(Value::as_str)
    }

    fn matching(
        &self,
        term: &str,
        mode: SearchMode,
        filters: &FilterSet,
    ) -> Result<Vec<Value>, FetchError> {
        let matcher: Box<dyn Fn(&str) -> bool> = match mode {
            SearchMode::Exact => {
                let term = term.to_lowercase();
                Box::new(move |text| text.to_lowercase() == term)
            }
            SearchMode::Contains => {
                let term = term.to_lowercase();
                Box::new(move |text| text.to_lowercase().contains(&term))
            }
            SearchMode::Fuzzy => {
                let term = term.to_lowercase();
                Box::new(move |text| is_subsequence(&term, &text.to_lowercase()))
            }
            SearchMode::Regex => {
                let re = RegexBuilder::new(term)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        FetchError::server(format!("Invalid pattern: {}", e), Some("invalid_regex".into()))
                    })?;
                Box::new(move |text| re.is_match(text))
            }
        };

        Ok(self
            .documents
            .iter()
            .filter(|doc| filters.iter().all(|(key, value)| doc.get(key) == Some(value)))
            .filter(|doc| self.text_of(doc).is_some_and(|text| matcher(text)))
            .cloned()
            .collect())
    }

    fn page_from(matches: Vec<Value>, offset: usize, page_size: usize, cursors: bool) -> ResultSet<Value> {
        let total = matches.len();
        let end = offset.saturating_add(page_size).min(total);
        let data: Vec<Value> = matches.into_iter().skip(offset).take(page_size).collect();
        let has_more = end < total;

        let mut page = ResultSet::new(data)
            .with_total(total as u64)
            .with_has_more(has_more);
        if cursors && has_more {
            page = page.with_next_cursor(end.to_string());
        }
        page
    }
}

/// Every character of `needle` appears in `haystack`, in order.
fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = haystack.chars();
    needle.chars().all(|c| chars.any(|h| h == c))
}

fn parse_cursor(cursor: Option<&str>) -> Result<usize, FetchError> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| FetchError::server(format!("Invalid cursor '{}'", raw), Some("invalid_cursor".into()))),
    }
}

#[async_trait]
impl SearchBackend<Value> for InMemoryBackend {
    async fn search(&self, request: &SearchRequest) -> Result<ResultSet<Value>, FetchError> {
        self.search_calls.fetch_add(1, Ordering::Relaxed);
        self.take_failure()?;

        let matches = self.matching(&request.term, request.search_mode, &request.filters)?;
        let page_size = request.page_size.max(1) as usize;

        let page = match request.mode {
            PaginationMode::Pagination => {
                let offset = (request.page.max(1) as usize - 1).saturating_mul(page_size);
                Self::page_from(matches, offset, page_size, false)
            }
            PaginationMode::Infinite => {
                let offset = parse_cursor(request.cursor.as_deref())?;
                Self::page_from(matches, offset, page_size, true)
            }
        };
        Ok(page)
    }

    async fn suggestions(&self, term: &str) -> Result<Vec<Suggestion>, FetchError> {
        self.suggestion_calls.fetch_add(1, Ordering::Relaxed);
        self.take_failure()?;

        let prefix = term.to_lowercase();
        let mut seen = Vec::<String>::new();
        for text in self.documents.iter().filter_map(|doc| self.text_of(doc)) {
            if text.to_lowercase().starts_with(&prefix) && !seen.iter().any(|s| s == text) {
                seen.push(text.to_string());
            }
        }
        Ok(seen.into_iter().map(Suggestion::new).collect())
    }

    async fn load_more(&self, request: &LoadMoreRequest) -> Result<ResultSet<Value>, FetchError> {
        self.load_more_calls.fetch_add(1, Ordering::Relaxed);
        self.take_failure()?;

        let offset = parse_cursor(request.cursor.as_deref())?;
        let matches = self.matching(&request.term, request.search_mode, &request.filters)?;
        Ok(Self::page_from(matches, offset, request.page_size.max(1) as usize, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new(
            vec![
                json!({"title": "Rust in Action", "lang": "en"}),
                json!({"title": "Rust for Rustaceans", "lang": "en"}),
                json!({"title": "Programmieren mit Rust", "lang": "de"}),
                json!({"title": "Go in Practice", "lang": "en"}),
            ],
            "title",
        )
    }

    fn request(term: &str, mode: SearchMode) -> SearchRequest {
        SearchRequest {
            term: term.into(),
            filters: FilterSet::new(),
            search_mode: mode,
            mode: PaginationMode::Pagination,
            page: 1,
            page_size: 10,
            cursor: None,
        }
    }

    #[tokio::test]
    async fn test_contains() {
        let result = backend().search(&request("rust", SearchMode::Contains)).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.total, Some(3));
        assert_eq!(result.has_more, Some(false));
    }

    #[tokio::test]
    async fn test_exact_and_fuzzy() {
        let b = backend();
        let exact = b.search(&request("go in practice", SearchMode::Exact)).await.unwrap();
        assert_eq!(exact.len(), 1);

        let fuzzy = b.search(&request("rfr", SearchMode::Fuzzy)).await.unwrap();
        assert_eq!(fuzzy.data, vec![json!({"title": "Rust for Rustaceans", "lang": "en"})]);
    }

    #[tokio::test]
    async fn test_regex_invalid_pattern() {
        let err = backend().search(&request("(", SearchMode::Regex)).await.unwrap_err();
        assert_eq!(err.kind, Some(crate::ErrorKind::Server));
        assert_eq!(err.code.as_deref(), Some("invalid_regex"));
    }

    #[tokio::test]
    async fn test_filters_and_pages() {
        let b = backend();
        let mut req = request("rust", SearchMode::Contains);
        req.filters.insert("lang".into(), json!("en"));
        req.page_size = 1;
        req.page = 2;

        let page = b.search(&req).await.unwrap();
        assert_eq!(page.total, Some(2));
        assert_eq!(page.data, vec![json!({"title": "Rust for Rustaceans", "lang": "en"})]);
        assert_eq!(page.has_more, Some(false));
        assert_eq!(b.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_cursor_flow() {
        let b = backend();
        let mut req = request("rust", SearchMode::Contains);
        req.mode = PaginationMode::Infinite;
        req.page_size = 2;

        let first = b.search(&req).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.next_cursor.as_deref(), Some("2"));

        let more = b
            .load_more(&LoadMoreRequest {
                term: "rust".into(),
                filters: FilterSet::new(),
                search_mode: SearchMode::Contains,
                page_size: 2,
                cursor: first.next_cursor.clone(),
            })
            .await
            .unwrap();
        assert_eq!(more.len(), 1);
        assert_eq!(more.has_more, Some(false));
        assert!(more.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_suggestions_prefix_distinct() {
        let b = backend();
        let suggestions = b.suggestions("ru").await.unwrap();
        let values: Vec<_> = suggestions.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["Rust in Action", "Rust for Rustaceans"]);
        assert_eq!(b.suggestion_calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let b = backend();
        b.fail_next(FetchError::network("down"));

        assert!(b.search(&request("rust", SearchMode::Contains)).await.is_err());
        assert!(b.search(&request("rust", SearchMode::Contains)).await.is_ok());
    }
}
