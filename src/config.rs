//! Configuration for a search session.
//!
//! # Example
//!
//! ```
//! use search_session::{SearchSessionConfig, PaginationMode};
//!
//! // Minimal config (uses defaults)
//! let config = SearchSessionConfig::default();
//! assert_eq!(config.debounce_ms, 300);
//! assert_eq!(config.mode, PaginationMode::Pagination);
//!
//! // Infinite scroll with autocomplete
//! let config = SearchSessionConfig {
//!     mode: PaginationMode::Infinite,
//!     enable_suggestions: true,
//!     suggestion_debounce_ms: 100,
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::filters::FilterDefinition;
use crate::validation::ValidationRule;

/// How successive result pages are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// Numbered pages of `page_size` items
    #[default]
    Pagination,
    /// Cursor-driven infinite scroll, pages appended in order
    Infinite,
}

impl std::fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pagination => write!(f, "pagination"),
            Self::Infinite => write!(f, "infinite"),
        }
    }
}

/// Matching strategy requested from the backend.
///
/// The session never interprets this value; it is handed to
/// [`SearchBackend::search`](crate::SearchBackend::search) unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Exact,
    Fuzzy,
    Regex,
    #[default]
    Contains,
}

/// Configuration for a search session.
///
/// All fields have defaults. Validation rules carry closures and are
/// therefore never (de)serialized; attach them in code.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSessionConfig {
    /// Quiet period before a typed term is considered stable
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub mode: PaginationMode,

    #[serde(default)]
    pub search_mode: SearchMode,

    #[serde(default)]
    pub enable_suggestions: bool,

    #[serde(default = "default_true")]
    pub enable_caching: bool,

    /// Mirror term/page/filters into a key-value store (see [`crate::url_sync`])
    #[serde(default)]
    pub enable_url_sync: bool,

    /// Issue `search()` whenever the debounced term settles on a non-empty value
    #[serde(default = "default_true")]
    pub auto_search: bool,

    #[serde(skip)]
    pub validation_rules: Vec<ValidationRule>,

    #[serde(default)]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Pagination settings
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Result cache settings
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Autocomplete settings
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    #[serde(default = "default_suggestion_debounce_ms")]
    pub suggestion_debounce_ms: u64,

    /// Declared filters; their defaults seed the initial filter set
    #[serde(default)]
    pub filter_definitions: Vec<FilterDefinition>,
}

fn default_debounce_ms() -> u64 { 300 }
fn default_true() -> bool { true }
fn default_max_length() -> usize { 1000 }
fn default_page_size() -> u32 { 20 }
fn default_max_pages() -> u32 { 100 }
fn default_cache_size() -> usize { 50 }
fn default_cache_ttl_ms() -> u64 { 300_000 } // 5 minutes
fn default_max_suggestions() -> usize { 10 }
fn default_suggestion_debounce_ms() -> u64 { 150 }

impl Default for SearchSessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            mode: PaginationMode::default(),
            search_mode: SearchMode::default(),
            enable_suggestions: false,
            enable_caching: true,
            enable_url_sync: false,
            auto_search: true,
            validation_rules: Vec::new(),
            min_length: 0,
            max_length: default_max_length(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            cache_size: default_cache_size(),
            cache_ttl_ms: default_cache_ttl_ms(),
            max_suggestions: default_max_suggestions(),
            suggestion_debounce_ms: default_suggestion_debounce_ms(),
            filter_definitions: Vec::new(),
        }
    }
}

impl SearchSessionConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn suggestion_debounce(&self) -> Duration {
        Duration::from_millis(self.suggestion_debounce_ms)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Builder-style helper for attaching a validation rule.
    #[must_use]
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchSessionConfig::default();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.mode, PaginationMode::Pagination);
        assert_eq!(config.search_mode, SearchMode::Contains);
        assert!(!config.enable_suggestions);
        assert!(config.enable_caching);
        assert!(!config.enable_url_sync);
        assert_eq!(config.min_length, 0);
        assert_eq!(config.max_length, 1000);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.cache_size, 50);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.max_suggestions, 10);
        assert_eq!(config.suggestion_debounce(), Duration::from_millis(150));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SearchSessionConfig = serde_json::from_str(
            r#"{"mode": "infinite", "search_mode": "fuzzy", "page_size": 50}"#,
        )
        .unwrap();

        assert_eq!(config.mode, PaginationMode::Infinite);
        assert_eq!(config.search_mode, SearchMode::Fuzzy);
        assert_eq!(config.page_size, 50);
        // Untouched fields fall back to defaults
        assert_eq!(config.debounce_ms, 300);
        assert!(config.enable_caching);
        assert!(config.validation_rules.is_empty());
    }

    #[test]
    fn test_with_rule() {
        let config = SearchSessionConfig::default()
            .with_rule(ValidationRule::new("no digits", |t| !t.chars().any(|c| c.is_ascii_digit())));
        assert_eq!(config.validation_rules.len(), 1);
    }
}
