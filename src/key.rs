// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Canonical request keys.
//!
//! A key identifies one page of one query for one session and doubles as the
//! [`ResultCache`](crate::ResultCache) key. It is the JSON encoding of
//!
//! ```text
//! [session_id, "search", term, filters, page, page_size]   // pagination
//! [session_id, "search", term, filters, cursor]            // infinite
//! ```
//!
//! Filters are an ordered map, so equivalent filter sets always yield the
//! same key regardless of the order they were set in.

use serde_json::{json, Value};

use crate::config::PaginationMode;
use crate::filters::FilterSet;

/// Inputs that select one page of results.
#[derive(Debug, Clone, Copy)]
pub struct KeyParts<'a> {
    pub session_id: &'a str,
    pub mode: PaginationMode,
    /// Already trimmed
    pub term: &'a str,
    pub filters: &'a FilterSet,
    pub page: u32,
    pub page_size: u32,
    pub cursor: Option<&'a str>,
}

/// Build the canonical key for a request.
#[must_use]
pub fn build_key(parts: KeyParts<'_>) -> String {
    let mut tuple = vec![
        Value::from(parts.session_id),
        Value::from("search"),
        Value::from(parts.term),
        json!(parts.filters),
    ];

    match parts.mode {
        PaginationMode::Pagination => {
            tuple.push(Value::from(parts.page));
            tuple.push(Value::from(parts.page_size));
        }
        PaginationMode::Infinite => {
            tuple.push(parts.cursor.map_or(Value::Null, Value::from));
        }
    }

    Value::Array(tuple).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(filters: &'a FilterSet, mode: PaginationMode) -> KeyParts<'a> {
        KeyParts {
            session_id: "s1",
            mode,
            term: "rust",
            filters,
            page: 2,
            page_size: 20,
            cursor: Some("c9"),
        }
    }

    #[test]
    fn test_pagination_key() {
        let filters = FilterSet::new();
        let key = build_key(parts(&filters, PaginationMode::Pagination));
        assert_eq!(key, r#"["s1","search","rust",{},2,20]"#);
    }

    #[test]
    fn test_infinite_key_uses_cursor() {
        let filters = FilterSet::new();
        let key = build_key(parts(&filters, PaginationMode::Infinite));
        assert_eq!(key, r#"["s1","search","rust",{},"c9"]"#);

        let mut no_cursor = parts(&filters, PaginationMode::Infinite);
        no_cursor.cursor = None;
        assert_eq!(build_key(no_cursor), r#"["s1","search","rust",{},null]"#);
    }

    #[test]
    fn test_filter_insertion_order_irrelevant() {
        let mut first = FilterSet::new();
        first.insert("status".into(), json!("open"));
        first.insert("author".into(), json!("ann"));

        let mut second = FilterSet::new();
        second.insert("author".into(), json!("ann"));
        second.insert("status".into(), json!("open"));

        assert_eq!(
            build_key(parts(&first, PaginationMode::Pagination)),
            build_key(parts(&second, PaginationMode::Pagination)),
        );
    }

    #[test]
    fn test_distinct_inputs_distinct_keys() {
        let filters = FilterSet::new();
        let base = parts(&filters, PaginationMode::Pagination);

        let mut other_page = base;
        other_page.page = 3;
        let mut other_session = base;
        other_session.session_id = "s2";

        assert_ne!(build_key(base), build_key(other_page));
        assert_ne!(build_key(base), build_key(other_session));
    }
}
