// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search term validation.
//!
//! Validation is synchronous and never fails: it produces the ordered list of
//! messages for every rule the term violates. An empty list means the term may
//! be searched.
//!
//! # Example
//!
//! ```
//! use search_session::validation::{validate, ValidationRule};
//!
//! let rules = vec![ValidationRule::new("No wildcards allowed", |t| !t.contains('*'))];
//!
//! assert!(validate("rust", &rules, 3, 100).is_empty());
//! assert_eq!(
//!     validate("a*", &rules, 3, 100),
//!     vec![
//!         "Search term must be at least 3 characters".to_string(),
//!         "No wildcards allowed".to_string(),
//!     ]
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A custom validation rule: a predicate the trimmed term must satisfy and
/// the message reported when it does not.
#[derive(Clone)]
pub struct ValidationRule {
    message: String,
    predicate: Predicate,
}

impl ValidationRule {
    pub fn new<F>(message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Rule satisfied when the term matches `pattern`.
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        let re = Regex::new(pattern)?;
        Ok(Self::new(message, move |term| re.is_match(term)))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn check(&self, term: &str) -> bool {
        (self.predicate)(term)
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Validate a search term.
///
/// Messages are ordered: minimum length, maximum length, then each custom
/// rule in declaration order. Lengths count characters of the trimmed term,
/// so an empty term is too short whenever `min_length > 0`.
#[must_use]
pub fn validate(
    term: &str,
    rules: &[ValidationRule],
    min_length: usize,
    max_length: usize,
) -> Vec<String> {
    let trimmed = term.trim();
    let len = trimmed.chars().count();
    let mut messages = Vec::new();

    if len < min_length {
        messages.push(format!("Search term must be at least {} characters", min_length));
    }
    if len > max_length {
        messages.push(format!("Search term must be at most {} characters", max_length));
    }

    messages.extend(
        rules
            .iter()
            .filter(|rule| !rule.check(trimmed))
            .map(|rule| rule.message.clone()),
    );

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_length() {
        let messages = validate("ab", &[], 3, 1000);
        assert_eq!(messages, vec!["Search term must be at least 3 characters"]);
    }

    #[test]
    fn test_empty_term_reports_min_length() {
        let too_short = vec!["Search term must be at least 3 characters".to_string()];
        assert_eq!(validate("", &[], 3, 1000), too_short);
        assert_eq!(validate("   ", &[], 3, 1000), too_short);
        assert!(validate("", &[], 0, 1000).is_empty());
    }

    #[test]
    fn test_max_length() {
        let messages = validate("abcdef", &[], 0, 5);
        assert_eq!(messages, vec!["Search term must be at most 5 characters"]);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 3 characters, 9 bytes
        assert!(validate("日本語", &[], 3, 3).is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert!(validate("  abc  ", &[], 3, 3).is_empty());
    }

    #[test]
    fn test_rule_order_preserved() {
        let rules = vec![
            ValidationRule::new("first", |_| false),
            ValidationRule::new("passes", |_| true),
            ValidationRule::new("second", |_| false),
        ];
        let messages = validate("x", &rules, 2, 0);
        assert_eq!(
            messages,
            vec![
                "Search term must be at least 2 characters",
                "Search term must be at most 0 characters",
                "first",
                "second",
            ]
        );
    }

    #[test]
    fn test_pattern_rule() {
        let rule = ValidationRule::pattern(r"^[a-z ]*$", "Lowercase letters only").unwrap();
        assert!(rule.check("hello world"));
        assert!(!rule.check("Hello"));
        assert_eq!(validate("Hello", &[rule], 0, 100), vec!["Lowercase letters only"]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(ValidationRule::pattern("(unclosed", "bad").is_err());
    }

    #[test]
    fn test_debug_hides_predicate() {
        let rule = ValidationRule::new("msg", |_| true);
        assert!(format!("{:?}", rule).contains("msg"));
    }
}
