//! Filter sets and declarative filter definitions.
//!
//! A [`FilterSet`] is an ordered map, so two sets holding the same pairs are
//! equal and serialize identically no matter the order filters were applied.
//! A key's absence means "unset"; `null` is never stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Active filters: key → value.
pub type FilterSet = BTreeMap<String, Value>;

/// Kind of control a filter represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    String,
    Number,
    Boolean,
    Date,
    Select,
    Multiselect,
    Range,
}

/// A selectable option of a `select`/`multiselect` filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: Value,
}

/// Declarative description of a filter.
///
/// The session does not coerce or validate filter values against their
/// definition; definitions describe the UI and seed defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub key: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FilterOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FilterDefinition {
    pub fn new(key: impl Into<String>, filter_type: FilterType, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            filter_type,
            label: label.into(),
            options: None,
            min: None,
            max: None,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<FilterOption>) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Filter set made of every declared default (null defaults are skipped).
#[must_use]
pub fn default_filters(definitions: &[FilterDefinition]) -> FilterSet {
    definitions
        .iter()
        .filter_map(|def| match &def.default {
            Some(value) if !value.is_null() => Some((def.key.clone(), value.clone())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_filters() {
        let defs = vec![
            FilterDefinition::new("status", FilterType::Select, "Status").with_default(json!("open")),
            FilterDefinition::new("tags", FilterType::Multiselect, "Tags"),
            FilterDefinition::new("owner", FilterType::String, "Owner").with_default(Value::Null),
        ];

        let filters = default_filters(&defs);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get("status"), Some(&json!("open")));
    }

    #[test]
    fn test_definition_deserialize() {
        let def: FilterDefinition = serde_json::from_value(json!({
            "key": "price",
            "type": "range",
            "label": "Price",
            "min": 0.0,
            "max": 500.0
        }))
        .unwrap();

        assert_eq!(def.filter_type, FilterType::Range);
        assert_eq!(def.min, Some(0.0));
        assert_eq!(def.max, Some(500.0));
        assert!(def.options.is_none());
    }

    #[test]
    fn test_filter_set_order_independent() {
        let mut a = FilterSet::new();
        a.insert("b".into(), json!(2));
        a.insert("a".into(), json!(1));

        let mut b = FilterSet::new();
        b.insert("a".into(), json!(1));
        b.insert("b".into(), json!(2));

        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
