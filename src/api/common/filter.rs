//
//  bamboo-client
//  api/common/filter.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Client-side filtering of listed resources.
//!
//! Bamboo's list endpoints return whole collections; narrowing them down by
//! field value happens on the client. A [`Filter`] is an ordered set of
//! `field -> expected value` conditions plus [`FilterOptions`] that apply to
//! the whole call.
//!
//! # Matching Rules
//!
//! | Option | Comparison |
//! |--------|------------|
//! | default | stringified field value *contains* the expected value |
//! | `exact` | stringified field value *equals* the expected value |
//!
//! An item matches only when every condition matches. A field absent from
//! the item never matches.
//!
//! # Example
//!
//! ```rust
//! use bamboo_client::api::common::Filter;
//! use serde_json::json;
//!
//! let filter = Filter::new().field("name", "Release").exact();
//! let item = json!({"name": "Release", "id": 7});
//! assert!(filter.matches(item.as_object().unwrap()));
//! ```

use serde_json::{Map, Value};

use crate::util::value_to_string;

/// Expected value of a single filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// A single expected string.
    Text(String),
    /// Any of several expected strings.
    ///
    /// Not accepted by the environment-variable form backend.
    List(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Call-wide filter switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Compare with string equality instead of substring containment.
    pub exact: bool,
    /// Return only the first matching item.
    pub first: bool,
}

impl FilterOptions {
    /// Builds options from flag names. `"exact"` and `"first"` are
    /// recognized; `"all"` and unknown flags are ignored.
    pub fn from_flags(flags: &[&str]) -> Self {
        Self {
            exact: flags.contains(&"exact"),
            first: flags.contains(&"first"),
        }
    }
}

/// An ordered set of field conditions plus call-wide options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, FilterValue)>,
    /// Options applied to the whole call.
    pub options: FilterOptions,
}

impl Filter {
    /// Creates an empty filter that matches every item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the `first` + `exact` lookup filter for one field.
    pub fn lookup(field: &str, value: &str) -> Self {
        Self::new().field(field, value).exact().first()
    }

    /// Adds a condition. A later condition on the same field replaces the
    /// earlier one.
    pub fn field(mut self, name: &str, value: impl Into<FilterValue>) -> Self {
        let value = value.into();
        match self.conditions.iter_mut().find(|(k, _)| k == name) {
            Some(existing) => existing.1 = value,
            None => self.conditions.push((name.to_string(), value)),
        }
        self
    }

    /// Switches to exact string comparison.
    pub fn exact(mut self) -> Self {
        self.options.exact = true;
        self
    }

    /// Restricts the result to the first match.
    pub fn first(mut self) -> Self {
        self.options.first = true;
        self
    }

    /// Replaces the options wholesale.
    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns `true` when the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The conditions in insertion order.
    pub fn conditions(&self) -> &[(String, FilterValue)] {
        &self.conditions
    }

    /// Checks one raw item against every condition.
    pub fn matches(&self, item: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            let Some(actual) = item.get(field).and_then(value_to_string) else {
                return false;
            };
            match expected {
                FilterValue::Text(text) => self.compare(&actual, text),
                FilterValue::List(values) => values.iter().any(|v| self.compare(&actual, v)),
            }
        })
    }

    fn compare(&self, actual: &str, expected: &str) -> bool {
        if self.options.exact {
            actual == expected
        } else {
            actual.contains(expected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_substring_match_is_default() {
        let filter = Filter::new().field("name", "rel");
        assert!(filter.matches(&obj(json!({"name": "release-1"}))));
        assert!(!filter.matches(&obj(json!({"name": "hotfix"}))));
    }

    #[test]
    fn test_exact_match() {
        let filter = Filter::new().field("name", "rel").exact();
        assert!(!filter.matches(&obj(json!({"name": "release-1"}))));
        assert!(filter.matches(&obj(json!({"name": "rel"}))));
    }

    #[test]
    fn test_numbers_are_stringified() {
        let filter = Filter::new().field("id", "42").exact();
        assert!(filter.matches(&obj(json!({"id": 42}))));
    }

    #[test]
    fn test_all_conditions_must_match() {
        let filter = Filter::new().field("name", "a").field("key", "K");
        assert!(filter.matches(&obj(json!({"name": "abc", "key": "KEY"}))));
        assert!(!filter.matches(&obj(json!({"name": "abc", "key": "x"}))));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let filter = Filter::new().field("name", "");
        assert!(!filter.matches(&obj(json!({"id": 1}))));
    }

    #[test]
    fn test_options_from_flags() {
        let options = FilterOptions::from_flags(&["first", "exact"]);
        assert!(options.first && options.exact);
        assert_eq!(FilterOptions::from_flags(&["all"]), FilterOptions::default());
    }
}
