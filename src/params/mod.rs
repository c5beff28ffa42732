// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Canonical parameter store.
//!
//! Request parameters live in a map ordered lexicographically by key. The
//! OAuth1 base string and the form body both iterate in that order, so two
//! stores with the same content always sign identically regardless of the
//! order in which keys were inserted.

mod value;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

pub use value::ParamValue;

/// Parameter store errors.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    /// A stored value could not be coerced to the requested type.
    #[error("parameter '{key}' holds a {found} that cannot be read as {expected}")]
    Format {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid JSON parameters: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON parameters must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// Ordered, typed request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. `Option::None` stores an explicit null.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Builder-style [`Params::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True when the key is present and holds an explicit null.
    pub fn is_null(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(ParamValue::is_null)
    }

    /// Keys in lexicographic order.
    pub fn ordered_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `(key, text)` pairs in key order, skipping nulls.
    pub fn signing_pairs(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.signing_value().map(|s| (k.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy every entry of `other` into `self`, replacing existing keys.
    pub fn put_all(&mut self, other: &Params) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Read a value as text. Absent keys and explicit nulls yield `default`.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .and_then(ParamValue::signing_value)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ParamsError> {
        match self.entries.get(key) {
            None | Some(ParamValue::Null) => Ok(default),
            Some(ParamValue::Bool(b)) => Ok(*b),
            Some(ParamValue::String(s)) => Ok(s.eq_ignore_ascii_case("true") || s == "1"),
            Some(other) => Err(format_error(key, "boolean", other)),
        }
    }

    pub fn get_int(&self, key: &str, default: i32) -> Result<i32, ParamsError> {
        match self.entries.get(key) {
            None | Some(ParamValue::Null) => Ok(default),
            Some(ParamValue::Int(i)) => Ok(*i),
            Some(value @ ParamValue::Long(l)) => {
                i32::try_from(*l).map_err(|_| format_error(key, "int", value))
            }
            Some(value @ ParamValue::String(s)) => {
                s.trim().parse().map_err(|_| format_error(key, "int", value))
            }
            Some(other) => Err(format_error(key, "int", other)),
        }
    }

    pub fn get_long(&self, key: &str, default: i64) -> Result<i64, ParamsError> {
        match self.entries.get(key) {
            None | Some(ParamValue::Null) => Ok(default),
            Some(ParamValue::Int(i)) => Ok(i64::from(*i)),
            Some(ParamValue::Long(l)) => Ok(*l),
            Some(value @ ParamValue::String(s)) => {
                s.trim().parse().map_err(|_| format_error(key, "long", value))
            }
            Some(other) => Err(format_error(key, "long", other)),
        }
    }

    pub fn get_double(&self, key: &str, default: f64) -> Result<f64, ParamsError> {
        match self.entries.get(key) {
            None | Some(ParamValue::Null) => Ok(default),
            Some(ParamValue::Int(i)) => Ok(f64::from(*i)),
            // i64 -> f64 may round; that is the documented widening.
            Some(ParamValue::Long(l)) => Ok(*l as f64),
            Some(ParamValue::Double(d)) => Ok(*d),
            Some(value @ ParamValue::String(s)) => {
                s.trim().parse().map_err(|_| format_error(key, "double", value))
            }
            Some(other) => Err(format_error(key, "double", other)),
        }
    }

    /// Nested store under `key`. A JSON object held as a string is parsed.
    pub fn get_params(&self, key: &str) -> Result<Option<Params>, ParamsError> {
        match self.entries.get(key) {
            None | Some(ParamValue::Null) => Ok(None),
            Some(ParamValue::Object(p)) => Ok(Some(p.clone())),
            Some(value @ ParamValue::String(s)) => Params::from_json(s)
                .map(Some)
                .map_err(|_| format_error(key, "object", value)),
            Some(other) => Err(format_error(key, "object", other)),
        }
    }

    pub fn get_array(&self, key: &str) -> Result<Option<&[ParamValue]>, ParamsError> {
        match self.entries.get(key) {
            None | Some(ParamValue::Null) => Ok(None),
            Some(ParamValue::Array(items)) => Ok(Some(items.as_slice())),
            Some(other) => Err(format_error(key, "array", other)),
        }
    }

    /// Parse a JSON object. Explicit nulls are kept as [`ParamValue::Null`].
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Ok(Self::from_json_map(map)),
            other => Err(ParamsError::NotAnObject(ParamValue::from_json(other).type_name())),
        }
    }

    pub(crate) fn from_json_map(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(k, v)| (k, ParamValue::from_json(v)))
            .collect();
        Self { entries }
    }

    pub fn to_json_value(&self) -> Value {
        value::object_to_json(&self.entries)
    }

    /// Parse an `a=1&b=2` query string; every value is stored as a string.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            params.set(key.into_owned(), value.into_owned());
        }
        params
    }
}

fn format_error(key: &str, expected: &'static str, found: &ParamValue) -> ParamsError {
    ParamsError::Format {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Compact JSON.
impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_value())
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_iterate_lexicographically_regardless_of_insertion_order() {
        let mut forward = Params::new();
        forward.set("b", 1).set("a", "x").set("c", true).set("B", 2);
        let mut backward = Params::new();
        backward.set("B", 2).set("c", true).set("a", "x").set("b", 1);

        let fk: Vec<_> = forward.ordered_keys().collect();
        let bk: Vec<_> = backward.ordered_keys().collect();
        assert_eq!(fk, vec!["B", "a", "b", "c"]);
        assert_eq!(fk, bk);
        assert_eq!(forward, backward);
    }

    #[test]
    fn clone_is_deep() {
        let mut original = Params::new();
        original.set("nested", Params::new().with("k", "v"));
        let mut copy = original.clone();
        copy.set("nested", Params::new().with("k", "changed"));
        copy.remove("missing");

        let nested = original.get_params("nested").unwrap().unwrap();
        assert_eq!(nested.get_string("k", ""), "v");
    }

    #[test]
    fn absent_and_null_read_as_default() {
        let mut params = Params::new();
        params.set("nothing", Option::<i32>::None);

        assert_eq!(params.get_int("missing", 5).unwrap(), 5);
        assert_eq!(params.get_int("nothing", 6).unwrap(), 6);
        assert_eq!(params.get_string("nothing", "d"), "d");
        assert!(params.contains_key("nothing"));
        assert!(params.is_null("nothing"));
        assert!(!params.is_null("missing"));
    }

    #[test]
    fn numeric_getters_coerce_strings() {
        let params = Params::new()
            .with("i", "42")
            .with("l", "9000000000")
            .with("d", "2.5")
            .with("b1", "1")
            .with("bt", "TRUE")
            .with("bf", "nope");

        assert_eq!(params.get_int("i", 0).unwrap(), 42);
        assert_eq!(params.get_long("l", 0).unwrap(), 9_000_000_000);
        assert_eq!(params.get_double("d", 0.0).unwrap(), 2.5);
        assert!(params.get_bool("b1", false).unwrap());
        assert!(params.get_bool("bt", false).unwrap());
        assert!(!params.get_bool("bf", true).unwrap());
    }

    #[test]
    fn unparsable_value_is_a_format_error() {
        let params = Params::new().with("n", "abc").with("big", 9_000_000_000_i64);

        match params.get_int("n", 0) {
            Err(ParamsError::Format { key, expected, .. }) => {
                assert_eq!(key, "n");
                assert_eq!(expected, "int");
            }
            other => panic!("expected format error, got {other:?}"),
        }
        assert!(matches!(params.get_int("big", 0), Err(ParamsError::Format { .. })));
        assert!(matches!(params.get_array("n"), Err(ParamsError::Format { .. })));
    }

    #[test]
    fn json_round_trip_preserves_explicit_null() {
        let json = r#"{"a":null,"b":{"c":[1,"two",false]},"d":1.5}"#;
        let params = Params::from_json(json).unwrap();

        assert!(params.is_null("a"));
        assert_eq!(params.to_string(), json);
        assert!(matches!(Params::from_json("[1]"), Err(ParamsError::NotAnObject("array"))));
    }

    #[test]
    fn query_string_values_are_decoded() {
        let params = Params::from_query("?x=hello%20world&y=a%2Bb&z=");
        assert_eq!(params.get_string("x", ""), "hello world");
        assert_eq!(params.get_string("y", ""), "a+b");
        assert_eq!(params.get_string("z", "default"), "");
    }

    #[test]
    fn signing_pairs_skip_nulls() {
        let params = Params::new().with("b", 2).with("a", Option::<&str>::None).with("c", "x");
        let pairs: Vec<_> = params.signing_pairs().collect();
        assert_eq!(pairs, vec![("b", "2".to_string()), ("c", "x".to_string())]);
    }
}
