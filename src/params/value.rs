// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed parameter values.

use serde_json::{Map, Number, Value};

use super::Params;

/// A single value held by [`Params`].
///
/// `Null` is distinct from an absent key: it survives JSON round-trips and is
/// skipped when building signature base strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    String(String),
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Object(Params),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Human-readable type name, used in format errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::String(_) => "string",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Int(_) => "int",
            ParamValue::Long(_) => "long",
            ParamValue::Double(_) => "double",
            ParamValue::Object(_) => "object",
            ParamValue::Array(_) => "array",
        }
    }

    /// Text form used on the wire and in the signature base string.
    ///
    /// Returns `None` for `Null`. Nested objects and arrays render as compact
    /// JSON.
    pub fn signing_value(&self) -> Option<String> {
        match self {
            ParamValue::Null => None,
            ParamValue::String(s) => Some(s.clone()),
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::Int(i) => Some(i.to_string()),
            ParamValue::Long(l) => Some(l.to_string()),
            ParamValue::Double(d) => Some(format!("{d:?}")),
            ParamValue::Object(_) | ParamValue::Array(_) => Some(self.to_json().to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Null => Value::Null,
            ParamValue::String(s) => Value::String(s.clone()),
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Long(l) => Value::from(*l),
            ParamValue::Double(d) => Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
            ParamValue::Object(p) => p.to_json_value(),
            ParamValue::Array(items) => Value::Array(items.iter().map(ParamValue::to_json).collect()),
        }
    }

    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(b),
            Value::String(s) => ParamValue::String(s),
            Value::Number(n) => number_value(&n),
            Value::Array(items) => {
                ParamValue::Array(items.into_iter().map(ParamValue::from_json).collect())
            }
            Value::Object(map) => ParamValue::Object(Params::from_json_map(map)),
        }
    }
}

fn number_value(n: &Number) -> ParamValue {
    if let Some(i) = n.as_i64() {
        return match i32::try_from(i) {
            Ok(small) => ParamValue::Int(small),
            Err(_) => ParamValue::Long(i),
        };
    }
    ParamValue::Double(n.as_f64().unwrap_or(f64::NAN))
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::String(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Long(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Double(value)
    }
}

impl From<Params> for ParamValue {
    fn from(value: Params) -> Self {
        ParamValue::Object(value)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(value: Vec<ParamValue>) -> Self {
        ParamValue::Array(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::from_json(value)
    }
}

pub(super) fn object_to_json(entries: &std::collections::BTreeMap<String, ParamValue>) -> Value {
    let mut map = Map::new();
    for (key, value) in entries {
        map.insert(key.clone(), value.to_json());
    }
    Value::Object(map)
}
