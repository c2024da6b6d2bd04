//! Parameter flattening and encoding.
//!
//! Nested [`Params`] are flattened into ordered `(key, value)` pairs using
//! bracketed keys: a map under `filters` becomes `filters[status]`, a list
//! under `expand` becomes repeated `expand[]` entries (V1) or repeated
//! `expand` entries (V2). Output order follows insertion order, so the same
//! parameters always produce the same bytes.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

use crate::ApiMode;

// ============================================================================
// Parameter Values
// ============================================================================

/// A single request parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Absent value, skipped when flattening.
    Null,
    /// Boolean, encoded as `true` / `false`.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    String(String),
    /// Point in time, encoded as epoch seconds.
    Timestamp(DateTime<Utc>),
    /// Sequence of values.
    List(Vec<ParamValue>),
    /// Nested parameters.
    Map(Params),
}

impl ParamValue {
    fn scalar(&self) -> Option<String> {
        match self {
            Self::Bool(value) => Some(value.to_string()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::String(value) => Some(value.clone()),
            Self::Timestamp(value) => Some(encode_timestamp(value).to_string()),
            Self::Null | Self::List(_) | Self::Map(_) => None,
        }
    }
}

/// Epoch conversion applied to every timestamp, in the query string and in
/// JSON bodies alike.
#[must_use]
pub fn encode_timestamp(timestamp: &DateTime<Utc>) -> i64 {
    timestamp.timestamp()
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Params> for ParamValue {
    fn from(value: Params) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => match number.as_i64() {
                Some(value) => Self::Integer(value),
                None => number
                    .as_f64()
                    .map_or_else(|| Self::String(number.to_string()), Self::Float),
            },
            Value::String(value) => Self::String(value),
            Value::Array(values) => Self::List(values.into_iter().map(Into::into).collect()),
            Value::Object(map) => Self::Map(map.into()),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::String(value) => serializer.serialize_str(value),
            Self::Timestamp(value) => serializer.serialize_i64(encode_timestamp(value)),
            Self::List(values) => serializer.collect_seq(values),
            Self::Map(params) => params.serialize(serializer),
        }
    }
}

// ============================================================================
// Parameter Map
// ============================================================================

/// Insertion-ordered request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(IndexMap<String, ParamValue>);

impl Params {
    /// Empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one. An existing key keeps its
    /// position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Chained [`Params::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }

    /// Overlay `other` on top of `self`; values from `other` win.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = indexmap::map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Params {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Flatten parameters into ordered `(key, value)` pairs.
#[must_use]
pub fn api_encode(params: &Params, api_mode: ApiMode) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        encode_value(&mut pairs, key, value, api_mode);
    }
    pairs
}

fn encode_value(
    pairs: &mut Vec<(String, String)>,
    key: &str,
    value: &ParamValue,
    api_mode: ApiMode,
) {
    match value {
        ParamValue::Null => {}
        ParamValue::List(items) => {
            for (index, item) in items.iter().enumerate() {
                let item_key = match (api_mode, item) {
                    (ApiMode::V2, _) => key.to_string(),
                    (ApiMode::V1, ParamValue::Map(_)) => format!("{key}[{index}]"),
                    (ApiMode::V1, _) => format!("{key}[]"),
                };
                encode_value(pairs, &item_key, item, api_mode);
            }
        }
        ParamValue::Map(nested) => {
            for (sub_key, sub_value) in nested {
                encode_value(pairs, &format!("{key}[{sub_key}]"), sub_value, api_mode);
            }
        }
        scalar => {
            if let Some(encoded) = scalar.scalar() {
                pairs.push((key.to_string(), encoded));
            }
        }
    }
}

/// Percent-encode flattened pairs into a query string.
///
/// Brackets are restored to their literal form; the server decodes both.
pub fn to_query_string(pairs: &[(String, String)]) -> crate::Result<String> {
    let encoded = serde_urlencoded::to_string(pairs)?;
    Ok(encoded.replace("%5B", "[").replace("%5D", "]"))
}

/// Parse an existing query string back into parameters.
///
/// `key[]` entries are unsuffixed and always yield a list, other keys
/// collapse to a scalar when they have a single value. Blank values are
/// dropped.
#[must_use]
pub fn parse_query(query: &str) -> Params {
    let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        grouped
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            if let Some(stripped) = key.strip_suffix("[]") {
                return (stripped.to_string(), ParamValue::from(values));
            }
            if values.len() == 1 {
                let value = values.pop().map_or(ParamValue::Null, ParamValue::String);
                return (key, value);
            }
            (key, ParamValue::from(values))
        })
        .collect()
}
