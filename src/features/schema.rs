//! Typed feature schemas and raw-record coercion
//!
//! A raw record arrives from the request layer as a loosely typed map. A
//! schema struct deriving [`FeatureSchema`](macro@crate::FeatureSchema)
//! coerces it field by field, reporting every malformed value at once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MalformedField, Result};

/// Statically declared, ordered feature schema
///
/// Implemented by `#[derive(FeatureSchema)]`.
pub trait FeatureSchema: Sized {
    const SCHEMA_NAME: &'static str;
    const SCHEMA_VERSION: u32;

    /// Feature names in schema order, categoricals already one-hot expanded
    fn feature_names() -> &'static [&'static str];

    /// Feature values aligned with [`FeatureSchema::feature_names`]
    fn feature_values(&self) -> Vec<Option<f64>>;

    /// Value of a single named feature
    fn feature_value(&self, name: &str) -> Option<f64>;

    /// Coerce a raw record, rejecting it whole if any field is malformed
    fn from_raw(raw: &RawRecord) -> Result<Self>;
}

/// A single loosely typed input value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Named raw values; no key is required
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, RawValue>);

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<RawValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn malformed(key: &str, expected: &'static str, found: &RawValue) -> MalformedField {
    MalformedField {
        field: key.to_string(),
        expected,
        found: found.to_string(),
    }
}

/// Numbers, booleans (as 0/1) and numeric strings
pub fn coerce_numeric(raw: &RawRecord, key: &str) -> std::result::Result<Option<f64>, MalformedField> {
    match raw.get(key) {
        None | Some(RawValue::Null) => Ok(None),
        Some(RawValue::Number(n)) if n.is_finite() => Ok(Some(*n)),
        Some(RawValue::Bool(b)) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Some(RawValue::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value @ RawValue::Text(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(malformed(key, "number", value)),
        },
        Some(value) => Err(malformed(key, "number", value)),
    }
}

/// Booleans, numbers and yes/no style strings
pub fn coerce_flag(raw: &RawRecord, key: &str) -> std::result::Result<Option<f64>, MalformedField> {
    match raw.get(key) {
        Some(value @ RawValue::Text(s)) => match s.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "true" | "yes" | "y" => Ok(Some(1.0)),
            "false" | "no" | "n" => Ok(Some(0.0)),
            other => match other.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(malformed(key, "flag", value)),
            },
        },
        _ => coerce_numeric(raw, key).map_err(|mut field| {
            field.expected = "flag";
            field
        }),
    }
}

/// Strings only, lowercased and trimmed
pub fn coerce_category(raw: &RawRecord, key: &str) -> std::result::Result<Option<String>, MalformedField> {
    match raw.get(key) {
        None | Some(RawValue::Null) => Ok(None),
        Some(RawValue::Text(s)) => {
            let category = s.trim().to_lowercase();
            Ok((!category.is_empty()).then_some(category))
        }
        Some(value) => Err(malformed(key, "category", value)),
    }
}
