//! Conversion between nested locale documents and the flat key space.
//!
//! A locale document is an arbitrarily nested JSON object. The catalog works on
//! dotted keys (`common.buttons.save`), so every document is flattened on load and
//! rebuilt on save.

use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Number,
    Value,
};
use thiserror::Error;

/// Separator between path segments of a translation key.
pub const KEY_SEPARATOR: char = '.';

/// Errors produced by the tree codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A nested object was used where a leaf value is required.
    #[error("objects are not valid translation values")]
    ObjectLeaf,
    /// A key needs an object at `segment`, but a shorter key already stored a leaf there.
    #[error("key '{key}' conflicts with the value already stored at '{segment}'")]
    PathConflict {
        /// The key being inserted.
        key: String,
        /// The dotted prefix that already holds a leaf.
        segment: String,
    },
}

/// A leaf of a locale document.
///
/// Arrays are leaves and are kept verbatim. Only [`TranslationValue::Text`] is
/// subject to typographic post-processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum TranslationValue {
    Text(String),
    Number(Number),
    Bool(bool),
    Null,
    List(Vec<Value>),
}

impl TranslationValue {
    /// Returns the text if this is a string leaf.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// An empty string counts as missing, like an absent value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    /// Applies `f` to string leaves, passing every other leaf through unchanged.
    #[must_use]
    pub fn map_text(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            Self::Text(text) => Self::Text(f(&text)),
            other => other,
        }
    }
}

impl From<&str> for TranslationValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for TranslationValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl TryFrom<Value> for TranslationValue {
    type Error = CodecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Number(number) => Ok(Self::Number(number)),
            Value::Bool(flag) => Ok(Self::Bool(flag)),
            Value::Null => Ok(Self::Null),
            Value::Array(items) => Ok(Self::List(items)),
            Value::Object(_) => Err(CodecError::ObjectLeaf),
        }
    }
}

impl From<TranslationValue> for Value {
    fn from(value: TranslationValue) -> Self {
        match value {
            TranslationValue::Text(text) => Self::String(text),
            TranslationValue::Number(number) => Self::Number(number),
            TranslationValue::Bool(flag) => Self::Bool(flag),
            TranslationValue::Null => Self::Null,
            TranslationValue::List(items) => Self::Array(items),
        }
    }
}

/// Locale -> value map of a single key.
pub type TranslationMap = BTreeMap<String, TranslationValue>;

/// Flatten a nested document into dotted keys.
///
/// Objects are descended depth-first in document order; everything else,
/// arrays included, is a leaf.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use i18n_catalog_server::codec::{flatten, TranslationValue};
///
/// let document = json!({ "common": { "save": "Save" } });
/// let pairs = flatten(document.as_object().unwrap());
/// assert_eq!(pairs, vec![("common.save".to_string(), TranslationValue::from("Save"))]);
/// ```
#[must_use]
pub fn flatten(tree: &Map<String, Value>) -> Vec<(String, TranslationValue)> {
    let mut result = Vec::new();
    flatten_into(tree, None, &mut result);
    result
}

fn flatten_into(
    tree: &Map<String, Value>,
    prefix: Option<&str>,
    result: &mut Vec<(String, TranslationValue)>,
) {
    for (key, value) in tree {
        let full_key = prefix.map_or_else(|| key.clone(), |p| format!("{p}{KEY_SEPARATOR}{key}"));
        match value {
            Value::Object(child) => flatten_into(child, Some(&full_key), result),
            Value::String(text) => result.push((full_key, TranslationValue::Text(text.clone()))),
            Value::Number(number) => result.push((full_key, TranslationValue::Number(number.clone()))),
            Value::Bool(flag) => result.push((full_key, TranslationValue::Bool(*flag))),
            Value::Null => result.push((full_key, TranslationValue::Null)),
            Value::Array(items) => result.push((full_key, TranslationValue::List(items.clone()))),
        }
    }
}

/// Rebuild a nested document from dotted keys.
///
/// Input order does not matter: pairs are sorted by depth, then by key, so
/// shallower paths are materialized first and the output is deterministic.
///
/// # Errors
/// [`CodecError::PathConflict`] when a key runs through a segment that a shorter
/// key already assigned a leaf to (`a` and `a.b` in the same document).
pub fn unflatten(
    mut pairs: Vec<(String, TranslationValue)>,
) -> Result<Map<String, Value>, CodecError> {
    pairs.sort_by(|(a, _), (b, _)| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));

    let mut root = Map::new();
    for (key, value) in pairs {
        insert_path(&mut root, &key, value.into())?;
    }
    Ok(root)
}

fn depth(key: &str) -> usize {
    key.split(KEY_SEPARATOR).count()
}

fn insert_path(root: &mut Map<String, Value>, key: &str, value: Value) -> Result<(), CodecError> {
    let mut node = root;
    let mut segments = key.split(KEY_SEPARATOR).peekable();
    let mut walked = 0;

    while let Some(segment) = segments.next() {
        walked += segment.len() + 1;
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return Ok(());
        }

        let child = node.entry(segment).or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(map) = child else {
            return Err(CodecError::PathConflict {
                key: key.to_string(),
                segment: key.get(..walked - 1).unwrap_or(key).to_string(),
            });
        };
        node = map;
    }

    Ok(())
}
