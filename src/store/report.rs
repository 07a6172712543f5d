//! Request and response shapes of the store operations.

use std::fmt;
use std::path::PathBuf;

use serde::de::{
    MapAccess,
    Visitor,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use crate::codec::TranslationMap;

/// Key -> (locale -> value) pairs in a caller-visible order.
///
/// Serialized as a JSON object whose member order follows the vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedTranslations(pub Vec<(String, TranslationMap)>);

impl KeyedTranslations {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TranslationMap> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, TranslationMap)> for KeyedTranslations {
    fn from_iter<I: IntoIterator<Item = (String, TranslationMap)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for KeyedTranslations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for KeyedTranslations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyedVisitor;

        impl<'de> Visitor<'de> for KeyedVisitor {
            type Value = KeyedTranslations;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an object mapping keys to locale/text objects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, translations)) = map.next_entry::<String, TranslationMap>()? {
                    entries.push((key, translations));
                }
                Ok(KeyedTranslations(entries))
            }
        }

        deserializer.deserialize_map(KeyedVisitor)
    }
}

/// Result of `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    /// Applied (key, locale) pairs.
    pub updated_keys: usize,
    /// Pairs naming an unknown key or locale.
    pub skipped: usize,
}

/// Result of `mark_checked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReport {
    /// Requested keys that exist.
    pub marked_count: usize,
}

/// Result of `add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReport {
    /// Keys that did not exist before.
    pub added_keys: usize,
    /// Locales that received a value during the call, sorted.
    pub added_locales: Vec<String>,
}

/// Result of `delete_by_prefix`.
///
/// `deleted_count` counts removed values in locale-scoped mode and removed keys
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    /// Removed values or keys, see above.
    pub deleted_count: usize,
}

/// Keys marked as reviewed, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewedKeys {
    /// Length of `keys`.
    pub count: usize,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    /// Keys in the catalog.
    pub total: usize,
    /// Keys lacking a value for at least one locale.
    pub missing_translations: usize,
    /// Keys not yet reviewed.
    pub waiting_for_check: usize,
}

/// A key lacking at least one locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncompleteEntry {
    pub key: String,
    /// Locales with no value or an empty string.
    pub missing: Vec<String>,
    pub translations: TranslationMap,
}

/// A locale document that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file: PathBuf,
    pub error: String,
}

/// Outcome of a load or reload cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadReport {
    pub locales: Vec<String>,
    pub entries: usize,
    /// Checked keys that flipped back to unchecked because their text changed.
    pub invalidated: Vec<String>,
    pub failures: Vec<FileFailure>,
}
