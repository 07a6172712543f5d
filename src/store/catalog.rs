//! In-memory key/locale matrix.

use std::collections::{
    BTreeSet,
    HashMap,
};

use crate::codec::{
    TranslationMap,
    TranslationValue,
};
use crate::typography::{
    apply_typography,
    language_of,
};

use super::report::{
    AddReport,
    DeleteReport,
    IncompleteEntry,
    KeyedTranslations,
    ReviewedKeys,
    StatusSummary,
    UpdateReport,
};

/// One translation key's record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    /// Reviewed since the text last changed.
    pub is_checked: bool,
    /// Locale -> value. Locales without a value are absent.
    pub translations: TranslationMap,
}

/// The key/locale matrix owned by the store.
///
/// Entries iterate in insertion order. `locales` stays sorted and deduplicated.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Records by key.
    entries: HashMap<String, Entry>,
    /// Keys in iteration order.
    order: Vec<String>,
    /// Known locales, sorted.
    locales: Vec<String>,
}

/// Text as it will be stored for `locale`.
fn typeset(value: TranslationValue, locale: &str) -> TranslationValue {
    value.map_text(|text| apply_typography(text, language_of(locale)))
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    #[must_use]
    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.binary_search_by(|l| l.as_str().cmp(locale)).is_ok()
    }

    /// Register a locale. Returns `false` if it was already known.
    pub fn insert_locale(&mut self, locale: &str) -> bool {
        match self.locales.binary_search_by(|l| l.as_str().cmp(locale)) {
            Ok(_) => false,
            Err(position) => {
                self.locales.insert(position, locale.to_string());
                true
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.get_mut(key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.order.iter().filter_map(|key| self.entries.get(key).map(|entry| (key.as_str(), entry)))
    }

    /// Fetch the entry for `key`, creating an unchecked one if needed.
    ///
    /// The flag tells whether the entry was created.
    pub fn ensure_entry(&mut self, key: &str) -> (&mut Entry, bool) {
        let created = !self.entries.contains_key(key);
        if created {
            self.order.push(key.to_string());
        }
        (self.entries.entry(key.to_string()).or_default(), created)
    }

    /// Keep the entries for which `keep` returns `true`. Returns the number removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut Entry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, entry| keep(key, entry));
        self.order.retain(|key| self.entries.contains_key(key));
        before - self.entries.len()
    }

    /// Reorder entries so that keys known to `previous` keep their old position
    /// and keys new to this catalog follow in their current order.
    pub(crate) fn adopt_order(&mut self, previous: &Self) {
        let mut order: Vec<String> =
            previous.order.iter().filter(|key| self.entries.contains_key(*key)).cloned().collect();
        order.extend(self.order.iter().filter(|key| !previous.entries.contains_key(*key)).cloned());
        self.order = order;
    }

    /// Locales for which `entry` has no value or an empty string.
    #[must_use]
    pub fn missing_locales(&self, entry: &Entry) -> Vec<String> {
        self.locales
            .iter()
            .filter(|locale| entry.translations.get(*locale).is_none_or(TranslationValue::is_blank))
            .cloned()
            .collect()
    }

    /// Flat `(key, value)` pairs of one locale, ready for the tree codec.
    #[must_use]
    pub fn locale_pairs(&self, locale: &str) -> Vec<(String, TranslationValue)> {
        self.iter()
            .filter_map(|(key, entry)| {
                entry.translations.get(locale).map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    /// Review flag of every key, in iteration order.
    pub fn review_flags(&self) -> impl Iterator<Item = (&str, bool)> {
        self.iter().map(|(key, entry)| (key, entry.is_checked))
    }

    /// Set review flags from a status document. Unknown keys are ignored.
    pub fn apply_review_flags(&mut self, flags: &HashMap<String, bool>) {
        for (key, checked) in flags {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.is_checked = *checked;
            }
        }
    }

    /// Up to `limit` unchecked entries.
    #[must_use]
    pub fn unreviewed(&self, limit: usize) -> KeyedTranslations {
        self.iter()
            .filter(|(_, entry)| !entry.is_checked)
            .take(limit)
            .map(|(key, entry)| (key.to_string(), entry.translations.clone()))
            .collect()
    }

    #[must_use]
    pub fn reviewed_keys(&self) -> ReviewedKeys {
        let keys: Vec<String> = self
            .iter()
            .filter(|(_, entry)| entry.is_checked)
            .map(|(key, _)| key.to_string())
            .collect();
        ReviewedKeys { count: keys.len(), keys }
    }

    /// Entries lacking at least one known locale.
    #[must_use]
    pub fn incomplete(&self) -> Vec<IncompleteEntry> {
        self.iter()
            .filter_map(|(key, entry)| {
                let missing = self.missing_locales(entry);
                (!missing.is_empty()).then(|| IncompleteEntry {
                    key: key.to_string(),
                    missing,
                    translations: entry.translations.clone(),
                })
            })
            .collect()
    }

    /// Entries whose key starts with `prefix`. An empty prefix matches everything.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Vec<(String, TranslationMap)> {
        self.iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| (key.to_string(), entry.translations.clone()))
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> StatusSummary {
        self.iter().fold(StatusSummary::default(), |mut summary, (_, entry)| {
            summary.total += 1;
            if !self.missing_locales(entry).is_empty() {
                summary.missing_translations += 1;
            }
            if !entry.is_checked {
                summary.waiting_for_check += 1;
            }
            summary
        })
    }

    /// Overwrite existing (key, locale) values.
    ///
    /// Pairs naming an unknown key or locale are skipped and counted, never
    /// created. Review flags are left alone. Returns the report and the locales
    /// that were written to.
    pub fn apply_updates(&mut self, updates: KeyedTranslations) -> (UpdateReport, BTreeSet<String>) {
        let mut report = UpdateReport { updated_keys: 0, skipped: 0 };
        let mut touched = BTreeSet::new();

        for (key, translations) in updates.0 {
            let Some(entry) = self.entries.get_mut(&key) else {
                tracing::debug!(key = %key, "Skipping update of unknown key");
                report.skipped += translations.len();
                continue;
            };

            for (locale, value) in translations {
                if self.locales.binary_search(&locale).is_err() {
                    tracing::debug!(key = %key, locale = %locale, "Skipping update of unknown locale");
                    report.skipped += 1;
                    continue;
                }
                let value = typeset(value, &locale);
                entry.translations.insert(locale.clone(), value);
                touched.insert(locale);
                report.updated_keys += 1;
            }
        }

        (report, touched)
    }

    /// Mark the given keys as reviewed. Returns how many keys exist.
    pub fn mark_checked<S: AsRef<str>>(&mut self, keys: &[S]) -> usize {
        let mut marked = 0;
        for key in keys {
            if let Some(entry) = self.entries.get_mut(key.as_ref()) {
                entry.is_checked = true;
                marked += 1;
            }
        }
        marked
    }

    /// Insert translations, creating keys and locales as needed.
    pub fn add(&mut self, translations: KeyedTranslations) -> AddReport {
        let mut added_keys = 0;
        let mut touched = BTreeSet::new();

        for (key, values) in translations.0 {
            for locale in values.keys() {
                self.insert_locale(locale);
                touched.insert(locale.clone());
            }

            let (entry, created) = self.ensure_entry(&key);
            if created {
                added_keys += 1;
            }
            for (locale, value) in values {
                let value = typeset(value, &locale);
                entry.translations.insert(locale, value);
            }
        }

        AddReport { added_keys, added_locales: touched.into_iter().collect() }
    }

    /// Remove keys starting with `prefix`.
    ///
    /// With a non-empty `locales` list only those locales' values are removed and
    /// every removed value counts once; entries left without any value are
    /// dropped. Without it whole entries are removed and every key counts once.
    /// Returns the report and the locales whose documents changed.
    pub fn remove_prefix(
        &mut self,
        prefix: &str,
        locales: Option<&[String]>,
    ) -> (DeleteReport, BTreeSet<String>) {
        let Some(targets) = locales.filter(|targets| !targets.is_empty()) else {
            let deleted_count = self.retain(|key, _| !key.starts_with(prefix));
            return (DeleteReport { deleted_count }, self.locales.iter().cloned().collect());
        };

        let mut deleted_count = 0;
        let mut touched = BTreeSet::new();
        for (_, entry) in self.entries.iter_mut().filter(|(key, _)| key.starts_with(prefix)) {
            for locale in targets {
                if entry.translations.remove(locale).is_some() {
                    deleted_count += 1;
                    touched.insert(locale.clone());
                }
            }
        }
        self.retain(|key, entry| !key.starts_with(prefix) || !entry.translations.is_empty());

        (DeleteReport { deleted_count }, touched)
    }
}
