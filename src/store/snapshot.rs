//! Change detection between reload cycles.
//!
//! The snapshot remembers the translations of the previous cycle. When a
//! reload sees a value the snapshot does not know, the key goes back to
//! unchecked so that a reviewer looks at it again.

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};

use crate::codec::{
    TranslationMap,
    TranslationValue,
};

use super::catalog::{
    Catalog,
    Entry,
};

/// Translations-only projection of the catalog: key -> locale -> value.
pub type Snapshot = BTreeMap<String, TranslationMap>;

/// A locale document that was read and flattened successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub locale: String,
    pub pairs: Vec<(String, TranslationValue)>,
}

#[must_use]
pub fn project(catalog: &Catalog) -> Snapshot {
    catalog.iter().map(|(key, entry)| (key.to_string(), entry.translations.clone())).collect()
}

/// Whether a freshly loaded value was not seen in the previous cycle.
///
/// A key the snapshot lacks is stale, and so is a key the snapshot has
/// without this locale.
#[must_use]
pub fn is_stale(snapshot: &Snapshot, key: &str, locale: &str, value: &TranslationValue) -> bool {
    snapshot.get(key).is_none_or(|previous| previous.get(locale) != Some(value))
}

/// Build the catalog for a new cycle from freshly loaded documents.
///
/// Review flags carry over from `previous`. Checked keys holding a value the
/// snapshot does not know are flipped to unchecked and returned. Surviving
/// keys keep their position in the iteration order.
///
/// Locales listed in `failed` could not be read this cycle. They keep their
/// last known values, taken from `previous` or, before the first load, from
/// the snapshot, so a broken file does not drop its keys.
///
/// `status` is only given on the first load. Its flags are applied after the
/// comparison and win over it; keys it does not list stay unchecked.
#[must_use]
pub fn rebuild(
    previous: &Catalog,
    documents: Vec<LoadedDocument>,
    failed: &[String],
    snapshot: Option<&Snapshot>,
    status: Option<&HashMap<String, bool>>,
) -> (Catalog, Vec<String>) {
    let mut next = Catalog::new();
    for document in &documents {
        next.insert_locale(&document.locale);
    }

    let mut invalidated = Vec::new();
    for LoadedDocument { locale, pairs } in documents {
        for (key, value) in pairs {
            let stale = snapshot.is_some_and(|snapshot| is_stale(snapshot, &key, &locale, &value));
            let entry = carried_entry(&mut next, previous, &key);
            if stale && entry.is_checked {
                entry.is_checked = false;
                invalidated.push(key.clone());
            }
            entry.translations.insert(locale.clone(), value);
        }
    }

    for locale in failed {
        let kept = last_known_values(previous, snapshot, locale);
        if kept.is_empty() && !previous.has_locale(locale) {
            continue;
        }
        next.insert_locale(locale);
        for (key, value) in kept {
            carried_entry(&mut next, previous, &key).translations.insert(locale.clone(), value);
        }
    }

    if let Some(flags) = status {
        next.apply_review_flags(flags);
    }

    next.adopt_order(previous);
    (next, invalidated)
}

/// Entry for `key` in `next`, created with the flag it had in `previous`.
fn carried_entry<'a>(next: &'a mut Catalog, previous: &Catalog, key: &str) -> &'a mut Entry {
    let (entry, created) = next.ensure_entry(key);
    if created {
        entry.is_checked = previous.get(key).is_some_and(|entry| entry.is_checked);
    }
    entry
}

/// Values of `locale` from the previous cycle, or from the snapshot if the
/// previous cycle did not know the locale.
fn last_known_values(
    previous: &Catalog,
    snapshot: Option<&Snapshot>,
    locale: &str,
) -> Vec<(String, TranslationValue)> {
    if previous.has_locale(locale) {
        return previous.locale_pairs(locale);
    }
    snapshot
        .into_iter()
        .flatten()
        .filter_map(|(key, translations)| translations.get(locale).map(|value| (key.clone(), value.clone())))
        .collect()
}

/// Replace the columns of `locales` in `snapshot` with the catalog's values.
///
/// Used when only some locale documents could be written, so that the
/// snapshot matches what is on disk.
#[must_use]
pub fn refresh_locales(mut snapshot: Snapshot, catalog: &Catalog, locales: &BTreeSet<&str>) -> Snapshot {
    for translations in snapshot.values_mut() {
        translations.retain(|locale, _| !locales.contains(locale.as_str()));
    }
    for (key, entry) in catalog.iter() {
        for (locale, value) in &entry.translations {
            if locales.contains(locale.as_str()) {
                snapshot.entry(key.to_string()).or_default().insert(locale.clone(), value.clone());
            }
        }
    }
    snapshot.retain(|_, translations| !translations.is_empty());
    snapshot
}
