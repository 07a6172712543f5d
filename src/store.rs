//! The translation store.
//!
//! [`TranslationStore`] owns the catalog and serializes every query, mutation
//! and reload cycle behind one async mutex held across the operation's I/O.

mod catalog;
mod error;
mod files;
mod page;
mod report;
mod snapshot;

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use futures::future::join_all;
use serde_json::{
    Map,
    Value,
};
use tokio::sync::Mutex;

pub use catalog::{
    Catalog,
    Entry,
};
pub use error::StoreError;
pub use files::LocaleFileSet;
pub use page::Page;
pub use report::{
    AddReport,
    DeleteReport,
    FileFailure,
    IncompleteEntry,
    KeyedTranslations,
    MarkReport,
    ReloadReport,
    ReviewedKeys,
    StatusSummary,
    UpdateReport,
};
pub use snapshot::{
    LoadedDocument,
    Snapshot,
};

use crate::codec::unflatten;

/// Lifecycle of the in-memory catalog.
///
/// `Loading` and `Reloading` only exist while the gate is held, so they are not
/// represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    /// Nothing has been loaded yet; mutations are refused.
    Uninitialized,
    /// At least one reload completed.
    Ready,
}

/// Everything guarded by the store's gate.
#[derive(Debug)]
struct StoreState {
    /// The key/locale matrix.
    catalog: Catalog,
    /// Whether the catalog has been loaded.
    phase: LoadPhase,
}

/// Multi-locale translation catalog backed by one JSON document per locale.
#[derive(Debug)]
pub struct TranslationStore {
    /// Where locale, status and snapshot documents live.
    files: LocaleFileSet,
    /// Catalog and load phase behind one async mutex.
    state: Mutex<StoreState>,
}

impl TranslationStore {
    /// Create an empty store over `files`. Nothing is read until [`Self::reload`].
    #[must_use]
    pub fn new(files: LocaleFileSet) -> Self {
        Self {
            files,
            state: Mutex::new(StoreState { catalog: Catalog::new(), phase: LoadPhase::Uninitialized }),
        }
    }

    #[must_use]
    pub const fn files(&self) -> &LocaleFileSet {
        &self.files
    }

    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.phase == LoadPhase::Ready
    }

    /// Rebuild the catalog from the locale documents on disk.
    ///
    /// Malformed documents are reported and their locale keeps its last known
    /// values; the other documents still load. Checked keys whose text differs
    /// from the previous snapshot are flipped back to unchecked and the status
    /// document is rewritten. On the first load the status document's flags are
    /// applied afterwards.
    ///
    /// # Errors
    /// [`StoreError::Io`] if the locale directory cannot be listed or the snapshot
    /// or status document cannot be written.
    pub async fn reload(&self) -> Result<ReloadReport, StoreError> {
        let mut state = self.state.lock().await;
        let first_load = state.phase == LoadPhase::Uninitialized;
        tracing::info!(dir = %self.files.locales_dir().display(), first_load, "Loading translation catalog");

        let previous_snapshot = self.files.read_snapshot().await.unwrap_or_else(|error| {
            tracing::warn!("Ignoring unreadable snapshot: {error}");
            None
        });
        let status = if first_load {
            let flags = self.files.read_status().await.unwrap_or_else(|error| {
                tracing::warn!("Ignoring unreadable status document: {error}");
                Default::default()
            });
            Some(flags)
        } else {
            None
        };

        let documents = self.files.enumerate().await?;
        let results = join_all(documents.iter().map(|(locale, path)| async move {
            (locale, path, self.files.read_locale(path).await)
        }))
        .await;

        let mut loaded = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        let mut failed_locales = Vec::new();
        for (locale, path, result) in results {
            match result {
                Ok(pairs) => {
                    tracing::debug!(locale = %locale, keys = pairs.len(), "Locale document loaded");
                    loaded.push(LoadedDocument { locale: locale.clone(), pairs });
                }
                Err(error) => {
                    tracing::warn!(file = %path.display(), "Skipping locale document: {error}");
                    failures.push(FileFailure { file: path.clone(), error: error.to_string() });
                    failed_locales.push(locale.clone());
                }
            }
        }

        let (catalog, invalidated) = snapshot::rebuild(
            &state.catalog,
            loaded,
            &failed_locales,
            previous_snapshot.as_ref(),
            status.as_ref(),
        );
        state.catalog = catalog;
        state.phase = LoadPhase::Ready;

        self.files.write_snapshot(&snapshot::project(&state.catalog)).await?;
        if !invalidated.is_empty() {
            tracing::info!(count = invalidated.len(), "Review invalidated by external changes");
            self.write_status(&state.catalog).await?;
        }

        let report = ReloadReport {
            locales: state.catalog.locales().to_vec(),
            entries: state.catalog.len(),
            invalidated,
            failures,
        };
        tracing::info!(
            locales = report.locales.len(),
            entries = report.entries,
            failures = report.failures.len(),
            "Translation catalog ready"
        );
        Ok(report)
    }

    pub async fn locales(&self) -> Vec<String> {
        self.state.lock().await.catalog.locales().to_vec()
    }

    pub async fn entry(&self, key: &str) -> Option<Entry> {
        self.state.lock().await.catalog.get(key).cloned()
    }

    /// Up to `limit` entries awaiting review, in catalog order.
    pub async fn unreviewed(&self, limit: usize) -> KeyedTranslations {
        self.state.lock().await.catalog.unreviewed(limit)
    }

    pub async fn reviewed_keys(&self) -> ReviewedKeys {
        self.state.lock().await.catalog.reviewed_keys()
    }

    pub async fn incomplete(&self, page: usize, page_size: NonZeroUsize) -> Page<Vec<IncompleteEntry>> {
        let entries = self.state.lock().await.catalog.incomplete();
        Page::paginate(entries, page, page_size)
    }

    pub async fn by_prefix(
        &self,
        prefix: &str,
        page: usize,
        page_size: NonZeroUsize,
    ) -> Page<KeyedTranslations> {
        let entries = self.state.lock().await.catalog.with_prefix(prefix);
        Page::paginate(entries, page, page_size).map(KeyedTranslations)
    }

    pub async fn status_summary(&self) -> StatusSummary {
        self.state.lock().await.catalog.summary()
    }

    /// Overwrite existing values and persist the locales that changed.
    ///
    /// # Errors
    /// [`StoreError::NotReady`] before the first load, or a persistence error.
    /// The in-memory change is kept when persistence fails.
    pub async fn update(&self, updates: KeyedTranslations) -> Result<UpdateReport, StoreError> {
        let mut state = self.state.lock().await;
        ensure_ready(&state)?;

        let (report, touched) = state.catalog.apply_updates(updates);
        tracing::info!(updated = report.updated_keys, skipped = report.skipped, "Applied translation updates");

        self.persist(&state.catalog, &touched).await?;
        Ok(report)
    }

    /// # Errors
    /// [`StoreError::NotReady`] before the first load, or a persistence error.
    pub async fn mark_checked<S: AsRef<str>>(&self, keys: &[S]) -> Result<MarkReport, StoreError> {
        let mut state = self.state.lock().await;
        ensure_ready(&state)?;

        let marked_count = state.catalog.mark_checked(keys);
        tracing::info!(marked = marked_count, requested = keys.len(), "Marked keys as reviewed");

        self.write_status(&state.catalog).await?;
        Ok(MarkReport { marked_count })
    }

    /// Insert translations, creating keys and locales, then persist every locale.
    ///
    /// # Errors
    /// [`StoreError::NotReady`] before the first load, or a persistence error.
    pub async fn add(&self, translations: KeyedTranslations) -> Result<AddReport, StoreError> {
        let mut state = self.state.lock().await;
        ensure_ready(&state)?;

        let report = state.catalog.add(translations);
        tracing::info!(added = report.added_keys, locales = ?report.added_locales, "Added translations");

        let every_locale: BTreeSet<String> = state.catalog.locales().iter().cloned().collect();
        self.persist(&state.catalog, &every_locale).await?;
        Ok(report)
    }

    /// Remove keys starting with `prefix`, for all locales or only the given ones.
    ///
    /// An empty or absent `locales` list removes whole keys.
    ///
    /// # Errors
    /// [`StoreError::InvalidArgument`] for an empty prefix, checked before anything
    /// else. [`StoreError::NotReady`] before the first load, or a persistence error.
    pub async fn delete_by_prefix(
        &self,
        prefix: &str,
        locales: Option<&[String]>,
    ) -> Result<DeleteReport, StoreError> {
        if prefix.is_empty() {
            return Err(StoreError::InvalidArgument("prefix must not be empty".to_string()));
        }

        let mut state = self.state.lock().await;
        ensure_ready(&state)?;

        let (report, touched) = state.catalog.remove_prefix(prefix, locales);
        tracing::info!(prefix = %prefix, deleted = report.deleted_count, "Deleted translations");

        self.persist(&state.catalog, &touched).await?;
        Ok(report)
    }

    /// Write the given locale documents, then the snapshot, then the status.
    ///
    /// A locale that fails to write does not stop the others. The snapshot is
    /// refreshed for the locales that were written, so that a reload triggered
    /// by our own writes does not take them for external edits. The first
    /// failure is returned once everything else is on disk.
    async fn persist(&self, catalog: &Catalog, locales: &BTreeSet<String>) -> Result<(), StoreError> {
        let mut written = BTreeSet::new();
        let mut first_error = None;
        for locale in locales {
            match self.write_locale(catalog, locale).await {
                Ok(()) => {
                    written.insert(locale.as_str());
                }
                Err(error) => {
                    tracing::error!("Failed to persist locale '{locale}': {error}");
                    first_error.get_or_insert(error);
                }
            }
        }

        if !written.is_empty() {
            let on_disk = if first_error.is_none() {
                snapshot::project(catalog)
            } else {
                let previous = self.files.read_snapshot().await.unwrap_or_else(|error| {
                    tracing::warn!("Ignoring unreadable snapshot: {error}");
                    None
                });
                snapshot::refresh_locales(previous.unwrap_or_default(), catalog, &written)
            };
            self.files.write_snapshot(&on_disk).await?;
        }
        self.write_status(catalog).await?;

        first_error.map_or(Ok(()), Err)
    }

    /// Nest and write one locale's values.
    async fn write_locale(&self, catalog: &Catalog, locale: &str) -> Result<(), StoreError> {
        let document = unflatten(catalog.locale_pairs(locale))
            .map_err(|source| StoreError::Codec { locale: locale.to_string(), source })?;
        self.files.write_locale(locale, &document).await
    }

    /// Write the review flag of every key.
    async fn write_status(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let status: Map<String, Value> =
            catalog.review_flags().map(|(key, checked)| (key.to_string(), Value::Bool(checked))).collect();
        self.files.write_status(&status).await.inspect_err(|error| {
            tracing::error!("Failed to persist review status: {error}");
        })
    }
}

/// Refuse mutations until the first load completed.
fn ensure_ready(state: &StoreState) -> Result<(), StoreError> {
    match state.phase {
        LoadPhase::Ready => Ok(()),
        LoadPhase::Uninitialized => Err(StoreError::NotReady),
    }
}
