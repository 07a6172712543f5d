//! Reloads the catalog when locale documents change on disk.

mod debounce;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use debounce::Debouncer;
use notify::{
    Config,
    Event,
    EventKind,
    RecommendedWatcher,
    RecursiveMode,
    Watcher,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::store::{
    LocaleFileSet,
    TranslationStore,
};

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Cannot prepare watched directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Debounced reload trigger for one store.
///
/// Changes are reported either by the file system watcher started with
/// [`CatalogWatcher::watch_directory`] or by the client through
/// [`CatalogWatcher::notify_change`].
pub struct CatalogWatcher {
    store: Arc<TranslationStore>,
    debouncer: Arc<Debouncer>,
    watcher: Option<RecommendedWatcher>,
    forwarder: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CatalogWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogWatcher")
            .field("dir", &self.store.files().locales_dir())
            .field("debouncer", &self.debouncer)
            .field("watching", &self.watcher.is_some())
            .finish_non_exhaustive()
    }
}

impl CatalogWatcher {
    #[must_use]
    pub fn new(store: Arc<TranslationStore>, window: Duration) -> Self {
        let reload_store = Arc::clone(&store);
        let debouncer = Debouncer::new(window, move || {
            let store = Arc::clone(&reload_store);
            async move {
                match store.reload().await {
                    Ok(report) => {
                        tracing::info!(
                            entries = report.entries,
                            invalidated = report.invalidated.len(),
                            failures = report.failures.len(),
                            "Catalog reloaded after external change"
                        );
                    }
                    Err(error) => tracing::error!("Catalog reload failed: {error}"),
                }
            }
        });

        Self { store, debouncer: Arc::new(debouncer), watcher: None, forwarder: None }
    }

    /// Watch the locale directory, creating it if needed.
    ///
    /// # Errors
    /// [`WatchError::Io`] if the directory cannot be created, [`WatchError::Notify`]
    /// if the platform watcher cannot be started.
    pub fn watch_directory(&mut self) -> Result<(), WatchError> {
        let dir = self.store.files().locales_dir().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| WatchError::Io { path: dir.clone(), source })?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    // The receiver is gone once the watcher is shutting down.
                    let _ = tx.send(event);
                }
                Err(error) => tracing::warn!("File watcher error: {error}"),
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let files = self.store.files().clone();
        let debouncer = Arc::clone(&self.debouncer);
        let forwarder = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if is_catalog_change(&event, &files) {
                    tracing::debug!(paths = ?event.paths, "Locale change detected");
                    debouncer.trigger();
                }
            }
        });

        if let Some(previous) = self.forwarder.replace(forwarder) {
            previous.abort();
        }
        self.watcher = Some(watcher);
        tracing::info!(dir = %dir.display(), "Watching locale directory");
        Ok(())
    }

    /// Schedule a reload as if a locale document had changed.
    pub fn notify_change(&self) {
        self.debouncer.trigger();
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

impl Drop for CatalogWatcher {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        self.debouncer.cancel();
    }
}

/// Whether `event` creates, modifies or removes a locale document.
#[must_use]
pub fn is_catalog_change(event: &Event, files: &LocaleFileSet) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
        && event.paths.iter().any(|path| files.is_locale_file(path))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;
    use std::path::Path;

    use notify::event::{
        AccessKind,
        CreateKind,
        DataChange,
        ModifyKind,
        RemoveKind,
    };
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn file_set(root: &Path) -> LocaleFileSet {
        LocaleFileSet::new(
            root.join("locales"),
            "translation-check.json",
            root.join(".cache/snapshot.json"),
            &["*.bak".to_string()],
        )
        .unwrap()
    }

    #[rstest]
    #[case(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "en.json", true)]
    #[case(EventKind::Create(CreateKind::File), "de.json", true)]
    #[case(EventKind::Remove(RemoveKind::File), "pl.json", true)]
    #[case(EventKind::Access(AccessKind::Read), "en.json", false)]
    #[case(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "translation-check.json", false)]
    #[case(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "en.json.bak", false)]
    fn test_is_catalog_change(#[case] kind: EventKind, #[case] name: &str, #[case] expected: bool) {
        let files = file_set(Path::new("/workspace"));
        let event = Event::new(kind).add_path(PathBuf::from("/workspace/locales").join(name));

        assert_eq!(is_catalog_change(&event, &files), expected);
    }

    async fn wait_until_ready(store: &TranslationStore) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !store.is_ready().await {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn notify_change_reloads_after_window() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(TranslationStore::new(file_set(temp_dir.path())));
        fs::create_dir_all(store.files().locales_dir()).unwrap();
        fs::write(store.files().locale_path("en"), r#"{"a": "A"}"#).unwrap();
        let watcher = CatalogWatcher::new(Arc::clone(&store), Duration::from_millis(20));

        watcher.notify_change();
        assert!(watcher.is_pending());
        wait_until_ready(&store).await;

        assert_eq!(store.status_summary().await.total, 1);
    }

    #[tokio::test]
    async fn watch_directory_creates_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(TranslationStore::new(file_set(temp_dir.path())));
        let mut watcher = CatalogWatcher::new(Arc::clone(&store), Duration::from_millis(20));

        watcher.watch_directory().unwrap();

        assert!(watcher.is_watching());
        assert!(store.files().locales_dir().is_dir());
    }
}
