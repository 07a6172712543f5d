//! Shared state of the language server.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::store::TranslationStore;
use crate::watcher::CatalogWatcher;

/// A loaded store and the watcher keeping it in sync with disk.
///
/// Dropping it stops the watcher.
#[derive(Debug)]
pub struct OpenCatalog {
    pub store: Arc<TranslationStore>,
    pub watcher: CatalogWatcher,
}

/// State shared between handlers.
#[derive(Debug, Clone, Default)]
pub struct ServerState {
    catalog: Arc<Mutex<Option<OpenCatalog>>>,
}

impl ServerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The open store, if any. The lock is released before returning so long
    /// running store operations never block a catalog swap.
    pub async fn store(&self) -> Option<Arc<TranslationStore>> {
        self.catalog.lock().await.as_ref().map(|open| Arc::clone(&open.store))
    }

    /// Install `catalog`, dropping the previous one.
    pub async fn replace(&self, catalog: OpenCatalog) {
        let previous = self.catalog.lock().await.replace(catalog);
        drop(previous);
    }

    pub async fn close(&self) {
        self.catalog.lock().await.take();
    }

    /// Schedule a debounced reload of the open catalog.
    /// Returns `false` when no catalog is open.
    pub async fn notify_change(&self) -> bool {
        let catalog = self.catalog.lock().await;
        let Some(open) = catalog.as_ref() else {
            return false;
        };
        open.watcher.notify_change();
        true
    }
}
