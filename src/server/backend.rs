//! LSP backend hosting the translation catalog.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    DidChangeWatchedFilesParams,
    ExecuteCommandParams,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    MessageType,
};
use tower_lsp::{
    Client,
    LanguageServer,
};

use super::handlers;
use super::state::{
    OpenCatalog,
    ServerState,
};
use crate::config::ConfigManager;
use crate::store::{
    LocaleFileSet,
    TranslationStore,
};
use crate::watcher::CatalogWatcher;

#[derive(Clone)]
pub struct Backend {
    pub client: Client,
    pub config_manager: Arc<Mutex<ConfigManager>>,
    pub state: ServerState,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Backend {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            state: ServerState::new(),
        }
    }

    /// (Re)open the catalog of the configured workspace.
    ///
    /// Loads the store, starts the watcher and replaces the previously open
    /// catalog. Without a workspace root nothing is opened.
    pub(crate) async fn open_catalog(&self) {
        let (settings, workspace_root) = {
            let config_manager = self.config_manager.lock().await;
            (config_manager.get_settings().clone(), config_manager.workspace_root().map(ToOwned::to_owned))
        };

        let Some(workspace_root) = workspace_root else {
            tracing::warn!("No workspace folder; translation catalog not opened");
            self.state.close().await;
            return;
        };

        let files = match LocaleFileSet::from_settings(&settings, &workspace_root) {
            Ok(files) => files,
            Err(error) => {
                self.log(MessageType::ERROR, format!("Cannot open translation catalog: {error}")).await;
                return;
            }
        };

        let store = Arc::new(TranslationStore::new(files));
        match store.reload().await {
            Ok(report) => {
                for failure in &report.failures {
                    self.log(
                        MessageType::WARNING,
                        format!("Skipped {}: {}", failure.file.display(), failure.error),
                    )
                    .await;
                }
                self.log(
                    MessageType::INFO,
                    format!(
                        "Translation catalog loaded: {} keys in {} locales",
                        report.entries,
                        report.locales.len()
                    ),
                )
                .await;
            }
            Err(error) => {
                self.log(MessageType::ERROR, format!("Failed to load translation catalog: {error}"))
                    .await;
            }
        }

        let mut watcher = CatalogWatcher::new(Arc::clone(&store), settings.debounce());
        if settings.watch
            && let Err(error) = watcher.watch_directory()
        {
            self.log(MessageType::WARNING, format!("File watching disabled: {error}")).await;
        }

        self.state.replace(OpenCatalog { store, watcher }).await;
    }

    /// Run a catalog command. The dispatch itself lives in [`super::commands`].
    pub(crate) async fn run_command(&self, command: &str, arguments: Vec<Value>) -> Result<Option<Value>> {
        let Some(store) = self.state.store().await else {
            return Err(super::commands::CommandError::NoCatalog.into());
        };
        super::commands::dispatch(&store, command, arguments).await.map(Some).map_err(Into::into)
    }

    async fn log(&self, level: MessageType, message: String) {
        match level {
            MessageType::ERROR => tracing::error!("{message}"),
            MessageType::WARNING => tracing::warn!("{message}"),
            _ => tracing::info!("{message}"),
        }
        self.client.log_message(level, message).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::lifecycle::handle_initialize(self, params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        handlers::lifecycle::handle_initialized(self, params).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::lifecycle::handle_shutdown(self).await
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handlers::workspace::handle_did_change_configuration(self, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handlers::workspace::handle_did_change_watched_files(self, params).await;
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        handlers::execute_command::handle_execute_command(self, params).await
    }
}
