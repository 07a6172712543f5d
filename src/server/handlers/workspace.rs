//! Workspace-related handlers.

use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    DidChangeWatchedFilesParams,
};

use super::super::backend::Backend;
use crate::config::{
    CONFIG_FILE_NAME,
    CatalogSettings,
    ServerSettings,
};

pub async fn handle_did_change_configuration(
    backend: &Backend,
    params: DidChangeConfigurationParams,
) {
    tracing::info!(settings = %params.settings, "didChangeConfiguration received");

    let new_settings = serde_json::from_value::<ServerSettings>(params.settings.clone())
        .map(|wrapped| wrapped.i18n_catalog)
        .or_else(|_| serde_json::from_value::<CatalogSettings>(params.settings));

    let new_settings = match new_settings {
        Ok(settings) => settings,
        Err(error) => {
            tracing::error!(%error, "unreadable configuration");
            return;
        }
    };

    let mut config_manager = backend.config_manager.lock().await;
    match config_manager.update_settings(new_settings) {
        Ok(()) => {
            drop(config_manager);
            tracing::info!("configuration updated successfully");

            backend.open_catalog().await;
        }
        Err(error) => {
            tracing::error!(%error, "configuration validation error");
        }
    }
}

pub async fn handle_did_change_watched_files(
    backend: &Backend,
    params: DidChangeWatchedFilesParams,
) {
    let (settings_changed, catalog_changed) = {
        let config_manager = backend.config_manager.lock().await;
        let locales_dir = config_manager
            .workspace_root()
            .map(|root| root.join(&config_manager.get_settings().locales_dir));

        params.changes.iter().filter_map(|change| change.uri.to_file_path().ok()).fold(
            (false, false),
            |(settings, catalog), path| {
                let is_config = path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME);
                let in_catalog = locales_dir.as_ref().is_some_and(|dir| path.starts_with(dir));
                (settings || is_config, catalog || in_catalog)
            },
        )
    };

    if settings_changed {
        tracing::debug!("Configuration file changed");
        let root = backend.config_manager.lock().await.workspace_root().map(ToOwned::to_owned);
        let result = backend.config_manager.lock().await.load_settings(root);
        match result {
            Ok(()) => backend.open_catalog().await,
            Err(error) => tracing::error!(%error, "configuration reload failed"),
        }
    } else if catalog_changed && !backend.state.notify_change().await {
        tracing::debug!("Locale change reported but no catalog is open");
    }
}
