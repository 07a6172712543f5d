//! LSP lifecycle handlers: `initialize`, `initialized`, `shutdown`.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    ExecuteCommandOptions,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    MessageType,
    ServerCapabilities,
    ServerInfo,
    WorkDoneProgressOptions,
};

use super::super::backend::Backend;
use super::super::commands::COMMANDS;

pub async fn handle_initialize(
    backend: &Backend,
    params: InitializeParams,
) -> Result<InitializeResult> {
    let workspace_root = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|folder| folder.uri.to_file_path().ok());

    let mut config_manager = backend.config_manager.lock().await;
    if let Err(error) = config_manager.load_settings(workspace_root.clone()) {
        backend
            .client
            .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
            .await;
        tracing::error!("Configuration error during initialize: {}", error);
        // Keep the workspace so that the catalog still opens with defaults.
        if let Err(error) = config_manager.load_settings(None) {
            tracing::error!("Default configuration rejected: {error}");
        }
        config_manager.set_workspace_root(workspace_root);
    }
    drop(config_manager);

    Ok(InitializeResult {
        server_info: Some(ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
        capabilities: ServerCapabilities {
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(ToString::to_string).collect(),
                work_done_progress_options: WorkDoneProgressOptions::default(),
            }),
            ..ServerCapabilities::default()
        },
    })
}

pub async fn handle_initialized(backend: &Backend, _: InitializedParams) {
    backend.client.log_message(MessageType::INFO, "initialized!").await;
    backend.open_catalog().await;
}

pub async fn handle_shutdown(backend: &Backend) -> Result<()> {
    backend.state.close().await;
    Ok(())
}
