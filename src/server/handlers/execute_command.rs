//! Execute Command handler.

use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::ExecuteCommandParams;

use super::super::backend::Backend;

/// Handle `workspace/executeCommand`.
pub async fn handle_execute_command(
    backend: &Backend,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    tracing::debug!(command = %params.command, "Execute Command request");

    let result = backend.run_command(&params.command, params.arguments).await;
    if let Err(error) = &result {
        tracing::warn!(command = %params.command, code = ?error.code, "{}", error.message);
    }
    result
}
