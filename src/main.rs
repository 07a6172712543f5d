//! Entry point for the translation catalog language server.

use std::path::PathBuf;

use i18n_catalog_server::Backend;
use tower_lsp::{
    LspService,
    Server,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Overrides the directory of the rolling log file.
const LOG_DIR_ENV: &str = "I18N_CATALOG_LOG_DIR";

/// Log to a daily rolling file; stdout carries the protocol.
fn init_logging() -> WorkerGuard {
    let directory = std::env::var_os(LOG_DIR_ENV).map_or_else(std::env::temp_dir, PathBuf::from);
    let file_appender = tracing_appender::rolling::daily(directory, "i18n-catalog-server.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(non_blocking).with_ansi(false).init();

    guard
}

#[tokio::main]
async fn main() {
    let _guard = init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting i18n-catalog-server");

    let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());
    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    tracing::info!("Server stopped");
}
