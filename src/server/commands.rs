//! `workspace/executeCommand` surface of the catalog.
//!
//! Every command takes a single JSON object in `arguments[0]` (camelCase
//! fields, all optional unless noted) and returns a JSON value. Queries fail
//! with JSON-RPC errors; mutations report failures as
//! `{ "success": false, "error": ... }`.

use std::num::NonZeroUsize;

use serde::de::DeserializeOwned;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
    json,
};
use thiserror::Error;
use tower_lsp::jsonrpc;

use crate::store::{
    KeyedTranslations,
    StoreError,
    TranslationStore,
};

pub const LIST_UNREVIEWED: &str = "catalog.listUnreviewed";
pub const UPDATE: &str = "catalog.update";
pub const MARK_CHECKED: &str = "catalog.markChecked";
pub const LIST_REVIEWED: &str = "catalog.listReviewed";
pub const LIST_INCOMPLETE: &str = "catalog.listIncomplete";
pub const LIST_BY_PREFIX: &str = "catalog.listByPrefix";
pub const ADD: &str = "catalog.add";
pub const STATUS_SUMMARY: &str = "catalog.statusSummary";
pub const DELETE_BY_PREFIX: &str = "catalog.deleteByPrefix";
pub const RELOAD: &str = "catalog.reload";

/// Commands advertised in the server capabilities.
pub const COMMANDS: [&str; 10] = [
    LIST_UNREVIEWED,
    UPDATE,
    MARK_CHECKED,
    LIST_REVIEWED,
    LIST_INCOMPLETE,
    LIST_BY_PREFIX,
    ADD,
    STATUS_SUMMARY,
    DELETE_BY_PREFIX,
    RELOAD,
];

const DEFAULT_UNREVIEWED_LIMIT: usize = 10;
const DEFAULT_PAGE_SIZE: usize = 50;

/// LSP `ServerNotInitialized`.
const SERVER_NOT_INITIALIZED: i64 = -32002;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments for {command}: {message}")]
    InvalidParams { command: &'static str, message: String },

    #[error("No translation catalog is open")]
    NoCatalog,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<CommandError> for jsonrpc::Error {
    fn from(error: CommandError) -> Self {
        let message = error.to_string();
        match error {
            CommandError::UnknownCommand(_) => Self { message: message.into(), ..Self::method_not_found() },
            CommandError::InvalidParams { .. } => Self::invalid_params(message),
            CommandError::NoCatalog => Self {
                code: jsonrpc::ErrorCode::ServerError(SERVER_NOT_INITIALIZED),
                message: message.into(),
                data: None,
            },
            CommandError::Store(_) | CommandError::Serialize(_) => {
                Self { message: message.into(), ..Self::internal_error() }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListUnreviewedArgs {
    #[serde(default = "default_unreviewed_limit")]
    n: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageArgs {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_page_size")]
    page_size: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrefixPageArgs {
    #[serde(default)]
    prefix: String,
    #[serde(flatten)]
    page: PageArgs,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    updates: KeyedTranslations,
}

#[derive(Debug, Deserialize)]
struct AddArgs {
    translations: KeyedTranslations,
}

/// One key or a list of keys.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeyList {
    One(String),
    Many(Vec<String>),
}

impl KeyList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(key) => vec![key],
            Self::Many(keys) => keys,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MarkCheckedArgs {
    keys: KeyList,
}

#[derive(Debug, Deserialize)]
struct DeleteByPrefixArgs {
    prefix: String,
    #[serde(default)]
    locales: Option<Vec<String>>,
}

const fn default_unreviewed_limit() -> usize {
    DEFAULT_UNREVIEWED_LIMIT
}

const fn default_page() -> usize {
    1
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Successful mutation result: the report's fields plus `"success": true`.
#[derive(Debug, Serialize)]
struct Success<T> {
    success: bool,
    #[serde(flatten)]
    report: T,
}

fn mutation_result<T: Serialize>(result: Result<T, StoreError>) -> Result<Value, CommandError> {
    match result {
        Ok(report) => Ok(serde_json::to_value(Success { success: true, report })?),
        Err(error) => {
            tracing::warn!("Mutation failed: {error}");
            Ok(json!({ "success": false, "error": error.to_string() }))
        }
    }
}

/// Parse `arguments[0]`. A missing or `null` argument is read as `{}`.
fn parse_args<T: DeserializeOwned>(command: &'static str, arguments: Vec<Value>) -> Result<T, CommandError> {
    let value = match arguments.into_iter().next() {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };
    serde_json::from_value(value)
        .map_err(|error| CommandError::InvalidParams { command, message: error.to_string() })
}

fn page_size(command: &'static str, page_size: usize) -> Result<NonZeroUsize, CommandError> {
    NonZeroUsize::new(page_size).ok_or_else(|| CommandError::InvalidParams {
        command,
        message: "pageSize must be at least 1".to_string(),
    })
}

/// Run `command` against `store`.
///
/// # Errors
/// [`CommandError::UnknownCommand`] for names outside [`COMMANDS`],
/// [`CommandError::InvalidParams`] for malformed arguments, and
/// [`CommandError::Store`] when a query or reload fails.
pub async fn dispatch(
    store: &TranslationStore,
    command: &str,
    arguments: Vec<Value>,
) -> Result<Value, CommandError> {
    tracing::debug!(command = %command, "Dispatching catalog command");

    match command {
        LIST_UNREVIEWED => {
            let args: ListUnreviewedArgs = parse_args(LIST_UNREVIEWED, arguments)?;
            Ok(serde_json::to_value(store.unreviewed(args.n).await)?)
        }
        LIST_REVIEWED => Ok(serde_json::to_value(store.reviewed_keys().await)?),
        LIST_INCOMPLETE => {
            let args: PageArgs = parse_args(LIST_INCOMPLETE, arguments)?;
            let size = page_size(LIST_INCOMPLETE, args.page_size)?;
            Ok(serde_json::to_value(store.incomplete(args.page, size).await)?)
        }
        LIST_BY_PREFIX => {
            let args: PrefixPageArgs = parse_args(LIST_BY_PREFIX, arguments)?;
            let size = page_size(LIST_BY_PREFIX, args.page.page_size)?;
            Ok(serde_json::to_value(store.by_prefix(&args.prefix, args.page.page, size).await)?)
        }
        STATUS_SUMMARY => Ok(serde_json::to_value(store.status_summary().await)?),
        UPDATE => {
            let args: UpdateArgs = parse_args(UPDATE, arguments)?;
            mutation_result(store.update(args.updates).await)
        }
        MARK_CHECKED => {
            let args: MarkCheckedArgs = parse_args(MARK_CHECKED, arguments)?;
            mutation_result(store.mark_checked(&args.keys.into_vec()).await)
        }
        ADD => {
            let args: AddArgs = parse_args(ADD, arguments)?;
            mutation_result(store.add(args.translations).await)
        }
        DELETE_BY_PREFIX => {
            let args: DeleteByPrefixArgs = parse_args(DELETE_BY_PREFIX, arguments)?;
            mutation_result(store.delete_by_prefix(&args.prefix, args.locales.as_deref()).await)
        }
        RELOAD => mutation_result(store.reload().await),
        unknown => Err(CommandError::UnknownCommand(unknown.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;
    use std::path::Path;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::store::LocaleFileSet;

    async fn loaded_store(root: &Path) -> TranslationStore {
        let dir = root.join("locales");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("en.json"), r#"{"common": {"save": "Save", "cancel": "Cancel"}}"#).unwrap();
        fs::write(dir.join("pl.json"), r#"{"common": {"save": "Zapisz"}}"#).unwrap();
        let files = LocaleFileSet::new(dir, "translation-check.json", root.join("snapshot.json"), &[])
            .unwrap();
        let store = TranslationStore::new(files);
        store.reload().await.unwrap();
        store
    }

    #[tokio::test]
    async fn unknown_command_is_method_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;

        let error = dispatch(&store, "catalog.nope", vec![]).await.unwrap_err();
        let rpc: jsonrpc::Error = error.into();

        assert_eq!(rpc.code, jsonrpc::ErrorCode::MethodNotFound);
        assert!(rpc.message.contains("catalog.nope"));
    }

    #[tokio::test]
    async fn status_summary_without_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;

        let value = dispatch(&store, STATUS_SUMMARY, vec![]).await.unwrap();

        assert_eq!(value, json!({ "total": 2, "missingTranslations": 1, "waitingForCheck": 2 }));
    }

    #[tokio::test]
    async fn list_unreviewed_keeps_catalog_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;

        let value = dispatch(&store, LIST_UNREVIEWED, vec![json!({ "n": 5 })]).await.unwrap();

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["common.save", "common.cancel"]);
    }

    #[rstest]
    #[case(json!("common.save"), 1)]
    #[case(json!(["common.save", "common.cancel", "ghost"]), 2)]
    #[tokio::test]
    async fn mark_checked_accepts_one_or_many(#[case] keys: Value, #[case] expected: usize) {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;

        let value = dispatch(&store, MARK_CHECKED, vec![json!({ "keys": keys })]).await.unwrap();

        assert_eq!(value, json!({ "success": true, "markedCount": expected }));
    }

    #[tokio::test]
    async fn delete_with_empty_prefix_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;

        let value = dispatch(&store, DELETE_BY_PREFIX, vec![json!({ "prefix": "" })]).await.unwrap();

        assert_eq!(value["success"], json!(false));
        assert!(value["error"].as_str().unwrap().contains("prefix"));
        assert_eq!(store.status_summary().await.total, 2);
    }

    #[googletest::test]
    #[tokio::test]
    async fn zero_page_size_is_invalid_params() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;

        let error =
            dispatch(&store, LIST_INCOMPLETE, vec![json!({ "pageSize": 0 })]).await.unwrap_err();

        expect_that!(matches!(error, CommandError::InvalidParams { .. }), eq(true));
    }

    #[tokio::test]
    async fn list_by_prefix_defaults_to_first_page() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;

        let value = dispatch(&store, LIST_BY_PREFIX, vec![json!({ "prefix": "common.s" })])
            .await
            .unwrap();

        assert_eq!(
            value,
            json!({
                "count": 1,
                "totalPages": 1,
                "currentPage": 1,
                "pageSize": 50,
                "keys": { "common.save": { "en": "Save", "pl": "Zapisz" } }
            })
        );
    }

    #[tokio::test]
    async fn update_reports_skipped_pairs() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;
        let updates = json!({ "updates": { "common.save": { "en": "Store", "fr": "Enregistrer" } } });

        let value = dispatch(&store, UPDATE, vec![updates]).await.unwrap();

        assert_eq!(value, json!({ "success": true, "updatedKeys": 1, "skipped": 1 }));
    }

    #[tokio::test]
    async fn failed_save_reports_failure_and_keeps_change() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(temp_dir.path()).await;
        let translations = json!({ "translations": { "common": { "en": "Common" } } });

        let value = dispatch(&store, ADD, vec![translations]).await.unwrap();

        assert_eq!(value["success"], json!(false));
        assert!(value["error"].as_str().unwrap().contains("en"));
        assert!(store.entry("common").await.is_some());
        assert_eq!(store.status_summary().await.total, 3);
    }
}
