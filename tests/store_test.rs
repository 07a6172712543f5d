//! End-to-end behaviour of the translation store against real locale files.

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]
#![allow(missing_docs)]

use std::fs;
use std::num::NonZeroUsize;
use std::path::{
    Path,
    PathBuf,
};

use googletest::prelude::*;
use googletest::matchers::is_empty as empty;
use i18n_catalog_server::codec::{
    TranslationMap,
    TranslationValue,
};
use i18n_catalog_server::config::CatalogSettings;
use i18n_catalog_server::store::{
    KeyedTranslations,
    LocaleFileSet,
    StatusSummary,
    StoreError,
    TranslationStore,
};
use i18n_catalog_server::typography::NBSP;
use pretty_assertions::assert_eq;
use serde_json::{
    Value,
    json,
};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(locales: &[(&str, Value)]) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("locales")).unwrap();
        let workspace = Self { dir };
        for (locale, document) in locales {
            workspace.write_locale(locale, document);
        }
        workspace
    }

    fn locale_path(&self, locale: &str) -> PathBuf {
        self.dir.path().join("locales").join(format!("{locale}.json"))
    }

    fn write_locale(&self, locale: &str, document: &Value) {
        fs::write(self.locale_path(locale), serde_json::to_string_pretty(document).unwrap()).unwrap();
    }

    fn read(&self, path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn read_locale(&self, locale: &str) -> Value {
        self.read(&self.locale_path(locale))
    }

    fn read_status(&self) -> Value {
        self.read(&self.dir.path().join("locales/translation-check.json"))
    }

    async fn open(&self) -> TranslationStore {
        let files = LocaleFileSet::from_settings(&CatalogSettings::default(), self.dir.path()).unwrap();
        let store = TranslationStore::new(files);
        store.reload().await.unwrap();
        store
    }
}

fn keyed(items: &[(&str, &[(&str, &str)])]) -> KeyedTranslations {
    items
        .iter()
        .map(|(key, pairs)| {
            let translations: TranslationMap = pairs
                .iter()
                .map(|(locale, text)| ((*locale).to_string(), TranslationValue::from(*text)))
                .collect();
            ((*key).to_string(), translations)
        })
        .collect()
}

fn en_pl() -> Workspace {
    Workspace::new(&[
        ("en", json!({ "greeting": { "hello": "Hello" } })),
        ("pl", json!({ "greeting": { "hello": "Cześć" } })),
    ])
}

#[tokio::test]
async fn two_locale_catalog_becomes_fully_reviewed() {
    let workspace = en_pl();
    let store = workspace.open().await;

    assert_eq!(store.locales().await, vec!["en".to_string(), "pl".to_string()]);
    assert_eq!(store.unreviewed(10).await.keys().collect::<Vec<_>>(), vec!["greeting.hello"]);

    let report = store.mark_checked(&["greeting.hello"]).await.unwrap();

    assert_eq!(report.marked_count, 1);
    assert_eq!(
        store.status_summary().await,
        StatusSummary { total: 1, missing_translations: 0, waiting_for_check: 0 }
    );
    assert_eq!(workspace.read_status(), json!({ "greeting.hello": true }));
}

#[tokio::test]
async fn update_applies_typography_and_rewrites_only_that_locale() {
    let workspace = en_pl();
    let store = workspace.open().await;
    let en_before = fs::read_to_string(workspace.locale_path("en")).unwrap();

    let report = store.update(keyed(&[("greeting.hello", &[("pl", "Ma 5 lat i 10 kg")])])).await.unwrap();

    assert_eq!(report.updated_keys, 1);
    let expected = format!("Ma 5 lat i{NBSP}10{NBSP}kg");
    assert_eq!(workspace.read_locale("pl"), json!({ "greeting": { "hello": expected } }));
    assert_eq!(fs::read_to_string(workspace.locale_path("en")).unwrap(), en_before);
}

#[tokio::test]
async fn add_creates_unchecked_key_and_new_locale() {
    let workspace = en_pl();
    let store = workspace.open().await;
    let before = store.status_summary().await;

    let report = store
        .add(keyed(&[("greeting.bye", &[("en", "Bye"), ("de", "Tschüss")])]))
        .await
        .unwrap();

    assert_eq!(report.added_keys, 1);
    assert_eq!(report.added_locales, vec!["de".to_string(), "en".to_string()]);
    let after = store.status_summary().await;
    assert_eq!(after.total, before.total + 1);
    assert_eq!(store.entry("greeting.bye").await.map(|e| e.is_checked), Some(false));
    assert_eq!(store.locales().await, vec!["de".to_string(), "en".to_string(), "pl".to_string()]);
    assert_eq!(workspace.read_locale("de"), json!({ "greeting": { "bye": "Tschüss" } }));
    assert_eq!(workspace.read_locale("en"), json!({ "greeting": { "hello": "Hello", "bye": "Bye" } }));
}

#[tokio::test]
async fn delete_by_prefix_locale_scoped_and_whole_key() {
    let workspace = Workspace::new(&[
        ("en", json!({ "menu": { "open": "Open", "close": "Close" }, "title": "Title" })),
        ("pl", json!({ "menu": { "open": "Otwórz" }, "title": "Tytuł" })),
    ]);
    let store = workspace.open().await;
    let locales = vec!["en".to_string()];

    let scoped = store.delete_by_prefix("menu.", Some(&locales)).await.unwrap();

    assert_eq!(scoped.deleted_count, 2);
    assert!(store.entry("menu.close").await.is_none());
    assert!(store.entry("menu.open").await.is_some());
    assert_eq!(workspace.read_locale("en"), json!({ "title": "Title" }));
    assert_eq!(workspace.read_locale("pl"), json!({ "menu": { "open": "Otwórz" }, "title": "Tytuł" }));

    let whole = store.delete_by_prefix("menu", None).await.unwrap();

    assert_eq!(whole.deleted_count, 1);
    assert_eq!(store.status_summary().await.total, 1);
    assert_eq!(workspace.read_locale("pl"), json!({ "title": "Tytuł" }));
}

#[googletest::test]
#[tokio::test]
async fn pages_cover_every_incomplete_key_once() {
    let en: serde_json::Map<String, Value> =
        (0..23).map(|i| (format!("key{i:02}"), Value::String(format!("Text {i}")))).collect();
    let workspace = Workspace::new(&[("en", Value::Object(en)), ("pl", json!({ "key00": "Tekst" }))]);
    let store = workspace.open().await;
    let size = NonZeroUsize::new(5).unwrap();

    let first = store.incomplete(1, size).await;
    let mut keys = Vec::new();
    for page in 1..=first.total_pages {
        keys.extend(store.incomplete(page, size).await.keys.into_iter().map(|entry| entry.key));
    }

    expect_that!(first.count, eq(22));
    expect_that!(first.total_pages, eq(5));
    expect_that!(keys.len(), eq(22));
    expect_that!(keys.first().map(String::as_str), some(eq("key01")));
    expect_that!(store.incomplete(6, size).await.keys, empty());
}

#[tokio::test]
async fn external_edit_invalidates_review() {
    let workspace = en_pl();
    let store = workspace.open().await;
    store.mark_checked(&["greeting.hello"]).await.unwrap();

    workspace.write_locale("en", &json!({ "greeting": { "hello": "Hi there" } }));
    let report = store.reload().await.unwrap();

    assert_eq!(report.invalidated, vec!["greeting.hello".to_string()]);
    assert_eq!(store.entry("greeting.hello").await.map(|e| e.is_checked), Some(false));
    assert_eq!(workspace.read_status(), json!({ "greeting.hello": false }));
}

#[tokio::test]
async fn status_flags_survive_offline_edit_on_restart() {
    let workspace = en_pl();
    {
        let store = workspace.open().await;
        store.mark_checked(&["greeting.hello"]).await.unwrap();
    }

    workspace.write_locale("pl", &json!({ "greeting": { "hello": "Hej" } }));
    let restarted = workspace.open().await;

    assert_eq!(restarted.reviewed_keys().await.count, 1);
    assert_eq!(restarted.entry("greeting.hello").await.unwrap().translations["pl"], TranslationValue::from("Hej"));
}

#[tokio::test]
async fn broken_locale_document_keeps_its_keys_and_reviews() {
    let workspace = Workspace::new(&[
        ("en", json!({ "greeting": { "hello": "Hello" } })),
        ("pl", json!({ "greeting": { "hello": "Cześć" }, "only": { "pl": "Tylko" } })),
    ]);
    let store = workspace.open().await;
    store.mark_checked(&["greeting.hello", "only.pl"]).await.unwrap();
    let intact = fs::read(workspace.locale_path("pl")).unwrap();

    fs::write(workspace.locale_path("pl"), &intact[..intact.len() / 2]).unwrap();
    let broken = store.reload().await.unwrap();

    assert_eq!(broken.failures.len(), 1);
    assert_eq!(broken.locales, vec!["en".to_string(), "pl".to_string()]);
    assert_eq!(store.entry("only.pl").await.map(|e| e.is_checked), Some(true));

    fs::write(workspace.locale_path("pl"), &intact).unwrap();
    let fixed = store.reload().await.unwrap();

    assert_eq!(fixed.invalidated, Vec::<String>::new());
    assert_eq!(store.reviewed_keys().await.count, 2);
}

#[tokio::test]
async fn whole_key_delete_reaches_broken_locale_document() {
    let workspace = en_pl();
    let store = workspace.open().await;
    fs::write(workspace.locale_path("pl"), "{ \"greeting\": ").unwrap();
    store.reload().await.unwrap();

    store.delete_by_prefix("greeting", None).await.unwrap();

    assert_eq!(workspace.read_locale("pl"), json!({}));
    assert_eq!(workspace.read_locale("en"), json!({}));
}

#[tokio::test]
async fn failed_locale_save_keeps_memory_and_other_locales_in_sync() {
    let workspace = en_pl();
    let store = workspace.open().await;
    store.mark_checked(&["greeting.hello"]).await.unwrap();

    let conflict = store.add(keyed(&[("greeting", &[("pl", "Powitanie")])])).await;

    // `greeting` and `greeting.hello` cannot both live in pl.json.
    assert!(matches!(conflict, Err(StoreError::Codec { .. })));
    assert!(store.entry("greeting").await.is_some());

    let update = store.update(keyed(&[("greeting.hello", &[("en", "Hi"), ("pl", "Hej")])])).await;

    assert!(update.is_err());
    assert_eq!(workspace.read_locale("en"), json!({ "greeting": { "hello": "Hi" } }));
    assert_eq!(workspace.read_locale("pl"), json!({ "greeting": { "hello": "Cześć" } }));

    let report = store.reload().await.unwrap();

    assert_eq!(report.invalidated, Vec::<String>::new());
    assert_eq!(store.entry("greeting.hello").await.map(|e| e.is_checked), Some(true));
}

#[tokio::test]
async fn reload_drops_keys_removed_on_disk() {
    let workspace = en_pl();
    let store = workspace.open().await;

    workspace.write_locale("en", &json!({ "other": "Other" }));
    workspace.write_locale("pl", &json!({ "other": "Inne" }));
    let report = store.reload().await.unwrap();

    assert_eq!(report.entries, 1);
    assert!(store.entry("greeting.hello").await.is_none());
}

#[tokio::test]
async fn backup_and_status_files_are_not_locales() {
    let workspace = en_pl();
    fs::write(workspace.dir.path().join("locales/en.bak.json"), r#"{"stale": "x"}"#).unwrap();
    fs::write(workspace.dir.path().join("locales/translation-check.json"), "{}").unwrap();

    let store = workspace.open().await;

    assert_eq!(store.locales().await, vec!["en".to_string(), "pl".to_string()]);
    assert!(store.entry("stale").await.is_none());
}
