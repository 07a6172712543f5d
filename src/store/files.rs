//! On-disk documents of the catalog.
//!
//! One `<locale>.json` per locale in the locale directory, plus the status
//! document next to them and the snapshot somewhere outside.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{
    Map,
    Value,
};

use super::error::StoreError;
use super::snapshot::Snapshot;
use crate::codec::{
    TranslationValue,
    flatten,
};
use crate::config::CatalogSettings;

/// Indentation of locale documents.
const LOCALE_INDENT: &[u8] = b"    ";

/// Indentation of the status and snapshot documents.
const INTERNAL_INDENT: &[u8] = b"  ";

/// Keyed read/write surface over the catalog's files.
#[derive(Debug, Clone)]
pub struct LocaleFileSet {
    locales_dir: PathBuf,
    status_file: String,
    snapshot_path: PathBuf,
    exclude: GlobSet,
}

impl LocaleFileSet {
    /// # Errors
    /// Returns [`StoreError::Pattern`] if an exclude pattern is not a valid glob.
    pub fn new(
        locales_dir: impl Into<PathBuf>,
        status_file: impl Into<String>,
        snapshot_path: impl Into<PathBuf>,
        exclude_patterns: &[String],
    ) -> Result<Self, StoreError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude_patterns {
            let glob = Glob::new(pattern)
                .map_err(|source| StoreError::Pattern { pattern: pattern.clone(), source })?;
            builder.add(glob);
        }
        let exclude = builder
            .build()
            .map_err(|source| StoreError::Pattern { pattern: exclude_patterns.join(","), source })?;

        Ok(Self {
            locales_dir: locales_dir.into(),
            status_file: status_file.into(),
            snapshot_path: snapshot_path.into(),
            exclude,
        })
    }

    /// Resolve the configured paths against `workspace_root`.
    ///
    /// # Errors
    /// Returns [`StoreError::Pattern`] if an exclude pattern is not a valid glob.
    pub fn from_settings(settings: &CatalogSettings, workspace_root: &Path) -> Result<Self, StoreError> {
        Self::new(
            workspace_root.join(&settings.locales_dir),
            settings.status_file.clone(),
            workspace_root.join(&settings.snapshot_file),
            &settings.exclude_patterns,
        )
    }

    #[must_use]
    pub fn locales_dir(&self) -> &Path {
        &self.locales_dir
    }

    #[must_use]
    pub fn status_path(&self) -> PathBuf {
        self.locales_dir.join(&self.status_file)
    }

    #[must_use]
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    #[must_use]
    pub fn locale_path(&self, locale: &str) -> PathBuf {
        self.locales_dir.join(format!("{locale}.json"))
    }

    /// Whether `path` names a locale document: a `.json` file that is neither
    /// the status document nor excluded as a backup.
    #[must_use]
    pub fn is_locale_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };

        path.extension().is_some_and(|ext| ext == "json")
            && name != self.status_file
            && !self.exclude.is_match(name)
    }

    /// Locale documents in the locale directory, sorted by locale.
    ///
    /// A missing directory yields an empty list.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the directory cannot be listed.
    pub async fn enumerate(&self) -> Result<Vec<(String, PathBuf)>, StoreError> {
        let mut reader = match tokio::fs::read_dir(&self.locales_dir).await {
            Ok(reader) => reader,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::warn!(dir = %self.locales_dir.display(), "Locale directory does not exist");
                return Ok(Vec::new());
            }
            Err(error) => return Err(StoreError::io(&self.locales_dir, error)),
        };

        let mut documents = Vec::new();
        while let Some(entry) =
            reader.next_entry().await.map_err(|e| StoreError::io(&self.locales_dir, e))?
        {
            let path = entry.path();
            if !entry.file_type().await.is_ok_and(|ft| ft.is_file()) || !self.is_locale_file(&path) {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string) else {
                continue;
            };
            documents.push((locale, path));
        }

        documents.sort();
        Ok(documents)
    }

    /// Read and flatten one locale document.
    ///
    /// # Errors
    /// [`StoreError::Io`] on read failure, [`StoreError::Json`] if the file is not a JSON object.
    pub async fn read_locale(&self, path: &Path) -> Result<Vec<(String, TranslationValue)>, StoreError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| StoreError::io(path, e))?;
        let document: Map<String, Value> =
            serde_json::from_str(&content).map_err(|e| StoreError::json(path, e))?;
        Ok(flatten(&document))
    }

    /// # Errors
    /// Returns [`StoreError::Io`] if the document cannot be written.
    pub async fn write_locale(&self, locale: &str, document: &Map<String, Value>) -> Result<(), StoreError> {
        let path = self.locale_path(locale);
        write_json(&path, document, LOCALE_INDENT).await?;
        tracing::debug!(locale = %locale, path = %path.display(), "Locale document written");
        Ok(())
    }

    /// Review flags by key. A missing status document yields no flags.
    ///
    /// # Errors
    /// [`StoreError::Io`] or [`StoreError::Json`] if the document exists but is unreadable.
    pub async fn read_status(&self) -> Result<HashMap<String, bool>, StoreError> {
        let path = self.status_path();
        match read_optional(&path).await? {
            Some(content) => serde_json::from_str(&content).map_err(|e| StoreError::json(&path, e)),
            None => Ok(HashMap::new()),
        }
    }

    /// # Errors
    /// Returns [`StoreError::Io`] if the document cannot be written.
    pub async fn write_status(&self, status: &Map<String, Value>) -> Result<(), StoreError> {
        write_json(&self.status_path(), status, INTERNAL_INDENT).await
    }

    /// The previous cycle's snapshot, `None` if there is none yet.
    ///
    /// # Errors
    /// [`StoreError::Io`] or [`StoreError::Json`] if the snapshot exists but is unreadable.
    pub async fn read_snapshot(&self) -> Result<Option<Snapshot>, StoreError> {
        let Some(content) = read_optional(&self.snapshot_path).await? else {
            return Ok(None);
        };
        serde_json::from_str(&content).map(Some).map_err(|e| StoreError::json(&self.snapshot_path, e))
    }

    /// # Errors
    /// Returns [`StoreError::Io`] if the snapshot cannot be written.
    pub async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        write_json(&self.snapshot_path, snapshot, INTERNAL_INDENT).await
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(StoreError::io(path, error)),
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, indent: &[u8]) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent));
    value.serialize(&mut serializer).map_err(|e| StoreError::json(path, e))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| StoreError::io(parent, e))?;
    }
    tokio::fs::write(path, buffer).await.map_err(|e| StoreError::io(path, e))
}
