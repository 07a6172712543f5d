use std::path::Path;
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "excludePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shape of `workspace/didChangeConfiguration` payloads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub i18n_catalog: CatalogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSettings {
    /// Directory holding one `<locale>.json` per locale, relative to the workspace root.
    pub locales_dir: String,

    /// File name of the review status document inside `locales_dir`.
    pub status_file: String,

    /// Location of the change-detection snapshot, relative to the workspace root.
    /// Must live outside `locales_dir`.
    pub snapshot_file: String,

    /// Globs matched against file names in `locales_dir`; matching files are
    /// never treated as locale documents.
    pub exclude_patterns: Vec<String>,

    /// Quiescence window of the change watcher.
    pub debounce_ms: u64,

    pub watch: bool,
}

impl CatalogSettings {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// # Errors
    /// - Required field is empty
    /// - Status file is not a `.json` file
    /// - Snapshot placed inside the locale directory
    /// - Invalid glob pattern
    /// - Zero debounce window
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.locales_dir.is_empty() {
            errors.push(ValidationError::new(
                "localesDir",
                "The directory cannot be empty. Example: \"locales\"",
            ));
        }

        if self.status_file.is_empty() {
            errors.push(ValidationError::new(
                "statusFile",
                "The file name cannot be empty. Example: \"translation-check.json\"",
            ));
        } else if !self.status_file.ends_with(".json") {
            errors.push(ValidationError::new(
                "statusFile",
                format!("The status file must be a .json file, got '{}'", self.status_file),
            ));
        }

        if self.snapshot_file.is_empty() {
            errors.push(ValidationError::new(
                "snapshotFile",
                "The file cannot be empty. Example: \".i18n-catalog/snapshot.json\"",
            ));
        } else if !self.locales_dir.is_empty()
            && Path::new(&self.snapshot_file).starts_with(&self.locales_dir)
        {
            errors.push(ValidationError::new(
                "snapshotFile",
                "The snapshot must live outside 'localesDir', or it would be loaded as a locale",
            ));
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.debounce_ms == 0 {
            errors.push(ValidationError::new(
                "debounceMs",
                "The debounce window must be at least 1 millisecond",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            locales_dir: "locales".to_string(),
            status_file: "translation-check.json".to_string(),
            snapshot_file: ".i18n-catalog/snapshot.json".to_string(),
            exclude_patterns: ["*.bak", "*.bak.json", "*.backup.json", "*.orig.json", "*~"]
                .map(String::from)
                .to_vec(),
            debounce_ms: 500,
            watch: true,
        }
    }
}
