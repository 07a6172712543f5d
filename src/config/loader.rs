//! Workspace configuration file loader.

use std::io::ErrorKind;
use std::path::Path;

use super::{
    CatalogSettings,
    ConfigError,
    ServerSettings,
};

/// Name of the configuration file at the workspace root.
pub const CONFIG_FILE_NAME: &str = ".i18n-catalog.json";

/// Read `.i18n-catalog.json` from the workspace root.
///
/// The file holds either the catalog settings object itself or the same
/// object wrapped in `{ "i18nCatalog": ... }`, as sent by editor clients.
/// A missing file yields `Ok(None)`.
///
/// # Errors
/// [`ConfigError::IoError`] if the file exists but cannot be read,
/// [`ConfigError::ParseError`] if it is not a settings object.
pub(super) fn load_from_workspace(root: &Path) -> Result<Option<CatalogSettings>, ConfigError> {
    let path = root.join(CONFIG_FILE_NAME);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No catalog configuration file");
            return Ok(None);
        }
        Err(error) => return Err(error.into()),
    };

    let document: serde_json::Value = serde_json::from_str(&content)?;
    let settings = if document.get("i18nCatalog").is_some() {
        serde_json::from_value::<ServerSettings>(document)?.i18n_catalog
    } else {
        serde_json::from_value::<CatalogSettings>(document)?
    };

    tracing::debug!(path = %path.display(), locales_dir = %settings.locales_dir, "Loaded catalog configuration");
    Ok(Some(settings))
}
