//! Holds the active settings and the workspace they apply to.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    CatalogSettings,
    ConfigError,
    loader,
};

#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    current_settings: CatalogSettings,
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: CatalogSettings::default(), workspace_root: None }
    }

    /// Load and validate the settings of `workspace_root`.
    ///
    /// Falls back to defaults when there is no workspace or no configuration file.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation error
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        let settings = match workspace_root.as_deref() {
            Some(root) => loader::load_from_workspace(root)?.unwrap_or_default(),
            None => CatalogSettings::default(),
        };
        settings.validate().map_err(ConfigError::ValidationErrors)?;

        tracing::info!(
            root = ?workspace_root,
            locales_dir = %settings.locales_dir,
            watch = settings.watch,
            "Catalog settings loaded"
        );
        self.current_settings = settings;
        self.workspace_root = workspace_root;
        Ok(())
    }

    /// Replace the settings, e.g. from `workspace/didChangeConfiguration`.
    ///
    /// # Errors
    /// Validation error; the previous settings stay active.
    pub fn update_settings(&mut self, new_settings: CatalogSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(?new_settings, "Catalog settings replaced");
        self.current_settings = new_settings;
        Ok(())
    }

    #[must_use]
    pub const fn get_settings(&self) -> &CatalogSettings {
        &self.current_settings
    }

    /// Set the workspace without reading its configuration file.
    pub fn set_workspace_root(&mut self, workspace_root: Option<PathBuf>) {
        self.workspace_root = workspace_root;
    }

    #[must_use]
    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::loader::CONFIG_FILE_NAME;

    #[rstest]
    fn test_new_creates_default_settings() {
        let manager = ConfigManager::new();

        assert_eq!(manager.get_settings().locales_dir, "locales");
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn test_load_settings_without_workspace() {
        let mut manager = ConfigManager::new();

        let result = manager.load_settings(None);

        assert!(result.is_ok());
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn test_load_settings_with_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), r#"{"statusFile": "review.json"}"#)
            .unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(result.is_ok());
        assert_eq!(manager.get_settings().status_file, "review.json");
        assert_eq!(manager.workspace_root(), Some(temp_dir.path()));
    }

    #[rstest]
    fn test_load_settings_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), r#"{"debounceMs": 0}"#).unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn test_update_settings_valid() {
        let mut manager = ConfigManager::new();
        let new_settings = CatalogSettings { watch: false, ..CatalogSettings::default() };

        let result = manager.update_settings(new_settings);

        assert!(result.is_ok());
        assert!(!manager.get_settings().watch);
    }

    #[rstest]
    fn test_update_settings_invalid() {
        let mut manager = ConfigManager::new();
        let new_settings = CatalogSettings { locales_dir: String::new(), ..CatalogSettings::default() };

        let result = manager.update_settings(new_settings);

        assert!(result.is_err());
        assert_eq!(manager.get_settings().locales_dir, "locales");
    }
}
