//! Centralized configuration for XojoDoc.
//!
//! Constants for the store, corpus layout and search live on unit structs. The
//! user-supplied paths are read into [`DocConfig`] from a JSON file or built directly.

use crate::error::{DocError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Structured store configuration.
pub struct StoreConfig;

impl StoreConfig {
    pub const DB_FILENAME: &'static str = "xojo.db";
    pub const SEARCH_TABLE: &'static str = "search_index";
    pub const SEARCH_TOKENIZER: &'static str = "unicode61 remove_diacritics 1";
    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Documentation corpus layout.
pub struct CorpusConfig;

impl CorpusConfig {
    pub const PAGE_EXTENSION: &'static str = "html";
    /// Modules whose name starts with this prefix hold retired classes.
    pub const DEPRECATED_MODULE_PREFIX: &'static str = "deprecated";
}

/// Search defaults.
pub struct SearchConfig;

impl SearchConfig {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const BROWSE_LIMIT: usize = 100;
    pub const WILDCARD: char = '*';
}

fn default_database() -> PathBuf {
    PathBuf::from(StoreConfig::DB_FILENAME)
}

fn default_page_extension() -> String {
    CorpusConfig::PAGE_EXTENSION.to_string()
}

/// Paths the engine needs at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocConfig {
    /// Directory whose subdirectories are modules holding one page per class.
    pub docs_root: PathBuf,
    /// SQLite database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Extension of documentation pages, without the dot.
    #[serde(default = "default_page_extension")]
    pub page_extension: String,
}

impl DocConfig {
    pub fn new(docs_root: impl Into<PathBuf>, database: impl Into<PathBuf>) -> Self {
        Self {
            docs_root: docs_root.into(),
            database: database.into(),
            page_extension: default_page_extension(),
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// Relative paths inside the file are resolved against the file's own directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| DocError::io_with_path(e, path))?;

        let mut config: DocConfig = serde_json::from_str(&content).map_err(|e| DocError::Json {
            message: format!("Failed to parse config from {}: {}", path.display(), e),
            source: Some(e),
        })?;

        if let Some(base) = path.parent() {
            config.docs_root = resolve_against(base, &config.docs_root);
            config.database = resolve_against(base, &config.database);
        }

        Ok(config)
    }

    /// Check that the configuration can drive an indexing run.
    pub fn validate(&self) -> Result<()> {
        if self.page_extension.trim().is_empty() {
            return Err(DocError::Validation {
                field: "page_extension".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.database.as_os_str().is_empty() {
            return Err(DocError::Config {
                message: "database path is empty".to_string(),
            });
        }
        if !self.docs_root.is_dir() {
            return Err(DocError::NotADirectory(self.docs_root.clone()));
        }
        Ok(())
    }

    /// Conventional location of a class page: `<docs_root>/<module>/<lowercased name>.<ext>`.
    pub fn page_path(&self, module: &str, class_name: &str) -> PathBuf {
        self.docs_root.join(module).join(format!(
            "{}.{}",
            class_name.to_lowercase(),
            self.page_extension
        ))
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() && !base.as_os_str().is_empty() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Whether a module name refers to retired documentation.
pub fn is_deprecated_module(module: &str) -> bool {
    module
        .to_lowercase()
        .starts_with(CorpusConfig::DEPRECATED_MODULE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_applies_defaults_and_resolves_paths() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("xojodoc.json");
        std::fs::write(&config_path, r#"{ "docs_root": "html/api" }"#).unwrap();

        let config = DocConfig::load(&config_path).unwrap();
        assert_eq!(config.docs_root, temp_dir.path().join("html/api"));
        assert_eq!(config.database, temp_dir.path().join("xojo.db"));
        assert_eq!(config.page_extension, "html");
    }

    #[test]
    fn test_load_keeps_absolute_paths() {
        let temp_dir = TempDir::new().unwrap();
        let docs = temp_dir.path().join("docs");
        let config_path = temp_dir.path().join("xojodoc.json");
        let json = serde_json::json!({
            "docs_root": docs,
            "database": "/var/lib/xojodoc/xojo.db",
            "page_extension": "htm",
        });
        std::fs::write(&config_path, json.to_string()).unwrap();

        let config = DocConfig::load(&config_path).unwrap();
        assert_eq!(config.docs_root, docs);
        assert_eq!(config.database, PathBuf::from("/var/lib/xojodoc/xojo.db"));
        assert_eq!(config.page_extension, "htm");
    }

    #[test]
    fn test_load_missing_file() {
        let err = DocConfig::load("/nonexistent/xojodoc.json").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("xojodoc.json");
        std::fs::write(&config_path, "docs_root = html").unwrap();

        assert!(matches!(
            DocConfig::load(&config_path),
            Err(DocError::Json { .. })
        ));
    }

    #[test]
    fn test_validate() {
        let temp_dir = TempDir::new().unwrap();
        let config = DocConfig::new(temp_dir.path(), temp_dir.path().join("xojo.db"));
        assert!(config.validate().is_ok());

        let missing = DocConfig::new(temp_dir.path().join("missing"), "xojo.db");
        assert!(matches!(
            missing.validate(),
            Err(DocError::NotADirectory(_))
        ));

        let mut no_ext = config.clone();
        no_ext.page_extension = " ".to_string();
        assert!(matches!(
            no_ext.validate(),
            Err(DocError::Validation { .. })
        ));
    }

    #[test]
    fn test_page_path_lowercases_class_name() {
        let config = DocConfig::new("/docs", "xojo.db");
        assert_eq!(
            config.page_path("desktop", "DesktopWindow"),
            PathBuf::from("/docs/desktop/desktopwindow.html")
        );
    }

    #[test]
    fn test_is_deprecated_module() {
        assert!(is_deprecated_module("deprecated"));
        assert!(is_deprecated_module("Deprecated_Classes"));
        assert!(!is_deprecated_module("graphics"));
    }
}
