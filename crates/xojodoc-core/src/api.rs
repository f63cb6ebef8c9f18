//! High-level entry points for hosts such as the CLI.
//!
//! Every call opens the database, does its work and closes it again, so no handle outlives
//! one logical operation. Read calls never create a database: a missing one is reported as
//! [`crate::DocError::DatabaseNotFound`].

use crate::config::DocConfig;
use crate::error::Result;
use crate::index::DocStore;
use crate::indexer::{IndexProgress, IndexStats, Indexer};
use crate::models::{ClassDetails, LibraryStats, MethodDetails, SearchHit};
use crate::search::{SearchOptions, SearchResolver};

/// A documentation library described by a [`DocConfig`].
pub struct DocLibrary {
    config: DocConfig,
}

impl DocLibrary {
    pub fn new(config: DocConfig) -> Self {
        Self { config }
    }

    /// Load the configuration from a JSON file.
    pub fn from_config_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(DocConfig::load(path)?))
    }

    pub fn config(&self) -> &DocConfig {
        &self.config
    }

    fn indexer(&self) -> Result<Indexer> {
        self.config.validate()?;
        Ok(Indexer::new(self.config.clone()))
    }

    /// Build or refresh the index.
    pub fn build_index(&self, force: bool) -> Result<IndexStats> {
        self.indexer()?.build_index(force)
    }

    pub fn build_index_with_progress<F>(&self, force: bool, on_progress: F) -> Result<IndexStats>
    where
        F: FnMut(&IndexProgress),
    {
        self.indexer()?.build_index_with_progress(force, on_progress)
    }

    /// Re-index a single class page.
    pub fn update_class(&self, module: &str, name: &str) -> Result<bool> {
        self.indexer()?.update_class(module, name)
    }

    /// Remove classes whose page is gone.
    pub fn prune_missing(&self) -> Result<usize> {
        if !self.config.database.is_file() {
            return Ok(0);
        }
        Indexer::new(self.config.clone()).prune_missing()
    }

    fn read<T>(&self, f: impl FnOnce(&SearchResolver<'_>) -> Result<T>) -> Result<T> {
        let store = DocStore::open_existing(&self.config.database)?;
        let result = f(&SearchResolver::new(&store));
        store.close()?;
        result
    }

    /// Search with default options.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.search_with(query, &SearchOptions::default())
    }

    pub fn search_with(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        self.read(|resolver| resolver.search(query, options))
    }

    pub fn list_classes(&self, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        self.read(|resolver| resolver.list_classes(options))
    }

    pub fn get_class(&self, name: &str) -> Result<Option<ClassDetails>> {
        self.read(|resolver| resolver.get_class(name))
    }

    pub fn get_class_in(&self, name: &str, module: &str) -> Result<Option<ClassDetails>> {
        self.read(|resolver| resolver.get_class_in(name, module))
    }

    pub fn get_method(&self, class_name: &str, method_name: &str) -> Result<Option<MethodDetails>> {
        self.read(|resolver| resolver.get_method(class_name, method_name))
    }

    pub fn stats(&self) -> Result<LibraryStats> {
        let store = DocStore::open_existing(&self.config.database)?;
        let stats = store.stats();
        store.close()?;
        stats
    }

    /// Rebuild the full-text projection from the stored classes.
    pub fn rebuild_search_index(&self) -> Result<usize> {
        let store = DocStore::open_existing(&self.config.database)?;
        let count = store.rebuild_search_index();
        store.close()?;
        count
    }
}

impl From<DocConfig> for DocLibrary {
    fn from(config: DocConfig) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocError;
    use tempfile::TempDir;

    #[test]
    fn test_reads_require_database() {
        let temp_dir = TempDir::new().unwrap();
        let library = DocLibrary::new(DocConfig::new(
            temp_dir.path(),
            temp_dir.path().join("xojo.db"),
        ));

        assert!(matches!(
            library.search("graphics"),
            Err(DocError::DatabaseNotFound(_))
        ));
        assert!(library.get_class("Graphics").unwrap_err().is_not_found());
        assert!(!temp_dir.path().join("xojo.db").exists());
        assert_eq!(library.prune_missing().unwrap(), 0);
    }

    #[test]
    fn test_build_requires_docs_root() {
        let temp_dir = TempDir::new().unwrap();
        let library = DocLibrary::new(DocConfig::new(
            temp_dir.path().join("missing"),
            temp_dir.path().join("xojo.db"),
        ));
        assert!(matches!(
            library.build_index(false),
            Err(DocError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_empty_corpus_round() {
        let temp_dir = TempDir::new().unwrap();
        let library = DocLibrary::new(DocConfig::new(
            temp_dir.path(),
            temp_dir.path().join("db").join("xojo.db"),
        ));

        let stats = library.build_index(false).unwrap();
        assert_eq!(stats, IndexStats::default());
        assert!(library.search("anything").unwrap().is_empty());
        assert_eq!(library.stats().unwrap().total_classes, 0);
        assert_eq!(library.rebuild_search_index().unwrap(), 0);
    }
}
