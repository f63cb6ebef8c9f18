//! Indexing coordinator.
//!
//! Walks the corpus, skips pages whose modification time has not advanced, extracts the
//! rest and writes each one through the store. A failure on one page is counted and the
//! run moves on; only opening or preparing the store can fail a whole run.

use crate::config::DocConfig;
use crate::corpus::{file_mtime, CorpusWalker, PageRef};
use crate::error::Result;
use crate::extract::extract_file;
use crate::index::{ChangeDetector, DocStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counts from one indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Pages found in the corpus.
    pub total: usize,
    /// Pages extracted and stored.
    pub indexed: usize,
    /// Pages left alone: unchanged since the last run, or holding no class.
    pub skipped: usize,
    /// Pages that failed to read or store.
    pub errors: usize,
}

/// Progress update sent after each page.
#[derive(Debug, Clone)]
pub struct IndexProgress {
    /// Pages processed so far (1-indexed)
    pub current: usize,
    pub total: usize,
    pub path: PathBuf,
    /// Running counts including this page.
    pub stats: IndexStats,
}

/// What happened to a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Indexed { properties: usize, methods: usize },
    /// Modification time has not advanced since the last extraction.
    Unchanged,
    /// The page holds no identifiable class.
    NoData,
}

/// Builds and refreshes the documentation database.
pub struct Indexer {
    config: DocConfig,
}

impl Indexer {
    pub fn new(config: DocConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DocConfig {
        &self.config
    }

    fn walker(&self) -> CorpusWalker {
        CorpusWalker::new(&self.config.docs_root, &self.config.page_extension)
    }

    /// Index every page; with `force`, ignore recorded modification times.
    pub fn build_index(&self, force: bool) -> Result<IndexStats> {
        self.build_index_with_progress(force, |_| {})
    }

    pub fn build_index_with_progress<F>(&self, force: bool, mut on_progress: F) -> Result<IndexStats>
    where
        F: FnMut(&IndexProgress),
    {
        info!(
            "Indexing {} (force={})",
            self.config.docs_root.display(),
            force
        );

        let mut store = DocStore::open(&self.config.database)?;

        // Collect pages first so progress has a total
        let pages: Vec<PageRef> = self.walker().pages().collect();
        let mut stats = IndexStats {
            total: pages.len(),
            ..Default::default()
        };

        for (idx, page) in pages.iter().enumerate() {
            match index_page(&mut store, &page.path, force) {
                Ok(PageOutcome::Indexed {
                    properties,
                    methods,
                }) => {
                    debug!(
                        "Indexed {} ({} properties, {} methods)",
                        page.path.display(),
                        properties,
                        methods
                    );
                    stats.indexed += 1;
                }
                Ok(PageOutcome::Unchanged) => stats.skipped += 1,
                Ok(PageOutcome::NoData) => {
                    warn!("No class data in {}", page.path.display());
                    stats.skipped += 1;
                }
                Err(e) => {
                    warn!("Failed to index {}: {}", page.path.display(), e);
                    stats.errors += 1;
                }
            }

            on_progress(&IndexProgress {
                current: idx + 1,
                total: stats.total,
                path: page.path.clone(),
                stats,
            });
        }

        if stats.indexed > 0 {
            store.optimize_search_index()?;
        }
        store.checkpoint_wal()?;
        store.close()?;

        info!(
            "Indexing complete: {} indexed, {} skipped, {} errors ({} pages)",
            stats.indexed, stats.skipped, stats.errors, stats.total
        );
        Ok(stats)
    }

    /// Re-index the page conventionally holding `module`/`name`.
    ///
    /// Returns `false` when the page is missing, holds no class, or fails to store.
    pub fn update_class(&self, module: &str, name: &str) -> Result<bool> {
        let path = self.config.page_path(module, name);
        if !path.is_file() {
            warn!("No page for {}.{} at {}", module, name, path.display());
            return Ok(false);
        }

        let mut store = DocStore::open(&self.config.database)?;
        let updated = match index_page(&mut store, &path, true) {
            Ok(PageOutcome::Indexed { .. }) => {
                info!("Updated {}.{}", module, name);
                true
            }
            Ok(_) => {
                warn!("No class data in {}", path.display());
                false
            }
            Err(e) => {
                warn!("Failed to update {}.{}: {}", module, name, e);
                false
            }
        };
        store.close()?;
        Ok(updated)
    }

    /// Delete classes whose source page no longer exists.
    pub fn prune_missing(&self) -> Result<usize> {
        let mut store = DocStore::open(&self.config.database)?;

        let mut removed = 0;
        for file_path in store.file_paths()? {
            if Path::new(&file_path).exists() {
                continue;
            }
            removed += store.delete_by_path(&file_path)?;
            debug!("Pruned classes from missing page {}", file_path);
        }

        store.close()?;
        if removed > 0 {
            info!("Pruned {} class(es) with missing pages", removed);
        }
        Ok(removed)
    }
}

/// Run one page through change detection, extraction and storage.
pub fn index_page(store: &mut DocStore, path: &Path, force: bool) -> Result<PageOutcome> {
    let mtime = file_mtime(path)?;
    if !force && !ChangeDetector::new(store).needs_reindex(path, mtime)? {
        return Ok(PageOutcome::Unchanged);
    }

    let Some(page) = extract_file(path)? else {
        return Ok(PageOutcome::NoData);
    };

    store.store_page(&page, Some(mtime))?;
    Ok(PageOutcome::Indexed {
        properties: page.properties.len(),
        methods: page.methods.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"<html><body>
        <h1>Timer</h1>
        <p>Runs code after a period of time.</p>
        <section id="properties"><table>
            <tr><th>Name</th><th>Type</th></tr>
            <tr><td>Period</td><td>Integer</td></tr>
        </table></section>
        <section id="methods"><table>
            <tr><th>Name</th><th>Parameters</th><th>Returns</th></tr>
            <tr><td>Reset</td><td></td><td></td></tr>
        </table></section>
    </body></html>"#;

    fn setup() -> (TempDir, DocConfig) {
        let temp_dir = TempDir::new().unwrap();
        let docs = temp_dir.path().join("docs");
        std::fs::create_dir_all(docs.join("core")).unwrap();
        std::fs::write(docs.join("core").join("timer.html"), PAGE).unwrap();
        let config = DocConfig::new(&docs, temp_dir.path().join("xojo.db"));
        (temp_dir, config)
    }

    #[test]
    fn test_index_page_outcomes() {
        let (_temp, config) = setup();
        let path = config.page_path("core", "Timer");
        let mut store = DocStore::open(&config.database).unwrap();

        assert_eq!(
            index_page(&mut store, &path, false).unwrap(),
            PageOutcome::Indexed {
                properties: 1,
                methods: 1
            }
        );
        assert_eq!(
            index_page(&mut store, &path, false).unwrap(),
            PageOutcome::Unchanged
        );
        assert!(matches!(
            index_page(&mut store, &path, true).unwrap(),
            PageOutcome::Indexed { .. }
        ));

        std::fs::write(&path, "<html><body><p>moved</p></body></html>").unwrap();
        assert_eq!(
            index_page(&mut store, &path, true).unwrap(),
            PageOutcome::NoData
        );
    }

    #[test]
    fn test_index_page_missing_file() {
        let (_temp, config) = setup();
        let mut store = DocStore::open(&config.database).unwrap();
        let path = config.page_path("core", "Missing");
        assert!(index_page(&mut store, &path, true).unwrap_err().is_not_found());
    }

    #[test]
    fn test_build_reports_progress() {
        let (_temp, config) = setup();
        let indexer = Indexer::new(config);

        let mut updates = Vec::new();
        let stats = indexer
            .build_index_with_progress(false, |progress| {
                updates.push((progress.current, progress.total, progress.stats.indexed))
            })
            .unwrap();

        assert_eq!(
            stats,
            IndexStats {
                total: 1,
                indexed: 1,
                skipped: 0,
                errors: 0
            }
        );
        assert_eq!(updates, vec![(1, 1, 1)]);
    }

    #[test]
    fn test_update_class_missing_page() {
        let (_temp, config) = setup();
        let indexer = Indexer::new(config);
        assert!(!indexer.update_class("core", "Missing").unwrap());
        assert!(indexer.update_class("core", "Timer").unwrap());
    }
}
