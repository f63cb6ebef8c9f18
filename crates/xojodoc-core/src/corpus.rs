//! Discovery of documentation pages.
//!
//! A corpus is a root directory with one subdirectory per module and one page per class
//! inside it. Only that second level is visited.

use crate::error::{DocError, Result};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// One page found in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub module: String,
    pub path: PathBuf,
}

/// Enumerates `<root>/<module>/<page>.<ext>` in path order.
#[derive(Debug, Clone)]
pub struct CorpusWalker {
    root: PathBuf,
    extension: String,
}

impl CorpusWalker {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the corpus. Each call starts a fresh walk.
    pub fn pages(&self) -> impl Iterator<Item = PageRef> + '_ {
        WalkDir::new(&self.root)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable corpus entry: {}", e);
                    None
                }
            })
            // Symlinked pages are kept; a dangling one fails later as a per-page error
            .filter(|e| (e.file_type().is_file() || e.path_is_symlink()) && !is_hidden(e))
            .filter(|e| self.has_page_extension(e.path()))
            .filter_map(|e| {
                let module = e
                    .path()
                    .parent()?
                    .file_name()?
                    .to_string_lossy()
                    .to_string();
                if module.starts_with('.') {
                    return None;
                }
                Some(PageRef {
                    module,
                    path: e.into_path(),
                })
            })
    }

    fn has_page_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Last modification time of a file, in Unix seconds.
pub fn file_mtime(path: &Path) -> Result<f64> {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| DocError::io_with_path(e, path))?;
    let since_epoch = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| DocError::Other(format!("{}: {}", path.display(), e)))?;
    Ok(since_epoch.as_secs_f64())
}
