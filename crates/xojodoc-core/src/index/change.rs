//! Change detection for incremental indexing.

use super::store::DocStore;
use crate::Result;
use std::path::Path;

/// What the store remembers about a page's modification time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoredMtime {
    /// No class was ever stored for the page.
    Missing,
    /// A class exists but its modification time was never recorded.
    Unrecorded,
    /// Modification time, in Unix seconds, observed at the last extraction.
    At(f64),
}

/// Decide whether a page must be extracted again.
pub fn needs_reindex(stored: StoredMtime, observed_mtime: f64) -> bool {
    match stored {
        StoredMtime::Missing | StoredMtime::Unrecorded => true,
        StoredMtime::At(recorded) => observed_mtime > recorded,
    }
}

/// [`needs_reindex`] applied against a store.
pub struct ChangeDetector<'a> {
    store: &'a DocStore,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(store: &'a DocStore) -> Self {
        Self { store }
    }

    pub fn needs_reindex(&self, path: &Path, observed_mtime: f64) -> Result<bool> {
        let stored = self.store.stored_mtime(&path.to_string_lossy())?;
        Ok(needs_reindex(stored, observed_mtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassRecord;

    #[test]
    fn test_needs_reindex_decisions() {
        assert!(needs_reindex(StoredMtime::Missing, 0.0));
        assert!(needs_reindex(StoredMtime::Unrecorded, 0.0));
        assert!(needs_reindex(StoredMtime::At(100.0), 100.5));
        assert!(!needs_reindex(StoredMtime::At(100.0), 100.0));
        assert!(!needs_reindex(StoredMtime::At(100.0), 99.0));
    }

    #[test]
    fn test_detector_reads_store() {
        let mut store = DocStore::open_in_memory().unwrap();
        let record = ClassRecord {
            name: "Timer".to_string(),
            module: "core".to_string(),
            description: String::new(),
            sample_code: None,
            compatibility: None,
            notes: None,
            file_path: "/docs/core/timer.html".to_string(),
        };

        let path = Path::new("/docs/core/timer.html");
        assert!(ChangeDetector::new(&store).needs_reindex(path, 10.0).unwrap());

        store.upsert_class(&record, None).unwrap();
        assert!(ChangeDetector::new(&store).needs_reindex(path, 10.0).unwrap());

        store.upsert_class(&record, Some(10.0)).unwrap();
        let detector = ChangeDetector::new(&store);
        assert!(!detector.needs_reindex(path, 10.0).unwrap());
        assert!(detector.needs_reindex(path, 11.0).unwrap());
    }
}
