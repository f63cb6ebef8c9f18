//! SQLite documentation store with FTS5 full-text search.
//!
//! This module provides:
//! - Class, property and method storage in SQLite
//! - The FTS5 search projection kept in step with every write
//! - Query shaping for structured and full-text search
//! - Modification-time change detection for incremental indexing

pub mod change;
mod fts5;
mod query;
mod store;

pub use change::{needs_reindex, ChangeDetector, StoredMtime};
pub use fts5::{SearchIndexConfig, SearchIndexManager, SearchIndexStats};
pub use query::{build_fts5_query, parse_qualified, sanitize_query};
pub use store::DocStore;
