//! XojoDoc Core - Offline indexer and search engine for Xojo documentation.
//!
//! The crate turns a tree of HTML class-reference pages into a SQLite database and
//! answers lookups against it. It has no I/O layer of its own beyond the corpus and the
//! database file; the `xojodoc` binary is one host built on top of it.
//!
//! # Example
//!
//! ```rust,no_run
//! use xojodoc_core::{DocConfig, DocLibrary};
//!
//! fn main() -> xojodoc_core::Result<()> {
//!     let library = DocLibrary::new(DocConfig::new("/path/to/html/api", "xojo.db"));
//!
//!     // Only pages modified since the last run are extracted again
//!     let stats = library.build_index(false)?;
//!     println!("{} indexed, {} skipped, {} errors", stats.indexed, stats.skipped, stats.errors);
//!
//!     for hit in library.search("Desktop.Window")? {
//!         println!("{}: {}", hit.qualified_name(), hit.description);
//!     }
//!
//!     if let Some(class) = library.get_class("Graphics")? {
//!         println!("{} methods", class.methods.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod index;
pub mod indexer;
pub mod models;
pub mod search;

mod api;

// Re-export commonly used types
pub use api::DocLibrary;
pub use config::{CorpusConfig, DocConfig, SearchConfig, StoreConfig};
pub use corpus::{CorpusWalker, PageRef};
pub use error::{DocError, Result};
pub use extract::{extract_file, extract_page, ExtractedPage, PageFields};
pub use index::{ChangeDetector, DocStore, StoredMtime};
pub use indexer::{IndexProgress, IndexStats, Indexer, PageOutcome};
pub use models::{
    ClassDetails, ClassRecord, LibraryStats, MethodDetails, MethodRecord, PropertyRecord,
    SearchEntry, SearchHit, StoredClass,
};
pub use search::{SearchOptions, SearchResolver};
