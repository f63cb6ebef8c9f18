//! Data models for XojoDoc.
//!
//! Records produced by the page extractor, rows read back from the store, and the
//! result shapes returned by the search resolver.

mod records;
mod search;

pub use records::*;
pub use search::*;
