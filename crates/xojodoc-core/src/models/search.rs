//! Search result and full-text projection types.

use super::records::ClassRecord;
use serde::{Deserialize, Serialize};

/// One row of a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    pub module: String,
    pub description: String,
}

impl SearchHit {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

/// The denormalized row mirrored into the full-text index for one class.
///
/// Built only through [`SearchEntry::project`], so what the text index sees can be
/// checked without a database. Its `class_id` doubles as the FTS5 rowid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub class_id: i64,
    pub class_name: String,
    pub module: String,
    pub description: String,
    /// Name, module, description and every member name, space separated.
    pub content: String,
}

impl SearchEntry {
    /// Project a class and the names of its properties and methods into a search entry.
    pub fn project<'a, I>(class_id: i64, class: &ClassRecord, member_names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parts: Vec<&str> = vec![class.name.as_str(), class.module.as_str()];
        if !class.description.is_empty() {
            parts.push(class.description.as_str());
        }
        for name in member_names {
            if !name.is_empty() {
                parts.push(name);
            }
        }

        Self {
            class_id,
            class_name: class.name.clone(),
            module: class.module.clone(),
            description: class.description.clone(),
            content: parts.join(" "),
        }
    }
}
