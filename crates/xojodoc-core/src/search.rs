//! Search resolver.
//!
//! Queries are answered in two tiers and the first tier with results wins:
//! 1. `Module.Class` queries match the module by substring and the class name by prefix,
//!    both case-insensitively.
//! 2. Everything else goes to the FTS5 projection with prefix matching on every term.

use crate::config::{is_deprecated_module, SearchConfig};
use crate::error::Result;
use crate::index::{build_fts5_query, parse_qualified, DocStore};
use crate::models::{ClassDetails, MethodDetails, SearchHit, StoredClass};
use rusqlite::{params, Row};
use std::collections::HashSet;
use tracing::{debug, error};

/// Result shaping shared by search and browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of hits; `None` returns everything.
    pub limit: Option<usize>,
    /// Keep classes from deprecated modules.
    pub include_deprecated: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: Some(SearchConfig::DEFAULT_LIMIT),
            include_deprecated: true,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn unlimited() -> Self {
        Self {
            limit: None,
            ..Default::default()
        }
    }

    pub fn without_deprecated(mut self) -> Self {
        self.include_deprecated = false;
        self
    }

    /// Drop duplicates and filtered modules, then truncate to the limit.
    fn apply(&self, hits: impl IntoIterator<Item = SearchHit>) -> Vec<SearchHit> {
        let mut seen = HashSet::new();
        let hits = hits
            .into_iter()
            .filter(|hit| self.include_deprecated || !is_deprecated_module(&hit.module))
            .filter(|hit| seen.insert((hit.name.clone(), hit.module.clone())));
        match self.limit {
            Some(limit) => hits.take(limit).collect(),
            None => hits.collect(),
        }
    }
}

/// Read-only queries against an open store.
pub struct SearchResolver<'a> {
    store: &'a DocStore,
}

impl<'a> SearchResolver<'a> {
    pub fn new(store: &'a DocStore) -> Self {
        Self { store }
    }

    /// Resolve a query through the structured tier, then the full-text tier.
    ///
    /// An empty or punctuation-only query returns no hits.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        if let Some((module, name_prefix)) = parse_qualified(query) {
            let hits = self.structured(module, name_prefix, options)?;
            if !hits.is_empty() {
                debug!("Structured match for '{}': {} hit(s)", query, hits.len());
                return Ok(hits);
            }
        }

        Ok(self.full_text(query, options))
    }

    /// Module substring plus name prefix match, ordered by name then module.
    pub fn structured(
        &self,
        module: &str,
        name_prefix: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let mut stmt = self.store.connection().prepare(
            "SELECT id, name, module, description FROM classes
             WHERE instr(LOWER(module), LOWER(?1)) > 0
               AND substr(LOWER(name), 1, length(?2)) = LOWER(?2)
             ORDER BY name COLLATE NOCASE, module COLLATE NOCASE",
        )?;
        let hits = stmt
            .query_map(params![module, name_prefix], row_to_hit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(options.apply(hits))
    }

    /// Full-text match against the search projection.
    ///
    /// Never fails: an unusable query or an FTS5 error yields no hits.
    pub fn full_text(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let fts5_query = build_fts5_query(query);
        if fts5_query.is_empty() {
            return Vec::new();
        }

        let search = self.store.search_index();
        let sql = format!(
            "SELECT c.id, c.name, c.module, c.description
             FROM {table} s JOIN classes c ON c.id = s.rowid
             WHERE {table} MATCH ?1
             ORDER BY c.name COLLATE NOCASE, c.module COLLATE NOCASE",
            table = search.table_name()
        );

        let run = || -> rusqlite::Result<Vec<SearchHit>> {
            let mut stmt = self.store.connection().prepare(&sql)?;
            let rows = stmt.query_map(params![fts5_query], row_to_hit)?;
            rows.collect()
        };

        match run() {
            Ok(hits) => {
                debug!("FTS5 query '{}': {} hit(s)", fts5_query, hits.len());
                options.apply(hits)
            }
            Err(e) => {
                error!("FTS5 search failed for '{}': {}", fts5_query, e);
                Vec::new()
            }
        }
    }

    /// Every class ordered by name, for browsing.
    pub fn list_classes(&self, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        let mut stmt = self.store.connection().prepare(
            "SELECT id, name, module, description FROM classes
             ORDER BY name COLLATE NOCASE, module COLLATE NOCASE",
        )?;
        let hits = stmt
            .query_map([], row_to_hit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(options.apply(hits))
    }

    /// A class with its properties and methods, preferring non-deprecated modules.
    pub fn get_class(&self, name: &str) -> Result<Option<ClassDetails>> {
        let class = self.store.find_class(name, None)?;
        class.map(|class| self.details(class)).transpose()
    }

    /// A class in a specific module.
    pub fn get_class_in(&self, name: &str, module: &str) -> Result<Option<ClassDetails>> {
        let class = self.store.find_class(name, Some(module))?;
        class.map(|class| self.details(class)).transpose()
    }

    fn details(&self, class: StoredClass) -> Result<ClassDetails> {
        Ok(ClassDetails {
            properties: self.store.get_properties(class.id)?,
            methods: self.store.get_methods(class.id)?,
            class,
        })
    }

    /// The first overload of a method, with the number of overloads sharing its name.
    pub fn get_method(&self, class_name: &str, method_name: &str) -> Result<Option<MethodDetails>> {
        let Some(class) = self.store.find_class(class_name, None)? else {
            return Ok(None);
        };

        let mut overloads = self.store.find_methods(class.id, method_name)?;
        if overloads.is_empty() {
            return Ok(None);
        }
        let count = overloads.len();

        Ok(Some(MethodDetails {
            class_id: class.id,
            class_name: class.record.name,
            module: class.record.module,
            method: overloads.swap_remove(0),
            overloads: count,
        }))
    }
}

fn row_to_hit(row: &Row) -> rusqlite::Result<SearchHit> {
    Ok(SearchHit {
        id: row.get(0)?,
        name: row.get(1)?,
        module: row.get(2)?,
        description: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractedPage;
    use crate::models::{ClassRecord, MethodRecord, PropertyRecord};

    fn add(store: &mut DocStore, module: &str, name: &str, methods: &[&str]) -> i64 {
        let page = ExtractedPage {
            class: ClassRecord {
                name: name.to_string(),
                module: module.to_string(),
                description: format!("About {}.", name),
                sample_code: None,
                compatibility: None,
                notes: None,
                file_path: format!("/docs/{}/{}.html", module, name.to_lowercase()),
            },
            properties: vec![PropertyRecord::new("Handle")],
            methods: methods.iter().map(|m| MethodRecord::new(*m)).collect(),
        };
        store.store_page(&page, Some(1.0)).unwrap()
    }

    fn create_test_store() -> DocStore {
        let mut store = DocStore::open_in_memory().unwrap();
        add(&mut store, "desktop", "DesktopWindow", &["Show", "Close"]);
        add(&mut store, "desktop", "Window", &["Show"]);
        add(&mut store, "web", "WebWindow", &["Show"]);
        add(&mut store, "deprecated", "Window", &["Show"]);
        add(&mut store, "graphics", "Graphics", &["DrawLine", "DrawString"]);
        add(&mut store, "graphics", "Picture", &["CopyOSHandle"]);
        store
    }

    fn names(hits: &[SearchHit]) -> Vec<String> {
        hits.iter().map(SearchHit::qualified_name).collect()
    }

    #[test]
    fn test_structured_tier() {
        let store = create_test_store();
        let resolver = SearchResolver::new(&store);

        let hits = resolver
            .search("Desktop.Window", &SearchOptions::default())
            .unwrap();
        assert_eq!(names(&hits), ["desktop.Window"]);

        let hits = resolver
            .search("desk.desktop", &SearchOptions::default())
            .unwrap();
        assert_eq!(names(&hits), ["desktop.DesktopWindow"]);
    }

    #[test]
    fn test_structured_miss_falls_back_to_full_text() {
        let store = create_test_store();
        let resolver = SearchResolver::new(&store);

        // No module contains "about", so the full-text tier answers.
        let hits = resolver
            .search("about.graphics", &SearchOptions::default())
            .unwrap();
        assert_eq!(names(&hits), ["graphics.Graphics", "graphics.Picture"]);
    }

    #[test]
    fn test_full_text_prefix_and_order() {
        let store = create_test_store();
        let resolver = SearchResolver::new(&store);

        let hits = resolver.search("Draw", &SearchOptions::default()).unwrap();
        assert_eq!(names(&hits), ["graphics.Graphics"]);

        // Prefixes apply per token, so `DesktopWindow` is not a `window` match.
        let hits = resolver.search("window", &SearchOptions::default()).unwrap();
        assert_eq!(names(&hits), ["deprecated.Window", "desktop.Window"]);

        let hits = resolver.search("web", &SearchOptions::default()).unwrap();
        assert_eq!(names(&hits), ["web.WebWindow"]);
    }

    #[test]
    fn test_deprecated_filter_and_limit() {
        let store = create_test_store();
        let resolver = SearchResolver::new(&store);

        let hits = resolver
            .search("window", &SearchOptions::default().without_deprecated())
            .unwrap();
        assert_eq!(names(&hits), ["desktop.Window"]);

        let hits = resolver.search("show", &SearchOptions::with_limit(2)).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_unusable_queries_are_empty() {
        let store = create_test_store();
        let resolver = SearchResolver::new(&store);

        for query in ["", "   ", "***", "?!", "\"", "."] {
            assert!(resolver
                .search(query, &SearchOptions::default())
                .unwrap()
                .is_empty());
        }
    }

    #[test]
    fn test_list_classes() {
        let store = create_test_store();
        let resolver = SearchResolver::new(&store);

        let all = resolver.list_classes(&SearchOptions::unlimited()).unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].name, "DesktopWindow");

        let current = resolver
            .list_classes(&SearchOptions::unlimited().without_deprecated())
            .unwrap();
        assert_eq!(current.len(), 5);
    }

    #[test]
    fn test_get_class_and_method() {
        let mut store = create_test_store();
        let graphics_id = store.find_class("Graphics", None).unwrap().unwrap().id;
        let mut methods = vec![
            MethodRecord::new("DrawString"),
            MethodRecord::new("DrawString"),
        ];
        methods[1].parameters = Some("text As String, x As Double, y As Double".to_string());
        store
            .replace_children(graphics_id, &[], &methods)
            .unwrap();

        let resolver = SearchResolver::new(&store);
        let window = resolver.get_class("window").unwrap().unwrap();
        assert_eq!(window.class.record.module, "desktop");
        assert_eq!(window.properties.len(), 1);

        let old = resolver.get_class_in("Window", "deprecated").unwrap().unwrap();
        assert_eq!(old.class.record.module, "deprecated");

        let method = resolver
            .get_method("graphics", "drawstring")
            .unwrap()
            .unwrap();
        assert_eq!(method.class_id, graphics_id);
        assert_eq!(method.overloads, 2);
        assert_eq!(method.method.parameters, None);

        assert!(resolver.get_class("Nope").unwrap().is_none());
        assert!(resolver.get_method("Graphics", "Nope").unwrap().is_none());
        assert!(resolver.get_method("Nope", "Show").unwrap().is_none());
    }

    #[test]
    fn test_full_text_failure_degrades_to_empty() {
        let store = create_test_store();
        store
            .connection()
            .execute_batch("DROP TRIGGER search_index_ad; DROP TABLE search_index;")
            .unwrap();

        let resolver = SearchResolver::new(&store);
        let hits = resolver.search("draw", &SearchOptions::default()).unwrap();
        assert!(hits.is_empty());
        assert!(resolver
            .full_text("draw", &SearchOptions::unlimited())
            .is_empty());

        // The structured tier still answers from the relational tables.
        let hits = resolver.search("desktop.Window", &SearchOptions::default()).unwrap();
        assert_eq!(names(&hits), ["desktop.Window"]);
    }
}
