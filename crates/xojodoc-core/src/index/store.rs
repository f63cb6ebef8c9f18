//! SQLite store for classes, their members and the mirrored search entries.

use crate::config::{CorpusConfig, StoreConfig};
use crate::extract::ExtractedPage;
use crate::models::{
    now_unix_seconds, ClassRecord, LibraryStats, MethodRecord, PropertyRecord, StoredClass,
};
use crate::{DocError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::change::StoredMtime;
use super::fts5::{SearchIndexConfig, SearchIndexManager};

const CLASS_COLUMNS: &str = "id, name, module, description, sample_code, compatibility, notes, \
                             file_path, file_mtime, indexed_at";

/// An open documentation database.
///
/// The connection lives exactly as long as the value; [`DocStore::close`] consumes it.
pub struct DocStore {
    db_path: Option<PathBuf>,
    conn: Connection,
    search_config: SearchIndexConfig,
}

impl DocStore {
    /// Create or open a store at the given path.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| DocError::Io {
                    message: format!("Failed to create directory {}", parent.display()),
                    path: Some(parent.to_path_buf()),
                    source: Some(e),
                })?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::configure_connection(&conn, true)?;
        Self::with_connection(conn, Some(db_path))
    }

    /// Open a store that must already exist.
    pub fn open_existing(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if !db_path.is_file() {
            return Err(DocError::DatabaseNotFound(db_path));
        }
        Self::open(db_path)
    }

    /// A private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_connection(&conn, false)?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        let store = Self {
            db_path,
            conn,
            search_config: SearchIndexConfig::default(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn configure_connection(conn: &Connection, wal: bool) -> Result<()> {
        if wal {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
        }
        conn.busy_timeout(StoreConfig::BUSY_TIMEOUT)?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(())
    }

    /// Create tables, indexes and the search projection if missing.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS classes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                module TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                sample_code TEXT,
                compatibility TEXT,
                notes TEXT,
                file_path TEXT NOT NULL,
                file_mtime REAL,
                indexed_at REAL,
                UNIQUE(module, name)
            );
            CREATE TABLE IF NOT EXISTS properties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class_id INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                type TEXT,
                read_only INTEGER NOT NULL DEFAULT 0,
                shared INTEGER NOT NULL DEFAULT 0,
                description TEXT
            );
            CREATE TABLE IF NOT EXISTS methods (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class_id INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                parameters TEXT,
                return_type TEXT,
                shared INTEGER NOT NULL DEFAULT 0,
                description TEXT,
                sample_code TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_classes_name ON classes(name COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_classes_file_path ON classes(file_path);
            CREATE INDEX IF NOT EXISTS idx_properties_class ON properties(class_id);
            CREATE INDEX IF NOT EXISTS idx_methods_class ON methods(class_id);",
        )?;

        self.search_index().ensure_setup(&self.conn)?;
        Ok(())
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn search_index(&self) -> SearchIndexManager<'_> {
        SearchIndexManager::new(&self.search_config)
    }

    /// What is recorded about the page stored from `file_path`.
    pub fn stored_mtime(&self, file_path: &str) -> Result<StoredMtime> {
        let (count, unrecorded, oldest): (i64, i64, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(file_mtime IS NULL), 0), MIN(file_mtime)
             FROM classes WHERE file_path = ?1",
            params![file_path],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(match (count, unrecorded, oldest) {
            (0, _, _) => StoredMtime::Missing,
            (_, 0, Some(mtime)) => StoredMtime::At(mtime),
            _ => StoredMtime::Unrecorded,
        })
    }

    /// Insert or update a class by `(module, name)`, keeping its id, and refresh its
    /// search entry.
    pub fn upsert_class(&mut self, record: &ClassRecord, mtime: Option<f64>) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let search = SearchIndexManager::new(&self.search_config);
        let id = upsert_class_row(&tx, record, mtime)?;
        search.refresh(&tx, id)?;
        tx.commit()?;

        debug!("Upserted class {}.{} (id {})", record.module, record.name, id);
        Ok(id)
    }

    /// Replace every property and method of a class.
    pub fn replace_children(
        &mut self,
        class_id: i64,
        properties: &[PropertyRecord],
        methods: &[MethodRecord],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        let search = SearchIndexManager::new(&self.search_config);
        replace_child_rows(&tx, class_id, properties, methods)?;
        search.refresh(&tx, class_id)?;
        tx.commit()?;
        Ok(())
    }

    /// Write one extracted page atomically.
    ///
    /// Classes previously stored from the same file under another `(module, name)` are
    /// removed; a class that keeps its identity keeps its id.
    pub fn store_page(&mut self, page: &ExtractedPage, mtime: Option<f64>) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let search = SearchIndexManager::new(&self.search_config);

        let stale = tx.execute(
            "DELETE FROM classes WHERE file_path = ?1 AND NOT (module = ?2 AND name = ?3)",
            params![page.class.file_path, page.class.module, page.class.name],
        )?;
        if stale > 0 {
            debug!(
                "Removed {} stale class(es) for {}",
                stale, page.class.file_path
            );
        }

        let id = upsert_class_row(&tx, &page.class, mtime)?;
        replace_child_rows(&tx, id, &page.properties, &page.methods)?;
        search.refresh(&tx, id)?;
        tx.commit()?;

        debug!(
            "Stored {}.{} with {} properties and {} methods",
            page.class.module,
            page.class.name,
            page.properties.len(),
            page.methods.len()
        );
        Ok(id)
    }

    /// Delete every class stored from a file, with its members and search entry.
    pub fn delete_by_path(&mut self, file_path: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM classes WHERE file_path = ?1", params![file_path])?;
        if deleted > 0 {
            debug!("Deleted {} class(es) for {}", deleted, file_path);
        }
        Ok(deleted)
    }

    /// Case-insensitive lookup by name, optionally within one module.
    ///
    /// When several modules define the name, non-deprecated modules win, then the
    /// alphabetically first module.
    pub fn find_class(&self, name: &str, module: Option<&str>) -> Result<Option<StoredClass>> {
        let module_filter = if module.is_some() {
            "AND module = ?3 COLLATE NOCASE"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM classes
             WHERE name = ?1 COLLATE NOCASE {}
             ORDER BY module LIKE ?2 || '%', module
             LIMIT 1",
            CLASS_COLUMNS, module_filter
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let prefix = CorpusConfig::DEPRECATED_MODULE_PREFIX;
        let class = match module {
            Some(module) => stmt
                .query_row(params![name, prefix, module], row_to_class)
                .optional()?,
            None => stmt
                .query_row(params![name, prefix], row_to_class)
                .optional()?,
        };
        Ok(class)
    }

    pub fn get_class_by_id(&self, class_id: i64) -> Result<Option<StoredClass>> {
        let class = self
            .conn
            .query_row(
                &format!("SELECT {} FROM classes WHERE id = ?1", CLASS_COLUMNS),
                params![class_id],
                row_to_class,
            )
            .optional()?;
        Ok(class)
    }

    /// Properties of a class ordered by name.
    pub fn get_properties(&self, class_id: i64) -> Result<Vec<PropertyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, type, read_only, shared, description FROM properties
             WHERE class_id = ?1 ORDER BY name COLLATE NOCASE, id",
        )?;
        let rows = stmt.query_map(params![class_id], row_to_property)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Methods of a class ordered by name; overloads stay in page order.
    pub fn get_methods(&self, class_id: i64) -> Result<Vec<MethodRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, parameters, return_type, shared, description, sample_code FROM methods
             WHERE class_id = ?1 ORDER BY name COLLATE NOCASE, id",
        )?;
        let rows = stmt.query_map(params![class_id], row_to_method)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every overload of one method, in page order.
    pub fn find_methods(&self, class_id: i64, name: &str) -> Result<Vec<MethodRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, parameters, return_type, shared, description, sample_code FROM methods
             WHERE class_id = ?1 AND name = ?2 COLLATE NOCASE ORDER BY id",
        )?;
        let rows = stmt.query_map(params![class_id, name], row_to_method)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct source files of stored classes.
    pub fn file_paths(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT file_path FROM classes ORDER BY file_path")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_classes(&self) -> Result<usize> {
        let count: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM classes", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn stats(&self) -> Result<LibraryStats> {
        let prefix = CorpusConfig::DEPRECATED_MODULE_PREFIX;
        let (total_classes, deprecated_classes): (usize, usize) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(module LIKE ?1 || '%'), 0) FROM classes",
            params![prefix],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let total_properties: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;
        let total_methods: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM methods", [], |row| row.get(0))?;

        let mut stmt = self.conn.prepare(
            "SELECT module, COUNT(*) FROM classes GROUP BY module ORDER BY module COLLATE NOCASE",
        )?;
        let modules = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, usize)>>>()?;

        Ok(LibraryStats {
            total_classes,
            deprecated_classes,
            total_properties,
            total_methods,
            modules,
        })
    }

    /// Rebuild the FTS5 projection from the relational tables.
    pub fn rebuild_search_index(&self) -> Result<usize> {
        let count = self.search_index().rebuild(&self.conn)?;
        debug!("Rebuilt search index with {} entries", count);
        Ok(count)
    }

    pub fn optimize_search_index(&self) -> Result<()> {
        self.search_index().optimize(&self.conn)
    }

    /// Checkpoint the WAL file.
    pub fn checkpoint_wal(&self) -> Result<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        debug!("Checkpointed WAL");
        Ok(())
    }

    /// Close the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| DocError::from(e))
    }
}

fn upsert_class_row(conn: &Connection, record: &ClassRecord, mtime: Option<f64>) -> Result<i64> {
    let id = conn.query_row(
        "INSERT INTO classes (name, module, description, sample_code, compatibility, notes,
                              file_path, file_mtime, indexed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(module, name) DO UPDATE SET
             description=excluded.description,
             sample_code=excluded.sample_code,
             compatibility=excluded.compatibility,
             notes=excluded.notes,
             file_path=excluded.file_path,
             file_mtime=excluded.file_mtime,
             indexed_at=excluded.indexed_at
         RETURNING id",
        params![
            record.name,
            record.module,
            record.description,
            record.sample_code,
            record.compatibility,
            record.notes,
            record.file_path,
            mtime,
            now_unix_seconds(),
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn replace_child_rows(
    conn: &Connection,
    class_id: i64,
    properties: &[PropertyRecord],
    methods: &[MethodRecord],
) -> Result<()> {
    conn.execute("DELETE FROM properties WHERE class_id = ?1", params![class_id])?;
    conn.execute("DELETE FROM methods WHERE class_id = ?1", params![class_id])?;

    let mut insert_property = conn.prepare(
        "INSERT INTO properties (class_id, name, type, read_only, shared, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for property in properties {
        insert_property.execute(params![
            class_id,
            property.name,
            property.type_name,
            property.read_only,
            property.shared,
            property.description,
        ])?;
    }

    let mut insert_method = conn.prepare(
        "INSERT INTO methods (class_id, name, parameters, return_type, shared, description,
                              sample_code)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for method in methods {
        insert_method.execute(params![
            class_id,
            method.name,
            method.parameters,
            method.return_type,
            method.shared,
            method.description,
            method.sample_code,
        ])?;
    }

    Ok(())
}

fn row_to_class(row: &Row) -> rusqlite::Result<StoredClass> {
    Ok(StoredClass {
        id: row.get(0)?,
        record: ClassRecord {
            name: row.get(1)?,
            module: row.get(2)?,
            description: row.get(3)?,
            sample_code: row.get(4)?,
            compatibility: row.get(5)?,
            notes: row.get(6)?,
            file_path: row.get(7)?,
        },
        file_mtime: row.get(8)?,
        indexed_at: row.get(9)?,
    })
}

fn row_to_property(row: &Row) -> rusqlite::Result<PropertyRecord> {
    Ok(PropertyRecord {
        name: row.get(0)?,
        type_name: row.get(1)?,
        read_only: row.get(2)?,
        shared: row.get(3)?,
        description: row.get(4)?,
    })
}

fn row_to_method(row: &Row) -> rusqlite::Result<MethodRecord> {
    Ok(MethodRecord {
        name: row.get(0)?,
        parameters: row.get(1)?,
        return_type: row.get(2)?,
        shared: row.get(3)?,
        description: row.get(4)?,
        sample_code: row.get(5)?,
    })
}
