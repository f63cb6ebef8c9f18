//! FTS5 virtual table holding one [`SearchEntry`] per class.
//!
//! The entry's rowid is the class id. Entries are written from Rust through
//! [`SearchEntry::project`] whenever a class or its members change; a delete trigger on
//! `classes` removes an entry together with its class.

use crate::config::StoreConfig;
use crate::models::{ClassRecord, SearchEntry};
use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

/// Configuration for the FTS5 table.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Name of the FTS5 virtual table.
    pub table_name: String,
    /// Tokenizer configuration.
    pub tokenizer: String,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            table_name: StoreConfig::SEARCH_TABLE.to_string(),
            tokenizer: StoreConfig::SEARCH_TOKENIZER.to_string(),
        }
    }
}

/// Manager for FTS5 setup and maintenance.
pub struct SearchIndexManager<'a> {
    config: &'a SearchIndexConfig,
}

impl<'a> SearchIndexManager<'a> {
    pub fn new(config: &'a SearchIndexConfig) -> Self {
        Self { config }
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    fn delete_trigger_name(&self) -> String {
        format!("{}_ad", self.config.table_name)
    }

    /// Check if the FTS5 table exists.
    pub fn table_exists(&self, conn: &Connection) -> Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&self.config.table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Check if the delete trigger exists.
    pub fn trigger_exists(&self, conn: &Connection) -> Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='trigger' AND name=?1",
            [self.delete_trigger_name()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Ensure the table and trigger exist, filling a fresh table from `classes`.
    pub fn ensure_setup(&self, conn: &Connection) -> Result<()> {
        if !self.table_exists(conn)? {
            self.create_table(conn)?;
            self.populate_from_classes(conn)?;
        } else if !self.trigger_exists(conn)? {
            // Entries may have outlived deleted classes.
            self.populate_from_classes(conn)?;
        }

        self.create_triggers(conn)?;
        Ok(())
    }

    pub fn create_table(&self, conn: &Connection) -> Result<()> {
        let sql = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING fts5(
                class_name,
                module,
                description,
                content,
                tokenize='{}'
            )",
            self.config.table_name, self.config.tokenizer
        );

        conn.execute(&sql, [])?;
        info!("Created FTS5 table: {}", self.config.table_name);
        Ok(())
    }

    pub fn create_triggers(&self, conn: &Connection) -> Result<()> {
        let delete_trigger = format!(
            "CREATE TRIGGER IF NOT EXISTS {} AFTER DELETE ON classes BEGIN
                DELETE FROM {} WHERE rowid = OLD.id;
            END",
            self.delete_trigger_name(),
            self.config.table_name
        );
        conn.execute(&delete_trigger, [])?;

        debug!("Created FTS5 triggers for {}", self.config.table_name);
        Ok(())
    }

    /// Project a stored class into its search entry, or `None` if the class is gone.
    pub fn project(&self, conn: &Connection, class_id: i64) -> Result<Option<SearchEntry>> {
        let class = conn
            .query_row(
                "SELECT name, module, description, sample_code, compatibility, notes, file_path
                 FROM classes WHERE id = ?1",
                params![class_id],
                |row| {
                    Ok(ClassRecord {
                        name: row.get(0)?,
                        module: row.get(1)?,
                        description: row.get(2)?,
                        sample_code: row.get(3)?,
                        compatibility: row.get(4)?,
                        notes: row.get(5)?,
                        file_path: row.get(6)?,
                    })
                },
            )
            .optional()?;

        let Some(class) = class else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT name FROM (
                 SELECT name, 0 AS kind, id FROM properties WHERE class_id = ?1
                 UNION ALL
                 SELECT name, 1 AS kind, id FROM methods WHERE class_id = ?1
             ) ORDER BY kind, id",
        )?;
        let member_names = stmt
            .query_map(params![class_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(SearchEntry::project(
            class_id,
            &class,
            member_names.iter().map(String::as_str),
        )))
    }

    /// Replace the entry stored under `entry.class_id`.
    pub fn write_entry(&self, conn: &Connection, entry: &SearchEntry) -> Result<()> {
        let table = &self.config.table_name;
        conn.execute(
            &format!("DELETE FROM {} WHERE rowid = ?1", table),
            params![entry.class_id],
        )?;
        conn.execute(
            &format!(
                "INSERT INTO {} (rowid, class_name, module, description, content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                table
            ),
            params![
                entry.class_id,
                entry.class_name,
                entry.module,
                entry.description,
                entry.content,
            ],
        )?;
        Ok(())
    }

    /// Bring one class's entry in line with the relational tables.
    pub fn refresh(&self, conn: &Connection, class_id: i64) -> Result<()> {
        match self.project(conn, class_id)? {
            Some(entry) => self.write_entry(conn, &entry),
            None => {
                conn.execute(
                    &format!("DELETE FROM {} WHERE rowid = ?1", self.config.table_name),
                    params![class_id],
                )?;
                Ok(())
            }
        }
    }

    /// The entry currently stored for a class.
    pub fn read_entry(&self, conn: &Connection, class_id: i64) -> Result<Option<SearchEntry>> {
        let entry = conn
            .query_row(
                &format!(
                    "SELECT rowid, class_name, module, description, content
                     FROM {} WHERE rowid = ?1",
                    self.config.table_name
                ),
                params![class_id],
                |row| {
                    Ok(SearchEntry {
                        class_id: row.get(0)?,
                        class_name: row.get(1)?,
                        module: row.get(2)?,
                        description: row.get(3)?,
                        content: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Rewrite every entry from the relational tables.
    pub fn populate_from_classes(&self, conn: &Connection) -> Result<usize> {
        conn.execute_batch(&format!("DELETE FROM {};", self.config.table_name))?;

        let mut stmt = conn.prepare("SELECT id FROM classes ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for id in &ids {
            self.refresh(conn, *id)?;
        }

        info!("Populated FTS5 table from {} classes", ids.len());
        Ok(ids.len())
    }

    /// Drop and recreate the FTS5 table and trigger, then repopulate.
    pub fn rebuild(&self, conn: &Connection) -> Result<usize> {
        conn.execute(
            &format!("DROP TRIGGER IF EXISTS {}", self.delete_trigger_name()),
            [],
        )?;
        conn.execute(
            &format!("DROP TABLE IF EXISTS {}", self.config.table_name),
            [],
        )?;

        self.create_table(conn)?;
        self.create_triggers(conn)?;
        let count = self.populate_from_classes(conn)?;

        info!("Rebuilt FTS5 index");
        Ok(count)
    }

    /// Merge the FTS5 b-trees.
    pub fn optimize(&self, conn: &Connection) -> Result<()> {
        let sql = format!(
            "INSERT INTO {}({}) VALUES('optimize')",
            self.config.table_name, self.config.table_name
        );
        conn.execute(&sql, [])?;
        debug!("Optimized FTS5 index");
        Ok(())
    }

    pub fn get_stats(&self, conn: &Connection) -> Result<SearchIndexStats> {
        let row_count: usize = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.config.table_name),
            [],
            |row| row.get(0),
        )?;

        Ok(SearchIndexStats {
            table_name: self.config.table_name.clone(),
            row_count,
            tokenizer: self.config.tokenizer.clone(),
        })
    }
}

/// Statistics about the FTS5 table.
#[derive(Debug, Clone)]
pub struct SearchIndexStats {
    pub table_name: String,
    pub row_count: usize,
    pub tokenizer: String,
}
