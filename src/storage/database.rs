//! SQLite Database
//!
//! Embedded database for persistent storage using rusqlite with r2d2 connection pooling.
//! Records are stored as JSON bodies next to an integer version column used
//! for compare-and-swap writes.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::utils::error::{AppError, AppResult};

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Versioned record tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Projects,
    Sessions,
}

impl Table {
    fn name(&self) -> &'static str {
        match self {
            Table::Projects => "projects",
            Table::Sessions => "sessions",
        }
    }
}

/// Raw versioned row from the database
#[derive(Debug, Clone)]
pub struct RecordRow {
    pub id: String,
    pub version: u64,
    pub body: String,
}

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create an in-memory database for testing.
    ///
    /// A single pooled connection keeps every caller on the same in-memory
    /// database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open (or create) a database file with connection pooling
    pub fn open(db_path: &Path) -> AppResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    /// Get a record by id
    pub fn get_record(&self, table: Table, id: &str) -> AppResult<Option<RecordRow>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT id, version, body FROM {} WHERE id = ?1", table.name());
        let result = conn.query_row(&sql, params![id], |row| {
            Ok(RecordRow {
                id: row.get(0)?,
                version: row.get::<_, i64>(1)? as u64,
                body: row.get(2)?,
            })
        });

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::database(e.to_string())),
        }
    }

    /// Insert a new record at version 1. Returns false if the id already exists.
    pub fn insert_record(&self, table: Table, id: &str, body: &str) -> AppResult<bool> {
        let conn = self.get_connection()?;
        let sql = format!(
            "INSERT OR IGNORE INTO {} (id, version, body) VALUES (?1, 1, ?2)",
            table.name()
        );
        let inserted = conn.execute(&sql, params![id, body])?;
        Ok(inserted == 1)
    }

    /// Replace a record only if it is still at `expected`. Returns false on a
    /// version mismatch or missing row.
    pub fn update_record(&self, table: Table, id: &str, body: &str, expected: u64) -> AppResult<bool> {
        let conn = self.get_connection()?;
        let sql = format!(
            "UPDATE {} SET body = ?1, version = version + 1, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?2 AND version = ?3",
            table.name()
        );
        let updated = conn.execute(&sql, params![body, id, expected as i64])?;
        Ok(updated == 1)
    }

    /// Current version of a record, if present
    pub fn record_version(&self, table: Table, id: &str) -> AppResult<Option<u64>> {
        Ok(self.get_record(table, id)?.map(|row| row.version))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool_size", &self.pool.state().connections)
            .finish()
    }
}
