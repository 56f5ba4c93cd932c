use rusqlite::{Connection, Result};

use crate::db::migration_runner::{MigrationRunner, MEMORY_PATH};

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the journal database and brings its schema up
    /// to date.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        if db_path != MEMORY_PATH {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        Self::migrate(conn, db_path)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::migrate(Connection::open_in_memory()?, MEMORY_PATH)
    }

    fn migrate(conn: Connection, db_path: &str) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        let runner = MigrationRunner::new();
        log::info!("Checking database schema for {}", db_path);

        let applied = runner.run_pending_migrations(&conn, db_path)?;
        if applied > 0 {
            log::info!("Applied {} migrations successfully", applied);
        } else {
            log::info!("Database schema is up to date");
        }

        runner.verify_migrations(&conn)?;

        if let Some(version) = runner.get_current_version(&conn)? {
            log::debug!("Schema version: {}", version);
        }

        Ok(Database { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
