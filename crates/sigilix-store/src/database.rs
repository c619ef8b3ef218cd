//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.
//!
//! Each signed-up identity gets its own file, `sigilix_<user_id>.db`, so that
//! two identities sharing a data directory never see each other's chats.
//! When built with the `sqlcipher` feature the file is keyed with the
//! caller-supplied 32-byte key; the plain build ignores the key.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use sigilix_shared::types::UserId;

use crate::error::Result;
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database for `user_id` inside `data_dir`.
    pub fn open_for_user(data_dir: &Path, user_id: UserId, db_key: &[u8; 32]) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join(Self::file_name(user_id));

        tracing::info!(path = %db_path.display(), %user_id, "opening database");

        Self::open_at(&db_path, db_key)
    }

    pub fn file_name(user_id: UserId) -> String {
        format!("sigilix_{}.db", user_id)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path, db_key: &[u8; 32]) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(conn, db_key)
    }

    /// Open a throwaway in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn, &[0u8; 32])
    }

    #[cfg_attr(not(feature = "sqlcipher"), allow(unused_variables))]
    fn configure(conn: Connection, db_key: &[u8; 32]) -> Result<Self> {
        #[cfg(feature = "sqlcipher")]
        conn.pragma_update(None, "key", format!("x'{}'", hex::encode(db_key)))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path()).finish()
    }
}
