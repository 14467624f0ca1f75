//! SQLite-based persistence.
//!
//! Provides persistent storage for:
//! - Grouped preferences (the settings dialog state)
//! - Monitored accounts
//! - The account activity log

use std::path::Path;

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::accounts::Account;
use crate::error::StoreError;

use super::data_dir;
use super::prefs::{PreferenceStore, StoredValue};

/// One line of the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub logged_at: DateTime<Local>,
    pub message: String,
}

impl std::fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.logged_at.format("%Y-%m-%d %H:%M:%S"), self.message)
    }
}

/// SQLite database holding preferences, accounts and the activity log.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/qppe.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(StoreError::DataDir)?;
        Self::open_at(&dir.join("qppe.db"))
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        // `value` has no declared type so integers and strings keep their
        // storage class.
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prefs (
                grp   TEXT NOT NULL,
                key   TEXT NOT NULL,
                value,
                PRIMARY KEY (grp, key)
            );

            CREATE TABLE IF NOT EXISTS accounts (
                username TEXT PRIMARY KEY,
                password TEXT NOT NULL,
                email    TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS activity_log (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                logged_at TEXT NOT NULL,
                message   TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Preference store scoped to `group`.
    pub fn group(&self, group: &str) -> PrefGroup<'_> {
        PrefGroup {
            conn: &self.conn,
            group: group.to_string(),
            pending: Vec::new(),
        }
    }

    /// All accounts, ordered by username.
    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT username, password, email FROM accounts ORDER BY username")?;
        let rows = stmt.query_map([], |row| {
            Ok(Account {
                username: row.get(0)?,
                password: row.get(1)?,
                email: row.get(2)?,
            })
        })?;
        let accounts = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    pub fn account(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let account = self
            .conn
            .query_row(
                "SELECT username, password, email FROM accounts WHERE username = ?1",
                params![username],
                |row| {
                    Ok(Account {
                        username: row.get(0)?,
                        password: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }

    /// Insert or replace an account.
    pub fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO accounts (username, password, email) VALUES (?1, ?2, ?3)",
            params![account.username, account.password, account.email],
        )?;
        Ok(())
    }

    /// Append a message to the activity log, stamped with the local time.
    pub fn append_log(&self, message: &str) -> Result<ActivityEntry, StoreError> {
        let entry = ActivityEntry {
            logged_at: Local::now(),
            message: message.to_string(),
        };
        self.conn.execute(
            "INSERT INTO activity_log (logged_at, message) VALUES (?1, ?2)",
            params![entry.logged_at.to_rfc3339(), entry.message],
        )?;
        Ok(entry)
    }

    /// Most recent log entries, newest first.
    pub fn recent_log(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT logged_at, message FROM activity_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let ts: String = row.get(0)?;
            let message: String = row.get(1)?;
            Ok((ts, message))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (ts, message) = row?;
            let logged_at = DateTime::parse_from_rfc3339(&ts)
                .map(|dt| dt.with_timezone(&Local))
                .map_err(|e| StoreError::QueryFailed(format!("bad log timestamp '{ts}': {e}")))?;
            entries.push(ActivityEntry { logged_at, message });
        }
        Ok(entries)
    }
}

/// A preference group backed by the database.
///
/// Writes are buffered until [`PreferenceStore::sync`] commits them in one
/// transaction; reads see buffered writes.
pub struct PrefGroup<'a> {
    conn: &'a Connection,
    group: String,
    pending: Vec<(String, StoredValue)>,
}

impl PrefGroup<'_> {
    pub fn name(&self) -> &str {
        &self.group
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl PreferenceStore for PrefGroup<'_> {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        if let Some((_, value)) = self.pending.iter().rev().find(|(k, _)| k == key) {
            return Ok(Some(value.clone()));
        }
        let value = self
            .conn
            .query_row(
                "SELECT value FROM prefs WHERE grp = ?1 AND key = ?2",
                params![self.group, key],
                |row| row.get::<_, StoredValue>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.pending.push((key.to_string(), value));
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in &self.pending {
            tx.execute(
                "INSERT OR REPLACE INTO prefs (grp, key, value) VALUES (?1, ?2, ?3)",
                params![self.group, key, value],
            )?;
        }
        tx.commit()?;
        self.pending.clear();
        Ok(())
    }
}
