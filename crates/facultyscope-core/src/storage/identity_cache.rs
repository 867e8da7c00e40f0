use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, params};

use super::schema::{apply_pragmas, create_tables};
use crate::error::Result;
use crate::models::{AuthorId, Resolution, ResolutionMethod};

/// Session-level memo of resolved identities, keyed by faculty.
///
/// Unresolved outcomes are stored too so a miss is not re-run every time.
pub trait IdentityCache: Send + Sync {
    fn get(&self, faculty_key: &str) -> Result<Option<Resolution>>;
    fn set(&self, faculty_key: &str, resolution: &Resolution) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryIdentityCache {
    entries: Mutex<HashMap<String, Resolution>>,
}

impl MemoryIdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityCache for MemoryIdentityCache {
    fn get(&self, faculty_key: &str) -> Result<Option<Resolution>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(faculty_key).cloned())
    }

    fn set(&self, faculty_key: &str, resolution: &Resolution) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(faculty_key.to_string(), resolution.clone());
        Ok(())
    }
}

/// SQLite-backed identity table, one row per faculty key.
pub struct SqliteIdentityCache {
    connection: Mutex<Connection>,
}

impl SqliteIdentityCache {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        apply_pragmas(&conn)?;
        create_tables(&conn)?;
        Ok(Self {
            connection: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM author_identities", [])?)
    }
}

impl IdentityCache for SqliteIdentityCache {
    fn get(&self, faculty_key: &str) -> Result<Option<Resolution>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT author_id, method FROM author_identities WHERE faculty_key = ?1",
                params![faculty_key],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;

        let Some((author_id, method)) = row else {
            return Ok(None);
        };

        match (author_id, method) {
            (Some(id), Some(method)) => Ok(Some(Resolution::resolved(
                AuthorId::parse(&id)?,
                method.parse::<ResolutionMethod>()?,
            ))),
            _ => Ok(Some(Resolution::Unresolved)),
        }
    }

    fn set(&self, faculty_key: &str, resolution: &Resolution) -> Result<()> {
        let (author_id, method) = match resolution.identity() {
            Some(identity) => (
                Some(identity.author_id.as_str().to_string()),
                Some(identity.method.as_str()),
            ),
            None => (None, None),
        };

        self.conn().execute(
            "INSERT INTO author_identities (faculty_key, author_id, method, resolved_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(faculty_key) DO UPDATE SET
                author_id = excluded.author_id,
                method = excluded.method,
                resolved_at = excluded.resolved_at",
            params![
                faculty_key,
                author_id,
                method,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }
}
