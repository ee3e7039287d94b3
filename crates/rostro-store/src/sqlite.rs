//! SQLite-backed enrollment store.
//!
//! One row per identity in `enrollments`; the descriptor travels as
//! JSON and `enrolled_at` as RFC 3339 text. `list_all` deliberately
//! has no ORDER BY — scan order is the underlying storage order and
//! is not stable across restarts.

use crate::{EnrollmentStore, StoreError};
use chrono::{DateTime, Utc};
use rostro_core::{Descriptor, EnrollmentRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS enrollments (
    identity_key TEXT PRIMARY KEY,
    raw_image    BLOB NOT NULL,
    descriptor   TEXT NOT NULL,
    enrolled_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS profiles (
    identity_key TEXT PRIMARY KEY,
    display_name TEXT
);
";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema.
    ///
    /// The `profiles` table belongs to the identity collaborator; it is
    /// created here only so reads against a fresh database are defined.
    /// This store never writes to it.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %path.display(), "opened enrollment database");
        Ok(Self { conn })
    }

    /// In-memory database, used by tests and diagnostics.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM enrollments", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn row_to_record(
        identity_key: String,
        raw_image: Vec<u8>,
        descriptor_json: String,
        enrolled_at: String,
    ) -> Result<EnrollmentRecord, StoreError> {
        let descriptor: Descriptor =
            serde_json::from_str(&descriptor_json).map_err(|source| StoreError::CorruptRecord {
                identity_key: identity_key.clone(),
                source,
            })?;
        let enrolled_at = DateTime::parse_from_rfc3339(&enrolled_at)
            .map_err(|source| StoreError::BadTimestamp {
                identity_key: identity_key.clone(),
                source,
            })?
            .with_timezone(&Utc);
        Ok(EnrollmentRecord {
            identity_key,
            raw_image,
            descriptor,
            enrolled_at,
        })
    }
}

impl EnrollmentStore for SqliteStore {
    fn upsert(&mut self, record: EnrollmentRecord) -> Result<(), StoreError> {
        let descriptor_json =
            serde_json::to_string(&record.descriptor).map_err(|source| StoreError::CorruptRecord {
                identity_key: record.identity_key.clone(),
                source,
            })?;
        self.conn.execute(
            "INSERT INTO enrollments (identity_key, raw_image, descriptor, enrolled_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(identity_key) DO UPDATE SET
                 raw_image = excluded.raw_image,
                 descriptor = excluded.descriptor,
                 enrolled_at = excluded.enrolled_at",
            params![
                record.identity_key,
                record.raw_image,
                descriptor_json,
                record.enrolled_at.to_rfc3339(),
            ],
        )?;
        tracing::debug!(identity = %record.identity_key, "enrollment upserted");
        Ok(())
    }

    fn get(&self, identity_key: &str) -> Result<Option<EnrollmentRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT identity_key, raw_image, descriptor, enrolled_at
                 FROM enrollments WHERE identity_key = ?1",
                params![identity_key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((key, image, descriptor, at)) => {
                Ok(Some(Self::row_to_record(key, image, descriptor, at)?))
            }
            None => Ok(None),
        }
    }

    fn list_all(&self) -> Result<Vec<EnrollmentRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT identity_key, raw_image, descriptor, enrolled_at FROM enrollments",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (key, image, descriptor, at) = row?;
            records.push(Self::row_to_record(key, image, descriptor, at)?);
        }
        Ok(records)
    }

    fn remove(&mut self, identity_key: &str) -> Result<bool, StoreError> {
        let n = self.conn.execute(
            "DELETE FROM enrollments WHERE identity_key = ?1",
            params![identity_key],
        )?;
        Ok(n > 0)
    }
}
