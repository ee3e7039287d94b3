//! rostro-store — Enrollment persistence.
//!
//! One record per enrolled identity, keyed by identity key, with
//! last-write-wins upsert semantics. The SQLite backend writes
//! synchronously on every upsert; the in-memory store is the test
//! double. No locking is provided here — concurrent writers must be
//! serialized by the caller.

pub mod memory;
pub mod profile;
pub mod sqlite;

use rostro_core::EnrollmentRecord;
use thiserror::Error;

pub use memory::MemoryStore;
pub use profile::{MemoryProfiles, Profile, ProfileDirectory};
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A persisted record failed to parse. Fatal for the call; never
    /// silently skipped.
    #[error("corrupt record for {identity_key}: {source}")]
    CorruptRecord {
        identity_key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("bad enrolled_at timestamp for {identity_key}: {source}")]
    BadTimestamp {
        identity_key: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Mapping from identity key to enrollment record.
///
/// `list_all` yields records in underlying storage order, which is not
/// guaranteed stable across process restarts.
pub trait EnrollmentStore {
    /// Unconditional overwrite, no merge.
    fn upsert(&mut self, record: EnrollmentRecord) -> Result<(), StoreError>;

    fn get(&self, identity_key: &str) -> Result<Option<EnrollmentRecord>, StoreError>;

    fn list_all(&self) -> Result<Vec<EnrollmentRecord>, StoreError>;

    /// Remove one enrollment. Returns whether anything was removed.
    /// Deletion is always caller-driven; nothing in the engine calls
    /// this internally.
    fn remove(&mut self, identity_key: &str) -> Result<bool, StoreError>;
}
