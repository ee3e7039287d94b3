//! Read-only access to the registered-identity roster.
//!
//! The roster lives in a keyspace owned by the identity collaborator;
//! this module only reads it to correlate a matched identity key to a
//! profile after a 1:N identification.

use crate::{SqliteStore, StoreError};
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;

/// Profile fields for one registered identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub identity_key: String,
    pub display_name: Option<String>,
}

/// Lookup into the identity collaborator's roster.
pub trait ProfileDirectory {
    fn profile(&self, identity_key: &str) -> Result<Option<Profile>, StoreError>;
}

impl ProfileDirectory for SqliteStore {
    fn profile(&self, identity_key: &str) -> Result<Option<Profile>, StoreError> {
        let row = self
            .connection()
            .query_row(
                "SELECT identity_key, display_name FROM profiles WHERE identity_key = ?1",
                params![identity_key],
                |row| {
                    Ok(Profile {
                        identity_key: row.get(0)?,
                        display_name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

/// In-memory roster for tests.
#[derive(Default)]
pub struct MemoryProfiles {
    profiles: HashMap<String, Profile>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity_key: &str, display_name: Option<&str>) {
        self.profiles.insert(
            identity_key.to_string(),
            Profile {
                identity_key: identity_key.to_string(),
                display_name: display_name.map(str::to_string),
            },
        );
    }
}

impl ProfileDirectory for MemoryProfiles {
    fn profile(&self, identity_key: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.get(identity_key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_profile_lookup() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO profiles (identity_key, display_name) VALUES (?1, ?2)",
                params!["a@x.com", "Ana"],
            )
            .unwrap();

        let profile = store.profile("a@x.com").unwrap().unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Ana"));
        assert!(store.profile("nobody@x.com").unwrap().is_none());
    }

    #[test]
    fn test_memory_profiles() {
        let mut roster = MemoryProfiles::new();
        roster.insert("b@x.com", None);
        let profile = roster.profile("b@x.com").unwrap().unwrap();
        assert_eq!(profile.identity_key, "b@x.com");
        assert_eq!(profile.display_name, None);
    }
}
