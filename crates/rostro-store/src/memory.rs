//! In-memory enrollment store, the test double for the SQLite backend.

use crate::{EnrollmentStore, StoreError};
use rostro_core::EnrollmentRecord;
use std::collections::HashMap;

/// HashMap-backed store. Iteration order is the map's, which matches
/// the contract: storage order, stable within a process only.
#[derive(Default)]
pub struct MemoryStore {
    records: HashMap<String, EnrollmentRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EnrollmentStore for MemoryStore {
    fn upsert(&mut self, record: EnrollmentRecord) -> Result<(), StoreError> {
        self.records.insert(record.identity_key.clone(), record);
        Ok(())
    }

    fn get(&self, identity_key: &str) -> Result<Option<EnrollmentRecord>, StoreError> {
        Ok(self.records.get(identity_key).cloned())
    }

    fn list_all(&self) -> Result<Vec<EnrollmentRecord>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }

    fn remove(&mut self, identity_key: &str) -> Result<bool, StoreError> {
        Ok(self.records.remove(identity_key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rostro_core::Descriptor;

    fn record(key: &str, first: f32) -> EnrollmentRecord {
        EnrollmentRecord {
            identity_key: key.to_string(),
            raw_image: vec![1, 2, 3],
            descriptor: Descriptor {
                values: vec![first, 0.5, 0.5],
                sample_side: 64,
                block_side: 8,
            },
            enrolled_at: Utc::now(),
        }
    }

    #[test]
    fn test_round_trip() {
        let mut store = MemoryStore::new();
        store.upsert(record("a@x.com", 0.1)).unwrap();
        let got = store.get("a@x.com").unwrap().unwrap();
        assert_eq!(got.identity_key, "a@x.com");
        assert_eq!(got.raw_image, vec![1, 2, 3]);
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut store = MemoryStore::new();
        store.upsert(record("a@x.com", 0.1)).unwrap();
        store.upsert(record("a@x.com", 0.9)).unwrap();
        assert_eq!(store.len(), 1);
        let got = store.get("a@x.com").unwrap().unwrap();
        assert_eq!(got.descriptor.values[0], 0.9);
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::new();
        store.upsert(record("a@x.com", 0.1)).unwrap();
        assert!(store.remove("a@x.com").unwrap());
        assert!(!store.remove("a@x.com").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_all_has_one_entry_per_key() {
        let mut store = MemoryStore::new();
        store.upsert(record("a@x.com", 0.1)).unwrap();
        store.upsert(record("b@x.com", 0.2)).unwrap();
        store.upsert(record("a@x.com", 0.3)).unwrap();
        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 2);
    }
}
