use dashmap::DashMap;
use std::sync::Arc;

use super::{StorageBackend, StorageError};

/// Process-local backend. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    slots: Arc<DashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl StorageBackend for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.slots.remove(key);
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.slots.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_slots() {
        let storage = InMemoryStorage::new();
        let other = storage.clone();

        storage.set("purchase_orders_v1", "[]").unwrap();
        assert!(other.contains("purchase_orders_v1").unwrap());
        assert_eq!(other.len(), 1);

        other.remove("purchase_orders_v1").unwrap();
        assert!(storage.is_empty());
        assert_eq!(storage.get("purchase_orders_v1").unwrap(), None);
    }

    #[test]
    fn set_overwrites() {
        let storage = InMemoryStorage::new();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));
    }
}
