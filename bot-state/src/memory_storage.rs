use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::trace;

use crate::storage::{Storage, StorageFuture};

/// Process-local storage. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn load<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move { Ok(self.blobs.read().await.get(key).cloned()) })
    }

    fn save<'a>(&'a self, key: &'a str, blob: &'a [u8]) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            trace!(%key, bytes = blob.len(), "memory save");
            self.blobs.write().await.insert(key.to_string(), blob.to_vec());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.blobs.write().await.remove(key);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_load_delete() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load("k").await.unwrap(), None);

        storage.save("k", b"v1").await.unwrap();
        storage.save("k", b"v2").await.unwrap();
        assert_eq!(storage.load("k").await.unwrap().as_deref(), Some(&b"v2"[..]));
        assert_eq!(storage.len().await, 1);

        storage.delete("k").await.unwrap();
        storage.delete("k").await.unwrap();
        assert!(storage.is_empty().await);
    }
}
