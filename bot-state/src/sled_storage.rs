use std::path::Path;

use sled::{Db, Tree};
use tokio::task;
use tracing::{debug, info};

use crate::errors::Result;
use crate::storage::{Storage, StorageFuture};

/// Storage backed by an embedded sled database; one tree holds all blobs.
#[derive(Clone)]
pub struct SledStorage {
    // Keeps the database open for as long as the tree is in use.
    _db: Db,
    tree: Tree,
}

impl SledStorage {
    /// Opens (or creates) the database at `path` and the tree `tree_name`.
    pub fn open(path: impl AsRef<Path>, tree_name: &str) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let tree = db.open_tree(tree_name)?;
        info!(path = %path.display(), tree = tree_name, "sled storage opened");
        Ok(Self { _db: db, tree })
    }

    /// Flushes dirty pages on the blocking pool (runs inside `spawn_blocking`).
    async fn flush(&self) -> Result<usize> {
        let tree = self.tree.clone();
        Ok(task::spawn_blocking(move || tree.flush()).await??)
    }
}

impl Storage for SledStorage {
    fn load<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move { Ok(self.tree.get(key)?.map(|v| v.to_vec())) })
    }

    fn save<'a>(&'a self, key: &'a str, blob: &'a [u8]) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.tree.insert(key, blob)?;
            let flushed = self.flush().await?;
            debug!(%key, bytes = blob.len(), flushed, "sled save flushed");
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.tree.remove(key)?;
            self.flush().await?;
            Ok(())
        })
    }
}
