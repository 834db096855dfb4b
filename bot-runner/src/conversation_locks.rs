//! One async lock per conversation so turns of a conversation never overlap.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one turn. Dropping it releases the conversation
/// and forgets the lock once nobody else is waiting on it.
#[derive(Debug)]
pub struct ConversationGuard<'a> {
    owner: &'a ConversationLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn holds `key`.
    pub async fn acquire(&self, key: &str) -> ConversationGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.to_string()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        ConversationGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of conversations with a live lock.
    pub fn active(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for ConversationGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.owner.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&self.key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_key_waits_other_keys_do_not() {
        let locks = ConversationLocks::new();
        let first = locks.acquire("c-1").await;

        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire("c-2")).await;
        assert!(other.is_ok());
        drop(other);

        let same = tokio::time::timeout(Duration::from_millis(50), locks.acquire("c-1")).await;
        assert!(same.is_err());

        drop(first);
        let same = tokio::time::timeout(Duration::from_millis(50), locks.acquire("c-1")).await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_forgotten() {
        let locks = ConversationLocks::new();
        {
            let _a = locks.acquire("c-1").await;
            let _b = locks.acquire("c-2").await;
            assert_eq!(locks.active(), 2);
        }
        assert_eq!(locks.active(), 0);
    }
}
