//! Scoped state stores and typed property access.
//!
//! A [`BotState`] pairs a [`Storage`] with a scope (conversation or user).
//! Each turn loads one [`StateBag`] per scope, handlers read and write named
//! properties through [`StatePropertyAccessor`]s, and the bag is saved back
//! once after the turn.

use std::{collections::BTreeMap, fmt, marker::PhantomData, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::{Result, StateError};
use crate::storage::Storage;

/// What a state store is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateScope {
    Conversation,
    User,
}

impl StateScope {
    fn segment(&self) -> &'static str {
        match self {
            StateScope::Conversation => "conversations",
            StateScope::User => "users",
        }
    }
}

/// Property values of one scope instance (one conversation or one user).
///
/// Backed by a `BTreeMap` so that the serialized blob is deterministic:
/// saving an unchanged bag always writes identical bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateBag {
    values: BTreeMap<String, Value>,
}

impl StateBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a stored blob.
    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        Ok(Self {
            values: serde_json::from_slice(blob)?,
        })
    }

    /// Encodes the bag for storage.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.values)?)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn get_raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn set_raw(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    fn remove_raw(&mut self, name: &str) {
        self.values.remove(name);
    }
}

/// Typed handle to one named property inside a [`StateBag`].
pub struct StatePropertyAccessor<T> {
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for StatePropertyAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for StatePropertyAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatePropertyAccessor")
            .field("name", &self.name)
            .finish()
    }
}

impl<T> StatePropertyAccessor<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the property; `Ok(None)` when it was never set.
    pub fn get(&self, bag: &StateBag) -> Result<Option<T>> {
        bag.get_raw(&self.name)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(StateError::from)
    }

    /// Reads the property, falling back to `T::default()` when unset.
    pub fn get_or_default(&self, bag: &StateBag) -> Result<T>
    where
        T: Default,
    {
        Ok(self.get(bag)?.unwrap_or_default())
    }

    pub fn set(&self, bag: &mut StateBag, value: &T) -> Result<()> {
        bag.set_raw(&self.name, serde_json::to_value(value)?);
        Ok(())
    }

    pub fn delete(&self, bag: &mut StateBag) {
        bag.remove_raw(&self.name);
    }
}

/// A scoped state store (conversation state or user state).
#[derive(Clone)]
pub struct BotState {
    scope: StateScope,
    storage: Arc<dyn Storage>,
}

impl fmt::Debug for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotState").field("scope", &self.scope).finish()
    }
}

impl BotState {
    /// State keyed by `{channel}/conversations/{conversation id}`.
    pub fn conversation(storage: Arc<dyn Storage>) -> Self {
        Self {
            scope: StateScope::Conversation,
            storage,
        }
    }

    /// State keyed by `{channel}/users/{user id}`.
    pub fn user(storage: Arc<dyn Storage>) -> Self {
        Self {
            scope: StateScope::User,
            storage,
        }
    }

    pub fn scope(&self) -> StateScope {
        self.scope
    }

    /// Creates a typed accessor for a property of this scope.
    pub fn create_property<T>(&self, name: impl Into<String>) -> StatePropertyAccessor<T>
    where
        T: Serialize + DeserializeOwned,
    {
        StatePropertyAccessor::new(name)
    }

    /// Derives the storage key for this scope.
    ///
    /// # Errors
    /// [`StateError::MissingKey`] when the id this scope is keyed by is blank.
    pub fn storage_key(&self, channel_id: &str, conversation_id: &str, user_id: &str) -> Result<String> {
        let id = match self.scope {
            StateScope::Conversation => conversation_id,
            StateScope::User => user_id,
        };
        if id.trim().is_empty() {
            return Err(StateError::MissingKey(match self.scope {
                StateScope::Conversation => "conversation id",
                StateScope::User => "user id",
            }));
        }
        let channel = if channel_id.trim().is_empty() {
            "default"
        } else {
            channel_id
        };
        Ok(format!("{channel}/{}/{id}", self.scope.segment()))
    }

    /// Loads the bag stored under `key` (empty if nothing was stored).
    pub async fn load(&self, key: &str) -> Result<StateBag> {
        match self.storage.load(key).await? {
            Some(blob) => {
                let bag = StateBag::from_blob(&blob)?;
                debug!(scope = ?self.scope, %key, props = bag.values.len(), "state loaded");
                Ok(bag)
            }
            None => Ok(StateBag::new()),
        }
    }

    /// Persists `bag` under `key`. Not retried; failures propagate.
    pub async fn save(&self, key: &str, bag: &StateBag) -> Result<()> {
        let blob = bag.to_blob()?;
        if let Err(err) = self.storage.save(key, &blob).await {
            error!(scope = ?self.scope, %key, error = %err, "state save failed");
            return Err(err);
        }
        debug!(scope = ?self.scope, %key, bytes = blob.len(), "state saved");
        Ok(())
    }

    /// Removes all state stored under `key`.
    pub async fn clear(&self, key: &str) -> Result<()> {
        self.storage.delete(key).await
    }
}
