//! Key-value storage interface for persisted bot state.

use std::{future::Future, pin::Pin};

use crate::errors::Result;

/// Boxed future returned by [`Storage`] methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Blob store keyed by conversation/user identifiers.
///
/// Implementations must make `save` durable before resolving; callers treat
/// an `Err` as a persistence failure for the whole turn.
pub trait Storage: Send + Sync {
    /// Returns the stored blob, or `None` if the key was never written.
    fn load<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<Vec<u8>>>;

    /// Replaces the blob stored under `key`.
    fn save<'a>(&'a self, key: &'a str, blob: &'a [u8]) -> StorageFuture<'a, ()>;

    /// Removes `key`; deleting a missing key is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;
}
