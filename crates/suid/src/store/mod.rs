//! Durable key-value storage for the block pool.
//!
//! The pool is a single text value under a fixed key. Stores treat a missing
//! key and an empty value the same way: an empty pool.

mod file;
mod memory;

pub use file::*;
pub use memory::*;

use crate::Result;

/// Key under which the pool is stored unless configured otherwise.
pub const DEFAULT_POOL_KEY: &str = "suidpool";

/// A minimal get/set interface over durable text storage.
///
/// Every `set` must be visible to the next `get` on the same store.
pub trait PoolStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`](crate::Error::Store) if the backing storage
    /// cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`](crate::Error::Store) if the backing storage
    /// cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: PoolStore> PoolStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
