//! The persisted queue of reserved blocks.

use parking_lot::Mutex;

use crate::{Error, Result, Suid, store::PoolStore};

/// Spacing between consecutive identifiers drawn from one block.
pub const SHARD_SIZE: u64 = 2;

/// Number of identifiers one block yields.
pub const BLOCK_CAPACITY: u64 = 64;

/// The shape shared by every block the allocator hands out.
///
/// A block starting at `s` yields `s`, `s + shard_size`, ...,
/// `s + (capacity - 1) * shard_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockLayout {
    shard_size: u64,
    capacity: u64,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self::new(SHARD_SIZE, BLOCK_CAPACITY)
    }
}

impl BlockLayout {
    /// Creates a layout. Both values are raised to at least `1`.
    pub const fn new(shard_size: u64, capacity: u64) -> Self {
        Self {
            shard_size: if shard_size == 0 { 1 } else { shard_size },
            capacity: if capacity == 0 { 1 } else { capacity },
        }
    }

    pub const fn shard_size(&self) -> u64 {
        self.shard_size
    }

    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the identifier at `offset` within the block starting at
    /// `start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockOverflow`] if the value does not fit in 64 bits.
    pub fn id_at(&self, start: Suid, offset: u64) -> Result<Suid> {
        offset
            .checked_mul(self.shard_size)
            .and_then(|delta| start.to_raw().checked_add(delta))
            .map(Suid::from_raw)
            .ok_or(Error::BlockOverflow {
                start: start.to_raw(),
            })
    }
}

/// An ordered queue of unconsumed block starts, oldest first, persisted in a
/// [`PoolStore`].
///
/// Nothing is cached between calls: every operation reads the store, and
/// every mutation writes it back before returning.
pub struct BlockPool<S> {
    store: S,
    key: String,
    lock: Mutex<()>,
}

impl<S: PoolStore> BlockPool<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the pool. A missing or empty entry is an empty pool.
    ///
    /// Malformed entries are logged and skipped, so the next mutation writes
    /// back a clean pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load(&self) -> Result<Vec<Suid>> {
        let Some(text) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };
        Ok(entries(&text)
            .filter_map(|part| match Suid::decode(part) {
                Ok(start) => Some(start),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Skipping malformed suid pool entry {part:?}: {_e}");
                    None
                }
            })
            .collect())
    }

    /// Replaces the stored pool with `blocks`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn save(&self, blocks: &[Suid]) -> Result<()> {
        self.store.set(&self.key, &format_pool(blocks))
    }

    /// # Errors
    ///
    /// Returns an error if the pool cannot be loaded.
    pub fn len(&self) -> Result<usize> {
        self.load().map(|blocks| blocks.len())
    }

    /// # Errors
    ///
    /// Returns an error if the pool cannot be loaded.
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Removes and returns the oldest block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPool`] when there is nothing to take, or a store
    /// error.
    pub fn take_next(&self) -> Result<Suid> {
        self.modify(|blocks| {
            if blocks.is_empty() {
                return Err(Error::EmptyPool);
            }
            Ok(blocks.remove(0))
        })
    }

    /// Adds a newly received block at the end of the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn append(&self, start: Suid) -> Result<()> {
        self.extend([start])
    }

    /// Adds several blocks at the end of the queue in one write.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn extend(&self, starts: impl IntoIterator<Item = Suid>) -> Result<()> {
        self.modify(|blocks| {
            blocks.extend(starts);
            Ok(())
        })
    }

    fn modify<R>(&self, f: impl FnOnce(&mut Vec<Suid>) -> Result<R>) -> Result<R> {
        let _guard = self.lock.lock();
        let mut blocks = self.load()?;
        let out = f(&mut blocks)?;
        self.save(&blocks)?;
        Ok(out)
    }
}

/// Parses the stored form: comma separated base-36 block starts.
///
/// # Errors
///
/// Returns [`Error::Format`] if an entry is not valid base-36.
pub fn parse_pool(text: &str) -> Result<Vec<Suid>> {
    entries(text)
        .map(|part| Suid::decode(part).map_err(Error::from))
        .collect()
}

fn entries(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|part| !part.is_empty())
}

/// Formats blocks in the stored form. An empty pool is empty text.
pub fn format_pool(blocks: &[Suid]) -> String {
    blocks
        .iter()
        .map(Suid::encode)
        .collect::<Vec<_>>()
        .join(",")
}
