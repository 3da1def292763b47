use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{Result, store::PoolStore};

/// An in-process [`PoolStore`].
///
/// Contents do not survive a restart. Clones share the same map, so several
/// pools (or a test and the pool under test) can observe each other's writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("suidpool").unwrap(), None);
    }

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("suidpool", "2s,2u").unwrap();
        assert_eq!(other.get("suidpool").unwrap().as_deref(), Some("2s,2u"));
        assert_eq!(other.get("elsewhere").unwrap(), None);
    }
}
