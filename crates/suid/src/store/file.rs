use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{Error, Result, store::PoolStore};

/// A [`PoolStore`] keeping one file per key inside a directory.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a crash mid-write leaves either the old or the new pool.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
            && !key.starts_with('.');
        if !valid {
            return Err(Error::Store {
                reason: format!("invalid pool key {key:?}"),
            });
        }
        Ok(self.dir.join(key))
    }
}

impl PoolStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn scratch_dir() -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        std::env::temp_dir().join(format!(
            "suid-file-store-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn values_survive_reopening() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get("suidpool").unwrap(), None);

        store.set("suidpool", "14she,14sky").unwrap();
        store.set("suidpool", "14sky").unwrap();

        let reopened = FileStore::open(&dir).unwrap();
        assert_eq!(reopened.get("suidpool").unwrap().as_deref(), Some("14sky"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).unwrap();
        for key in ["", "../pool", "a/b", ".hidden"] {
            assert!(matches!(store.get(key), Err(Error::Store { .. })), "{key}");
            assert!(matches!(store.set(key, "x"), Err(Error::Store { .. })), "{key}");
        }
        fs::remove_dir_all(dir).unwrap();
    }
}
