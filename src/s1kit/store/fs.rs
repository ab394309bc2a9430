use super::KeyValueStore;
use crate::error::{KitError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const VALUE_EXT: &str = "txt";

/// Production store: one file per key inside the data directory.
///
/// The optional quota counts key and value bytes of every stored entry; a write
/// that would exceed it fails with [`KitError::CapacityExceeded`].
pub struct FsStore {
    root: PathBuf,
    quota: Option<usize>,
}

impl FsStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root, quota: None }
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(KitError::Store(format!("Invalid key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.{}", key, VALUE_EXT)))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(KitError::Io)?;
        }
        Ok(())
    }

    /// Bytes used by every stored entry except `skip_key`.
    fn used_bytes_except(&self, skip_key: &str) -> Result<usize> {
        if !self.root.exists() {
            return Ok(0);
        }

        let mut total = 0;
        for entry in fs::read_dir(&self.root).map_err(KitError::Io)? {
            let path = entry.map_err(KitError::Io)?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXT) {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            if stem == skip_key {
                continue;
            }
            let len = fs::metadata(&path).map_err(KitError::Io)?.len() as usize;
            total += stem.len() + len;
        }
        Ok(total)
    }
}

impl KeyValueStore for FsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(KitError::Io)?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let target = self.value_path(key)?;

        if let Some(quota) = self.quota {
            let projected = self.used_bytes_except(key)? + key.len() + value.len();
            if projected > quota {
                return Err(KitError::CapacityExceeded {
                    key: key.to_string(),
                });
            }
        }

        self.ensure_dir()?;

        // Atomic write
        let tmp_path = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp_path, value).map_err(KitError::Io)?;
        fs::rename(&tmp_path, target).map_err(KitError::Io)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.value_path(key)?;
        if path.exists() {
            fs::remove_file(path).map_err(KitError::Io)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path().join("data"));
        (dir, store)
    }

    #[test]
    fn basic_value_io() {
        let (_dir, store) = setup();

        assert_eq!(store.get("CommandsData").unwrap(), None);
        store.set("CommandsData", "[]").unwrap();
        assert_eq!(store.get("CommandsData").unwrap().as_deref(), Some("[]"));

        store.remove("CommandsData").unwrap();
        assert_eq!(store.get("CommandsData").unwrap(), None);
    }

    #[test]
    fn no_tmp_files_left_behind() {
        let (_dir, store) = setup();
        store.set("PluginsData", "[1,2,3]").unwrap();

        for entry in fs::read_dir(store.root()).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
    }

    #[test]
    fn quota_counts_existing_entries() {
        let (dir, _) = setup();
        let store = FsStore::new(dir.path().to_path_buf()).with_quota(40);

        store.set("First", "0123456789").unwrap(); // 15 bytes
        store.set("Second", "0123456789").unwrap(); // 16 bytes

        let err = store.set("Third", "0123456789").unwrap_err();
        assert!(err.is_capacity());

        // Overwriting an existing key only counts the new value
        store.set("Second", "0123456789").unwrap();
    }

    #[test]
    fn rejects_path_like_keys() {
        let (_dir, store) = setup();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
    }
}
