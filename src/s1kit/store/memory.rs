use super::KeyValueStore;
use crate::error::{KitError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

/// In-memory store for tests and development. Does NOT persist data.
///
/// Uses `RefCell` for interior mutability since s1kit is single-threaded.
/// A quota (in bytes, counting keys and values) emulates a capacity-limited
/// medium; `fail_key` simulates non-capacity write failures.
#[derive(Default)]
pub struct MemStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Option<usize>,
    failing_keys: RefCell<HashSet<String>>,
    writes: RefCell<Vec<String>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Make every write to `key` fail with a generic store error.
    pub fn fail_key(&self, key: &str) {
        self.failing_keys.borrow_mut().insert(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Keys of successful writes, in order.
    pub fn write_log(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }

    pub fn used_bytes(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.failing_keys.borrow().contains(key) {
            return Err(KitError::Store(format!("Simulated write error for {}", key)));
        }

        if let Some(quota) = self.quota {
            let existing = self
                .entries
                .borrow()
                .get(key)
                .map(|v| key.len() + v.len())
                .unwrap_or(0);
            let projected = self.used_bytes() - existing + key.len() + value.len();
            if projected > quota {
                return Err(KitError::CapacityExceeded {
                    key: key.to_string(),
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.borrow_mut().push(key.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use crate::model::{PresetCategory, PresetRecord};

    pub fn preset(category: PresetCategory, title: &str, vendor: &str) -> PresetRecord {
        PresetRecord {
            category,
            class_id: Some(format!("{{{}}}", vendor.to_uppercase())),
            vendor: Some(vendor.to_string()),
            title: Some(title.to_string()),
            creator: Some("factory".to_string()),
            sub_folder: Some("Factory".to_string()),
        }
    }

    /// `count` presets in `category`, titled "<prefix> 01", "<prefix> 02", ...
    pub fn presets(category: PresetCategory, prefix: &str, count: usize) -> Vec<PresetRecord> {
        (1..=count)
            .map(|i| preset(category, &format!("{} {:02}", prefix, i), "PreSonus"))
            .collect()
    }
}
