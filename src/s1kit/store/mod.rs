//! # Storage Layer
//!
//! All persisted state is a flat namespace of text values behind the
//! [`KeyValueStore`] trait. Business logic never touches files directly; it reads
//! and writes keys, and decides what to do when a write is rejected.
//!
//! ## Capacity
//!
//! Stores may have a total-size ceiling that is not known in advance. A write that
//! would cross it fails with [`KitError::CapacityExceeded`](crate::error::KitError),
//! which is distinguishable from every other failure. The preset tiering logic in
//! [`crate::tiering`] relies on that distinction.
//!
//! ## Implementations
//!
//! - [`fs::FsStore`]: production store, one file per key in the data directory,
//!   with a configurable quota.
//! - [`memory::MemStore`]: in-memory store for tests, with an optional quota and
//!   per-key failure simulation.
//!
//! ## Key Layout
//!
//! ```text
//! CommandsData              CommandsData_ImportTime
//! PluginsData               PluginsData_ImportTime
//! PresetData                PresetData_ImportTime
//! PresetData_Compressed     PresetData_<Category>  (one per allow-listed category)
//! StickerLayout             StickerButtonSize
//! ```

use crate::error::Result;
use crate::model::PresetCategory;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod fs;
pub mod memory;

/// Abstract interface for flat key-value persistence.
///
/// Methods take `&self`: s1kit is single-threaded and implementations use interior
/// mutability where they need it.
pub trait KeyValueStore {
    /// Returns `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    /// Fails with `CapacityExceeded` when the store cannot hold the new value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

pub mod keys {
    use super::PresetCategory;

    pub const COMMANDS: &str = "CommandsData";
    pub const COMMANDS_IMPORT_TIME: &str = "CommandsData_ImportTime";
    pub const PLUGINS: &str = "PluginsData";
    pub const PLUGINS_IMPORT_TIME: &str = "PluginsData_ImportTime";
    pub const PRESETS: &str = "PresetData";
    pub const PRESETS_IMPORT_TIME: &str = "PresetData_ImportTime";
    pub const PRESETS_COMPRESSED: &str = "PresetData_Compressed";
    pub const STICKER_LAYOUT: &str = "StickerLayout";
    pub const STICKER_BUTTON_SIZE: &str = "StickerButtonSize";

    pub fn preset_category(category: PresetCategory) -> String {
        format!("PresetData_{}", category.as_str())
    }

    /// Every key s1kit may write, per-category keys included.
    pub fn all() -> Vec<String> {
        let mut keys: Vec<String> = [
            COMMANDS,
            COMMANDS_IMPORT_TIME,
            PLUGINS,
            PLUGINS_IMPORT_TIME,
            PRESETS,
            PRESETS_IMPORT_TIME,
            PRESETS_COMPRESSED,
        ]
        .iter()
        .map(|k| k.to_string())
        .collect();
        keys.extend(PresetCategory::ALL.iter().map(|c| preset_category(*c)));
        keys.push(STICKER_LAYOUT.to_string());
        keys.push(STICKER_BUTTON_SIZE.to_string());
        keys
    }
}

/// Reads a key and decodes it as JSON. Absent or blank values are `None`.
pub fn get_json<S: KeyValueStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key)? {
        Some(text) if !text.trim().is_empty() => Ok(Some(serde_json::from_str(&text)?)),
        _ => Ok(None),
    }
}

pub fn set_json<S: KeyValueStore + ?Sized, T: Serialize + ?Sized>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<()> {
    let text = serde_json::to_string(value)?;
    store.set(key, &text)
}

/// True when the key holds a non-empty value.
pub fn has_value<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<bool> {
    Ok(store
        .get(key)?
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false))
}
