use crate::error::{KitError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

pub const DEFAULT_STORAGE_QUOTA: u64 = 5 * 1024 * 1024;
pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const DEFAULT_MACRO_GROUP: &str = "S1Kit";
pub const DEFAULT_PRESET_QUERY: &str =
    "SELECT category, classId, vendor, title, creator, subFolder FROM PresetDescriptors";

/// Configuration for s1kit, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KitConfig {
    /// Capacity ceiling of the key-value store, in bytes
    #[serde(default = "default_quota")]
    pub storage_quota_bytes: u64,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Group name written into generated macros
    #[serde(default = "default_macro_group")]
    pub macro_group: String,

    /// Query run against imported preset databases
    #[serde(default = "default_preset_query")]
    pub preset_query: String,

    /// Where generated documents are written. Current directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_quota() -> u64 {
    DEFAULT_STORAGE_QUOTA
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_macro_group() -> String {
    DEFAULT_MACRO_GROUP.to_string()
}

fn default_preset_query() -> String {
    DEFAULT_PRESET_QUERY.to_string()
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA,
            page_size: DEFAULT_PAGE_SIZE,
            macro_group: default_macro_group(),
            preset_query: default_preset_query(),
            output_dir: None,
        }
    }
}

impl KitConfig {
    pub const KEYS: [&'static str; 5] = [
        "storage_quota_bytes",
        "page_size",
        "macro_group",
        "preset_query",
        "output_dir",
    ];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(KitError::Io)?;
        let config: KitConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(KitError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).map_err(KitError::Io)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "storage_quota_bytes" => Some(self.storage_quota_bytes.to_string()),
            "page_size" => Some(self.page_size.to_string()),
            "macro_group" => Some(self.macro_group.clone()),
            "preset_query" => Some(self.preset_query.clone()),
            "output_dir" => Some(
                self.output_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    /// Set a value from its textual form. Errors are user-facing messages.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let value = value.trim();
        match key {
            "storage_quota_bytes" => {
                self.storage_quota_bytes = value
                    .parse()
                    .map_err(|_| format!("Invalid byte count: {}", value))?;
            }
            "page_size" => {
                let size: usize = value
                    .parse()
                    .map_err(|_| format!("Invalid page size: {}", value))?;
                if size == 0 {
                    return Err("Page size must be at least 1".to_string());
                }
                self.page_size = size;
            }
            "macro_group" => {
                if value.is_empty() {
                    return Err("Macro group cannot be empty".to_string());
                }
                self.macro_group = value.to_string();
            }
            "preset_query" => {
                if value.is_empty() {
                    self.preset_query = default_preset_query();
                } else {
                    self.preset_query = value.to_string();
                }
            }
            "output_dir" => {
                self.output_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = KitConfig::default();
        assert_eq!(config.storage_quota_bytes, 5_242_880);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.macro_group, "S1Kit");
        assert!(config.preset_query.contains("PresetDescriptors"));
        assert_eq!(config.output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let config = KitConfig::load(dir.path().join("absent")).unwrap();
        assert_eq!(config, KitConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();

        let mut config = KitConfig::default();
        config.set("page_size", "10").unwrap();
        config.set("output_dir", "/tmp/s1").unwrap();
        config.save(dir.path()).unwrap();

        let loaded = KitConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.page_size, 10);
        assert_eq!(loaded.output_dir, Some(PathBuf::from("/tmp/s1")));
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.json"), r#"{"page_size": 7}"#).unwrap();

        let config = KitConfig::load(dir.path()).unwrap();
        assert_eq!(config.page_size, 7);
        assert_eq!(config.macro_group, "S1Kit");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = KitConfig::default();
        assert!(config.set("page_size", "0").is_err());
        assert!(config.set("page_size", "many").is_err());
        assert!(config.set("storage_quota_bytes", "-1").is_err());
        assert!(config.set("colour", "red").is_err());
        assert_eq!(config, KitConfig::default());
    }

    #[test]
    fn test_get_every_key() {
        let config = KitConfig::default();
        for key in KitConfig::KEYS {
            assert!(config.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(config.get("nope"), None);
    }
}
