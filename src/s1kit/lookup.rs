use crate::error::Result;
use crate::model::PluginRecord;
use crate::store::{get_json, keys, KeyValueStore};
use std::collections::HashMap;
use tracing::debug;

/// classId to plugin name, built from the stored plugin list.
///
/// Owned by whoever needs it (the API holds one) and rebuilt wholesale; there is
/// no incremental update.
#[derive(Debug, Default)]
pub struct PluginNameIndex {
    names: HashMap<String, String>,
    loaded: bool,
}

impl PluginNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload from `PluginsData`. Plugins without a class id or a name are skipped.
    pub fn rebuild<S: KeyValueStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let plugins: Vec<PluginRecord> = get_json(store, keys::PLUGINS)?.unwrap_or_default();
        self.rebuild_from(&plugins);
        Ok(())
    }

    pub fn rebuild_from(&mut self, plugins: &[PluginRecord]) {
        self.names = plugins
            .iter()
            .filter_map(|p| match (p.class_id.as_deref(), p.name.as_deref()) {
                (Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => {
                    Some((id.to_string(), name.to_string()))
                }
                _ => None,
            })
            .collect();
        self.loaded = true;
        debug!(entries = self.names.len(), "rebuilt plugin name index");
    }

    pub fn name_for(&self, class_id: Option<&str>) -> Option<&str> {
        class_id
            .filter(|id| !id.is_empty())
            .and_then(|id| self.names.get(id))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn class_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.names.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.values().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PluginCategory;
    use crate::store::memory::MemStore;
    use crate::store::set_json;

    fn plugin(class_id: Option<&str>, name: Option<&str>) -> PluginRecord {
        PluginRecord {
            category: PluginCategory::AudioSynth,
            class_id: class_id.map(str::to_string),
            vendor: String::new(),
            name: name.map(str::to_string),
            version: String::new(),
            folder: String::new(),
            sub_category: None,
        }
    }

    #[test]
    fn starts_unloaded() {
        let index = PluginNameIndex::new();
        assert!(!index.is_loaded());
        assert_eq!(index.name_for(Some("{X}")), None);
    }

    #[test]
    fn rebuild_skips_incomplete_plugins() {
        let store = MemStore::new();
        set_json(
            &store,
            keys::PLUGINS,
            &vec![
                plugin(Some("{MAI}"), Some("Mai Tai")),
                plugin(None, Some("Nameless id")),
                plugin(Some("{EMPTY}"), Some("")),
                plugin(Some("{PRESENCE}"), Some("Presence XT")),
            ],
        )
        .unwrap();

        let mut index = PluginNameIndex::new();
        index.rebuild(&store).unwrap();
        assert!(index.is_loaded());
        assert_eq!(index.len(), 2);
        assert_eq!(index.name_for(Some("{MAI}")), Some("Mai Tai"));
        assert_eq!(index.name_for(Some("{EMPTY}")), None);
        assert_eq!(index.name_for(None), None);
        assert_eq!(index.class_ids(), vec!["{MAI}", "{PRESENCE}"]);
        assert_eq!(index.names(), vec!["Mai Tai", "Presence XT"]);
    }

    #[test]
    fn rebuild_replaces_previous_entries() {
        let mut index = PluginNameIndex::new();
        index.rebuild_from(&[plugin(Some("{A}"), Some("Alpha"))]);
        index.rebuild(&MemStore::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.is_loaded());
    }
}
