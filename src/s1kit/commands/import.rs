use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::lookup::PluginNameIndex;
use crate::model::PluginCategory;
use crate::parse::presets::{extract_presets, PresetRowSource};
use crate::parse::{commands::parse_commands, decode_text, plugins::parse_plugins};
use crate::store::{keys, set_json, KeyValueStore};
use crate::tiering::{group_by_category, persist_presets};
use chrono::Utc;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Commands,
    Plugins,
    Presets,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Commands => f.write_str("commands"),
            ImportKind::Plugins => f.write_str("plugins"),
            ImportKind::Presets => f.write_str("presets"),
        }
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "commands" | "shortcuts" => Ok(ImportKind::Commands),
            "plugins" => Ok(ImportKind::Plugins),
            "presets" => Ok(ImportKind::Presets),
            _ => Err(format!("unknown import kind '{}'", s)),
        }
    }
}

fn stamp<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<()> {
    store.set(key, &Utc::now().to_rfc3339())
}

/// Import a keyboard shortcuts export, replacing the stored commands.
pub fn commands<S: KeyValueStore + ?Sized>(store: &S, bytes: &[u8]) -> Result<CmdResult> {
    let html = decode_text(bytes)?;
    let commands = parse_commands(&html)?;

    set_json(store, keys::COMMANDS, &commands)?;
    stamp(store, keys::COMMANDS_IMPORT_TIME)?;

    let sections: BTreeSet<&str> = commands.iter().map(|c| c.section_name.as_str()).collect();
    info!(commands = commands.len(), sections = sections.len(), "imported commands");

    let mut result = CmdResult::default();
    if commands.is_empty() {
        result.add_message(CmdMessage::warning(
            "No commands found. Is this a Studio One keyboard shortcuts export?",
        ));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Imported {} commands in {} sections",
            commands.len(),
            sections.len()
        )));
    }
    Ok(result.with_commands(commands))
}

/// Import a plugin registry export and rebuild the name index from it.
pub fn plugins<S: KeyValueStore + ?Sized>(
    store: &S,
    bytes: &[u8],
    index: &mut PluginNameIndex,
) -> Result<CmdResult> {
    let xml = decode_text(bytes)?;
    let plugins = parse_plugins(&xml)?;

    set_json(store, keys::PLUGINS, &plugins)?;
    stamp(store, keys::PLUGINS_IMPORT_TIME)?;
    index.rebuild_from(&plugins);

    let synths = plugins
        .iter()
        .filter(|p| p.category == PluginCategory::AudioSynth)
        .count();
    let effects = plugins.len() - synths;
    info!(synths, effects, "imported plugins");

    let mut result = CmdResult::default();
    if plugins.is_empty() {
        result.add_message(CmdMessage::warning(
            "No instruments or effects found in the plugin registry",
        ));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Imported {} plugins ({} instruments, {} effects)",
            plugins.len(),
            synths,
            effects
        )));
    }
    Ok(result.with_plugins(plugins))
}

/// Import a preset database, replacing every stored preset tier.
pub fn presets<S: KeyValueStore + ?Sized, R: PresetRowSource + ?Sized>(
    store: &S,
    bytes: &[u8],
    source: &R,
) -> Result<CmdResult> {
    let presets = extract_presets(source, bytes)?;
    let report = persist_presets(store, &presets)?;
    stamp(store, keys::PRESETS_IMPORT_TIME)?;

    let mut result = CmdResult::default();
    if presets.is_empty() {
        result.add_message(CmdMessage::warning(
            "No presets with a recognized category were found",
        ));
        return Ok(result);
    }

    let groups = group_by_category(&presets);
    for (category, group) in &groups {
        result.add_message(CmdMessage::info(format!(
            "{}: {} presets",
            category,
            group.len()
        )));
    }

    if !report.fully_split() {
        let failed: Vec<&str> = report.failed.iter().map(|c| c.as_str()).collect();
        result.add_message(CmdMessage::warning(format!(
            "Storage is tight; kept {} in the combined store",
            failed.join(", ")
        )));
        if report.purged {
            result.add_message(CmdMessage::warning(
                "Per-category data was dropped to make room; listings will be slower",
            ));
        }
        if !report.compressed_written {
            result.add_message(CmdMessage::warning(
                "Compressed fallback could not be stored",
            ));
        }
    }

    result.add_message(CmdMessage::success(format!(
        "Imported {} presets in {} categories",
        report.total,
        groups.len()
    )));
    let categories = groups.iter().map(|(c, _)| *c).collect();
    Ok(result.with_categories(categories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::error::KitError;
    use crate::model::PresetCategory;
    use crate::parse::presets::RawRow;
    use crate::query::{query, PresetQuery};
    use crate::store::memory::MemStore;
    use crate::store::{get_json, has_value};

    struct Rows(Vec<(&'static str, &'static str)>);

    impl PresetRowSource for Rows {
        fn rows(&self, _bytes: &[u8]) -> Result<Vec<RawRow>> {
            Ok(self
                .0
                .iter()
                .map(|(category, title)| {
                    let mut row = RawRow::new();
                    row.insert("category".into(), Some(category.to_string()));
                    row.insert("title".into(), Some(title.to_string()));
                    row
                })
                .collect())
        }
    }

    struct Broken;

    impl PresetRowSource for Broken {
        fn rows(&self, _bytes: &[u8]) -> Result<Vec<RawRow>> {
            Err(KitError::Parse("not a database".into()))
        }
    }

    const HTML: &str = "<h2>Transport</h2><table><tr><td>Play</td><td>Space</td></tr></table>";

    #[test]
    fn commands_are_stored_with_import_time() {
        let store = MemStore::new();
        let result = commands(&store, HTML.as_bytes()).unwrap();
        assert_eq!(result.commands.len(), 1);
        assert_eq!(result.messages[0].level, MessageLevel::Success);

        let stored: Vec<crate::model::CommandRecord> =
            get_json(&store, keys::COMMANDS).unwrap().unwrap();
        assert_eq!(stored[0].shortcut, "Space");
        let stamp = store.get(keys::COMMANDS_IMPORT_TIME).unwrap().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn plugins_rebuild_the_index() {
        let store = MemStore::new();
        let xml = r#"<R><Section><ClassDescription category="AudioSynth" name="Mai Tai" classID="{M}"/></Section></R>"#;
        let mut index = PluginNameIndex::new();

        let result = plugins(&store, xml.as_bytes(), &mut index).unwrap();
        assert_eq!(result.plugins.len(), 1);
        assert_eq!(index.name_for(Some("{M}")), Some("Mai Tai"));
        assert!(has_value(&store, keys::PLUGINS_IMPORT_TIME).unwrap());
    }

    #[test]
    fn failed_parse_leaves_previous_data() {
        let store = MemStore::new();
        store.set(keys::PLUGINS, "[]").unwrap();
        let mut index = PluginNameIndex::new();

        assert!(plugins(&store, b"<Section>", &mut index).is_err());
        assert_eq!(store.get(keys::PLUGINS).unwrap().as_deref(), Some("[]"));
        assert!(!index.is_loaded());

        store.set("PresetData_Artist", "[]").unwrap();
        assert!(presets(&store, b"", &Broken).is_err());
        assert!(store.contains("PresetData_Artist"));
        assert!(!store.contains(keys::PRESETS_IMPORT_TIME));
    }

    #[test]
    fn presets_are_tiered_and_reported() {
        let store = MemStore::new();
        let source = Rows(vec![
            ("AudioSynth", "Pad"),
            ("FXChain", "Vocal"),
            ("Loop", "Ignored"),
            ("AudioSynth", "Lead"),
        ]);

        let result = presets(&store, b"", &source).unwrap();
        assert_eq!(
            result.categories,
            vec![PresetCategory::AudioSynth, PresetCategory::FxChain]
        );
        assert!(result
            .messages
            .iter()
            .any(|m| m.content == "Imported 3 presets in 2 categories"));

        let page = query(&store, &PresetQuery::new(PresetCategory::AudioSynth)).unwrap();
        assert_eq!(page.total_count, 2);
    }

    #[test]
    fn import_kind_parses() {
        assert_eq!("Presets".parse::<ImportKind>(), Ok(ImportKind::Presets));
        assert_eq!("shortcuts".parse::<ImportKind>(), Ok(ImportKind::Commands));
        assert!("loops".parse::<ImportKind>().is_err());
    }
}
