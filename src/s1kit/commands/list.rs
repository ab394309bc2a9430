use crate::commands::{CmdMessage, CmdResult, PresetRow};
use crate::error::Result;
use crate::lookup::PluginNameIndex;
use crate::model::{CommandRecord, PluginRecord};
use crate::query::{self, Page, PluginFilter, PresetQuery};
use crate::store::{get_json, keys, KeyValueStore};

pub fn commands<S: KeyValueStore + ?Sized>(store: &S, search: Option<&str>) -> Result<CmdResult> {
    let stored: Option<Vec<CommandRecord>> = get_json(store, keys::COMMANDS)?;
    let mut result = CmdResult::default();

    let stored = match stored {
        Some(stored) => stored,
        None => {
            result.add_message(CmdMessage::info(
                "No commands imported yet. Use `s1kit import commands <file>`.",
            ));
            return Ok(result);
        }
    };

    let commands = query::filter_commands(&stored, search);
    if commands.is_empty() {
        result.add_message(CmdMessage::info("No commands match."));
    }
    Ok(result.with_commands(commands))
}

pub fn plugins<S: KeyValueStore + ?Sized>(store: &S, filter: &PluginFilter) -> Result<CmdResult> {
    let stored: Option<Vec<PluginRecord>> = get_json(store, keys::PLUGINS)?;
    let mut result = CmdResult::default();

    let stored = match stored {
        Some(stored) => stored,
        None => {
            result.add_message(CmdMessage::info(
                "No plugins imported yet. Use `s1kit import plugins <file>`.",
            ));
            return Ok(result);
        }
    };

    let plugins = query::filter_plugins(&stored, filter);
    if plugins.is_empty() {
        result.add_message(CmdMessage::info("No plugins match."));
    }
    Ok(result.with_plugins(plugins))
}

/// One page of presets, each paired with its plugin name when the index knows it.
///
/// The index is loaded from the store on first use.
pub fn presets<S: KeyValueStore + ?Sized>(
    store: &S,
    index: &mut PluginNameIndex,
    q: &PresetQuery,
) -> Result<CmdResult> {
    if !index.is_loaded() {
        index.rebuild(store)?;
    }

    let page = query::query(store, q)?;
    let mut result = CmdResult::default();
    if page.total_count == 0 {
        result.add_message(CmdMessage::info(format!(
            "No {} presets found.",
            q.category
        )));
    } else if page.items.is_empty() {
        result.add_message(CmdMessage::warning(format!(
            "Page {} is past the end ({} presets).",
            q.page + 1,
            page.total_count
        )));
    }

    let rows = page
        .items
        .into_iter()
        .map(|preset| {
            let plugin_name = index.name_for(preset.class_id.as_deref()).map(str::to_string);
            PresetRow {
                preset,
                plugin_name,
            }
        })
        .collect();

    Ok(result.with_presets(Page {
        items: rows,
        total_count: page.total_count,
    }))
}

pub fn categories<S: KeyValueStore + ?Sized>(store: &S) -> Result<CmdResult> {
    let categories = query::available_categories(store)?;
    let mut result = CmdResult::default();
    if categories.is_empty() {
        result.add_message(CmdMessage::info(
            "No presets imported yet. Use `s1kit import presets <file>`.",
        ));
    }
    Ok(result.with_categories(categories))
}
