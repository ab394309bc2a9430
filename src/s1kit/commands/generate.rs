use crate::commands::{CmdMessage, CmdResult};
use crate::error::{KitError, Result};
use crate::macros::{MacroDocument, MacroPlan};
use crate::model::{PluginRecord, PresetCategory, PresetRecord};
use crate::query::{find_preset, load_category};
use crate::report::DocumentSink;
use crate::store::{get_json, keys, KeyValueStore};
use tracing::info;

/// Default FX chain insert mode.
pub const DEFAULT_FX_CHAIN_MODE: u32 = 0;

#[derive(Debug, Clone)]
pub struct MacroOptions {
    /// Macro title and file name; the plugin name or preset title when unset
    pub title: Option<String>,
    pub description: Option<String>,
    pub group: String,
}

fn deliver<K: DocumentSink + ?Sized>(sink: &K, document: MacroDocument) -> Result<CmdResult> {
    let xml = document.render()?;
    let file_name = document.file_name();
    let location = sink.deliver(&file_name, xml.as_bytes())?;
    info!(file = %location, commands = document.plan.commands().len(), "wrote macro");

    let mut result = CmdResult::default();
    if document.plan.commands().is_empty() {
        result.add_message(CmdMessage::warning(
            "This category has no macro actions; the macro is empty",
        ));
    }
    result.add_message(CmdMessage::success(format!("Macro written to {}", location)));
    Ok(result.with_document(location))
}

/// Macro that inserts a plugin, optionally loading one of its stored presets.
///
/// A preset title that does not resolve is reported and the macro is written
/// without the load step.
pub fn plugin<S: KeyValueStore + ?Sized, K: DocumentSink + ?Sized>(
    store: &S,
    sink: &K,
    class_id: &str,
    preset_title: Option<&str>,
    options: &MacroOptions,
) -> Result<CmdResult> {
    let plugins: Vec<PluginRecord> = get_json(store, keys::PLUGINS)?.unwrap_or_default();
    let plugin = plugins
        .iter()
        .find(|p| p.class_id.as_deref() == Some(class_id))
        .ok_or_else(|| KitError::NotFound(format!("No plugin with class ID {}", class_id)))?;

    let mut missing_preset = None;
    let preset = match preset_title.filter(|t| !t.trim().is_empty()) {
        Some(title) => {
            let found = find_preset(store, plugin.category.preset_category(), title, class_id)?;
            if found.is_none() {
                missing_preset = Some(title.to_string());
            }
            found
        }
        None => None,
    };

    let plan = MacroPlan::for_plugin(plugin, &options.group, preset.as_ref());
    let title = options
        .title
        .clone()
        .or_else(|| plugin.name.clone())
        .unwrap_or_else(|| class_id.to_string());
    let document = MacroDocument::new(title, options.group.clone(), plan)
        .with_description(options.description.clone());

    let mut result = deliver(sink, document)?;
    if let Some(title) = missing_preset {
        result.add_message(CmdMessage::warning(format!(
            "Preset '{}' not found for this plugin; it was left out of the macro",
            title
        )));
    }
    Ok(result)
}

/// First stored preset of `category` titled `title` (ignoring case), narrowed by class id.
fn locate_preset<S: KeyValueStore + ?Sized>(
    store: &S,
    category: PresetCategory,
    title: &str,
    class_id: Option<&str>,
) -> Result<Option<PresetRecord>> {
    if let Some(class_id) = class_id {
        return find_preset(store, category, title, class_id);
    }
    Ok(load_category(store, category)?.into_iter().find(|p| {
        p.title
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case(title))
            .unwrap_or(false)
    }))
}

/// Macro that loads a stored preset. The shape follows the preset's category.
pub fn preset<S: KeyValueStore + ?Sized, K: DocumentSink + ?Sized>(
    store: &S,
    sink: &K,
    category: PresetCategory,
    title: &str,
    class_id: Option<&str>,
    fx_chain_mode: u32,
    options: &MacroOptions,
) -> Result<CmdResult> {
    let preset = locate_preset(store, category, title, class_id)?.ok_or_else(|| {
        KitError::NotFound(format!("No {} preset titled '{}'", category, title))
    })?;

    let plan = MacroPlan::for_preset(&preset, fx_chain_mode);
    let title = options
        .title
        .clone()
        .or_else(|| preset.title.clone())
        .unwrap_or_else(|| title.to_string());
    let document = MacroDocument::new(title, options.group.clone(), plan)
        .with_description(options.description.clone());
    deliver(sink, document)
}
