use crate::commands::{CmdMessage, CmdResult};
use crate::error::{KitError, Result};
use crate::model::{CommandRecord, PluginRecord, PresetCategory};
use crate::query::load_category;
use crate::report::{
    presets_report_name, DocumentSink, ReportRenderer, ReportTable, COMMANDS_REPORT,
    PLUGINS_REPORT,
};
use crate::store::{get_json, keys, KeyValueStore};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Commands,
    Plugins,
    Presets,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Commands => f.write_str("commands"),
            ReportKind::Plugins => f.write_str("plugins"),
            ReportKind::Presets => f.write_str("presets"),
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "commands" | "shortcuts" => Ok(ReportKind::Commands),
            "plugins" => Ok(ReportKind::Plugins),
            "presets" => Ok(ReportKind::Presets),
            _ => Err(format!("unknown report '{}'", s)),
        }
    }
}

fn emit<R: ReportRenderer + ?Sized, K: DocumentSink + ?Sized>(
    renderer: &R,
    sink: &K,
    table: &ReportTable,
    output_name: &str,
) -> Result<CmdResult> {
    let document = renderer.render_table(table, output_name)?;
    let location = sink.deliver(&document.file_name, &document.bytes)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Report with {} rows written to {}",
        table.rows.len(),
        location
    )));
    Ok(result.with_document(location))
}

pub fn commands<S, R, K>(store: &S, renderer: &R, sink: &K) -> Result<CmdResult>
where
    S: KeyValueStore + ?Sized,
    R: ReportRenderer + ?Sized,
    K: DocumentSink + ?Sized,
{
    let commands: Vec<CommandRecord> = get_json(store, keys::COMMANDS)?
        .ok_or_else(|| KitError::NotFound("No commands imported".to_string()))?;
    emit(renderer, sink, &ReportTable::commands(&commands), COMMANDS_REPORT)
}

pub fn plugins<S, R, K>(store: &S, renderer: &R, sink: &K) -> Result<CmdResult>
where
    S: KeyValueStore + ?Sized,
    R: ReportRenderer + ?Sized,
    K: DocumentSink + ?Sized,
{
    let plugins: Vec<PluginRecord> = get_json(store, keys::PLUGINS)?
        .ok_or_else(|| KitError::NotFound("No plugins imported".to_string()))?;
    emit(renderer, sink, &ReportTable::plugins(&plugins), PLUGINS_REPORT)
}

/// Every preset of one category, resolved through the storage tiers.
pub fn presets<S, R, K>(
    store: &S,
    renderer: &R,
    sink: &K,
    category: PresetCategory,
) -> Result<CmdResult>
where
    S: KeyValueStore + ?Sized,
    R: ReportRenderer + ?Sized,
    K: DocumentSink + ?Sized,
{
    let presets = load_category(store, category)?;
    if presets.is_empty() {
        return Err(KitError::NotFound(format!("No {} presets imported", category)));
    }
    emit(
        renderer,
        sink,
        &ReportTable::presets(&presets),
        &presets_report_name(category),
    )
}
