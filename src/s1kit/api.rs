//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer. It is the single
//! entry point for all s1kit operations, regardless of the UI being used.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Normalizes inputs** (config defaults such as page size and macro group)
//! - **Owns** the [`PluginNameIndex`] and keeps it in step with plugin imports
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs`
//! - **I/O operations**: No stdout, stderr, or file formatting
//! - **Presentation concerns**: Returns data structures, not strings
//!
//! ## Generic Over KeyValueStore
//!
//! `KitApi<S: KeyValueStore>` is generic over the storage backend:
//! - Production: `KitApi<FsStore>`
//! - Testing: `KitApi<MemStore>`
//!
//! Documents leave through a [`DocumentSink`] passed per call, so the same API can
//! write into a directory or collect output in memory.

use crate::commands;
use crate::commands::generate::MacroOptions;
use crate::config::KitConfig;
use crate::error::{KitError, Result};
use crate::lookup::PluginNameIndex;
use crate::model::{PresetCategory, SizeUnit};
use crate::parse::presets::SqliteRowSource;
use crate::query::{PluginFilter, PresetQuery};
use crate::report::{DocumentSink, ReportRenderer};
use crate::store::KeyValueStore;

/// The main API facade for s1kit operations.
///
/// All UI clients should interact through this API.
pub struct KitApi<S: KeyValueStore> {
    store: S,
    paths: commands::KitPaths,
    config: KitConfig,
    index: PluginNameIndex,
}

impl<S: KeyValueStore> KitApi<S> {
    pub fn new(store: S, paths: commands::KitPaths, config: KitConfig) -> Self {
        Self {
            store,
            paths,
            config,
            index: PluginNameIndex::new(),
        }
    }

    pub fn import(&mut self, kind: ImportKind, bytes: &[u8]) -> Result<commands::CmdResult> {
        match kind {
            ImportKind::Commands => commands::import::commands(&self.store, bytes),
            ImportKind::Plugins => commands::import::plugins(&self.store, bytes, &mut self.index),
            ImportKind::Presets => {
                let source = SqliteRowSource::new(self.config.preset_query.clone());
                commands::import::presets(&self.store, bytes, &source)
            }
        }
    }

    pub fn list_commands(&self, search: Option<&str>) -> Result<commands::CmdResult> {
        commands::list::commands(&self.store, search)
    }

    pub fn list_plugins(&self, filter: &PluginFilter) -> Result<commands::CmdResult> {
        commands::list::plugins(&self.store, filter)
    }

    /// A query for `category` with the configured page size.
    pub fn preset_query(&self, category: PresetCategory) -> PresetQuery {
        let mut query = PresetQuery::new(category);
        query.page_size = self.config.page_size;
        query
    }

    pub fn list_presets(&mut self, query: &PresetQuery) -> Result<commands::CmdResult> {
        commands::list::presets(&self.store, &mut self.index, query)
    }

    pub fn categories(&self) -> Result<commands::CmdResult> {
        commands::list::categories(&self.store)
    }

    pub fn split(&self) -> Result<commands::CmdResult> {
        commands::split::run(&self.store)
    }

    pub fn status(&self) -> Result<commands::CmdResult> {
        commands::status::run(&self.store)
    }

    pub fn clear(&mut self) -> Result<commands::CmdResult> {
        let result = commands::clear::run(&self.store)?;
        self.index.rebuild_from(&[]);
        Ok(result)
    }

    pub fn rebuild_index(&mut self) -> Result<()> {
        self.index.rebuild(&self.store)
    }

    pub fn plugin_macro<K: DocumentSink + ?Sized>(
        &self,
        sink: &K,
        class_id: &str,
        preset: Option<&str>,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<commands::CmdResult> {
        let options = self.macro_options(title, description);
        commands::generate::plugin(&self.store, sink, class_id, preset, &options)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn preset_macro<K: DocumentSink + ?Sized>(
        &self,
        sink: &K,
        category: PresetCategory,
        preset_title: &str,
        class_id: Option<&str>,
        fx_chain_mode: Option<u32>,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<commands::CmdResult> {
        let options = self.macro_options(title, description);
        commands::generate::preset(
            &self.store,
            sink,
            category,
            preset_title,
            class_id,
            fx_chain_mode.unwrap_or(commands::generate::DEFAULT_FX_CHAIN_MODE),
            &options,
        )
    }

    /// Preset reports need a category; the others ignore it.
    pub fn report<R, K>(
        &self,
        kind: ReportKind,
        category: Option<PresetCategory>,
        renderer: &R,
        sink: &K,
    ) -> Result<commands::CmdResult>
    where
        R: ReportRenderer + ?Sized,
        K: DocumentSink + ?Sized,
    {
        match kind {
            ReportKind::Commands => commands::report::commands(&self.store, renderer, sink),
            ReportKind::Plugins => commands::report::plugins(&self.store, renderer, sink),
            ReportKind::Presets => {
                let category = category.ok_or_else(|| {
                    KitError::Api("A preset report needs a category".to_string())
                })?;
                commands::report::presets(&self.store, renderer, sink, category)
            }
        }
    }

    pub fn sticker_show(&self) -> Result<commands::CmdResult> {
        commands::sticker::show(&self.store)
    }

    pub fn sticker_init(&self, rows: u32, columns: u32) -> Result<commands::CmdResult> {
        commands::sticker::init(&self.store, rows, columns)
    }

    pub fn sticker_assign(&self, edit: ButtonEdit) -> Result<commands::CmdResult> {
        commands::sticker::assign(&self.store, edit)
    }

    pub fn sticker_unassign(&self, row: u32, column: u32) -> Result<commands::CmdResult> {
        commands::sticker::unassign(&self.store, row, column)
    }

    pub fn sticker_size(
        &self,
        width: f64,
        height: f64,
        unit: SizeUnit,
    ) -> Result<commands::CmdResult> {
        commands::sticker::size(&self.store, width, height, unit)
    }

    pub fn sticker_export<R, K>(&self, renderer: &R, sink: &K) -> Result<commands::CmdResult>
    where
        R: ReportRenderer + ?Sized,
        K: DocumentSink + ?Sized,
    {
        commands::sticker::export(&self.store, renderer, sink)
    }

    pub fn sticker_colors(&self) -> commands::CmdResult {
        commands::sticker::colors()
    }

    pub fn config(&self, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&self.paths, action)
    }

    pub fn paths(&self) -> &commands::KitPaths {
        &self.paths
    }

    pub fn settings(&self) -> &KitConfig {
        &self.config
    }

    fn macro_options(&self, title: Option<String>, description: Option<String>) -> MacroOptions {
        MacroOptions {
            title: title.filter(|t| !t.trim().is_empty()),
            description,
            group: self.config.macro_group.clone(),
        }
    }
}

pub use crate::commands::config::ConfigAction;
pub use crate::commands::import::ImportKind;
pub use crate::commands::report::ReportKind;
pub use crate::commands::sticker::ButtonEdit;
pub use crate::commands::{CmdMessage, CmdResult, DataStatus, KitPaths, MessageLevel, PresetRow};
