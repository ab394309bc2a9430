//! # Command Layer
//!
//! One module per user-facing operation. Commands hold the business logic: they
//! read and write the store through the core modules and return a [`CmdResult`]
//! carrying structured data plus leveled messages. They never print.
//!
//! Imports parse completely before the first write, so a parse failure returns an
//! error with the stored data untouched.

use crate::config::KitConfig;
use crate::model::{
    ButtonSize, CommandRecord, PluginRecord, PresetCategory, PresetRecord, StoredLayout,
};
use crate::query::Page;
use std::path::PathBuf;

pub mod clear;
pub mod config;
pub mod generate;
pub mod import;
pub mod list;
pub mod report;
pub mod split;
pub mod status;
pub mod sticker;

#[derive(Debug, Clone)]
pub struct KitPaths {
    /// Where the store and config.json live
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// A preset listing row: the record plus the name of the plugin it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetRow {
    pub preset: PresetRecord,
    pub plugin_name: Option<String>,
}

/// Presence and import time of one imported dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataStatus {
    pub dataset: &'static str,
    pub present: bool,
    pub records: usize,
    /// Already formatted for display, "Unknown" when missing
    pub imported: String,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub commands: Vec<CommandRecord>,
    pub plugins: Vec<PluginRecord>,
    pub presets: Option<Page<PresetRow>>,
    pub categories: Vec<PresetCategory>,
    pub status: Vec<DataStatus>,
    pub layout: Option<StoredLayout>,
    pub button_size: Option<ButtonSize>,
    pub palette: Vec<(String, String)>,
    pub config: Option<KitConfig>,
    /// Locations of delivered documents
    pub documents: Vec<String>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_commands(mut self, commands: Vec<CommandRecord>) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<PluginRecord>) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_presets(mut self, presets: Page<PresetRow>) -> Self {
        self.presets = Some(presets);
        self
    }

    pub fn with_categories(mut self, categories: Vec<PresetCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_status(mut self, status: Vec<DataStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_layout(mut self, layout: StoredLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_button_size(mut self, size: ButtonSize) -> Self {
        self.button_size = Some(size);
        self
    }

    pub fn with_config(mut self, config: KitConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_document(mut self, location: String) -> Self {
        self.documents.push(location);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
