//! Core record types.
//!
//! Everything that crosses the storage boundary lives here. Records are flat and
//! serialize as camelCase JSON with absent optional fields omitted, so a stored
//! list can be read back by any client of the same key layout.
//!
//! Preset categories are a closed enum: a [`PresetRecord`] cannot be built with a
//! category outside the allow-list, which is how the allow-list invariant is kept
//! after the extractor boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of the shortcuts export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub section_name: String,
    pub command_name: String,
    pub shortcut: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginCategory {
    AudioSynth,
    AudioEffect,
}

impl PluginCategory {
    /// Registry categories are matched exactly; anything else is not a plugin we keep.
    pub fn from_exact(name: &str) -> Option<Self> {
        match name {
            "AudioSynth" => Some(PluginCategory::AudioSynth),
            "AudioEffect" => Some(PluginCategory::AudioEffect),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginCategory::AudioSynth => "AudioSynth",
            PluginCategory::AudioEffect => "AudioEffect",
        }
    }

    /// The preset category holding presets for plugins of this kind.
    pub fn preset_category(&self) -> PresetCategory {
        match self {
            PluginCategory::AudioSynth => PresetCategory::AudioSynth,
            PluginCategory::AudioEffect => PresetCategory::AudioEffect,
        }
    }
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plugin from the registry export. `class_id` is the vendor-assigned natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRecord {
    pub category: PluginCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default)]
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
}

/// The seven recognized preset categories.
///
/// Deserialization goes through the allow-list, so stored data spelled in any case
/// reads back as the canonical variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PresetCategory {
    Artist,
    AudioEffect,
    AudioSynth,
    #[serde(rename = "FXChain")]
    FxChain,
    MusicEffect,
    PatternBank,
    TrackPreset,
}

impl PresetCategory {
    pub const ALL: [PresetCategory; 7] = [
        PresetCategory::Artist,
        PresetCategory::AudioEffect,
        PresetCategory::AudioSynth,
        PresetCategory::FxChain,
        PresetCategory::MusicEffect,
        PresetCategory::PatternBank,
        PresetCategory::TrackPreset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetCategory::Artist => "Artist",
            PresetCategory::AudioEffect => "AudioEffect",
            PresetCategory::AudioSynth => "AudioSynth",
            PresetCategory::FxChain => "FXChain",
            PresetCategory::MusicEffect => "MusicEffect",
            PresetCategory::PatternBank => "PatternBank",
            PresetCategory::TrackPreset => "TrackPreset",
        }
    }

    /// Allow-list check. Matching ignores case; the result carries the canonical spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for PresetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PresetCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for PresetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            let names: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
            format!("unknown preset category '{}' (expected one of: {})", s, names.join(", "))
        })
    }
}

/// A preset descriptor extracted from the preset database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetRecord {
    pub category: PresetCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_folder: Option<String>,
}

impl PresetRecord {
    pub fn new(category: PresetCategory) -> Self {
        Self {
            category,
            class_id: None,
            vendor: None,
            title: None,
            creator: None,
            sub_folder: None,
        }
    }

    /// `subFolder/title`, or the bare title when there is no sub folder.
    pub fn preset_path(&self) -> String {
        match (non_empty(&self.sub_folder), non_empty(&self.title)) {
            (Some(folder), Some(title)) => format!("{}/{}", folder, title),
            (None, Some(title)) => title.to_string(),
            _ => String::new(),
        }
    }

    pub fn compress(&self) -> CompressedPreset {
        CompressedPreset {
            class_id: self.class_id.clone(),
            vendor: self.vendor.clone(),
            title: self.title.clone(),
            creator: self.creator.clone(),
            sub_folder: self.sub_folder.clone(),
        }
    }
}

/// Lossy projection used by the compressed tier. The category is implied by the
/// key the projection is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_folder: Option<String>,
}

impl CompressedPreset {
    pub fn expand(self, category: PresetCategory) -> PresetRecord {
        PresetRecord {
            category,
            class_id: self.class_id,
            vendor: self.vendor,
            title: self.title,
            creator: self.creator,
            sub_folder: self.sub_folder,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// --- Sticker layouts ---

pub const DEFAULT_BUTTON_COLOR: &str = "#4CAF50";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonShape {
    #[default]
    Square,
    Circle,
}

fn default_color() -> String {
    DEFAULT_BUTTON_COLOR.to_string()
}

/// One physical button of a controller sticker sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerButton {
    pub row: u32,
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub shape: ButtonShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_label: Option<String>,
}

impl ControllerButton {
    pub fn blank(row: u32, column: u32) -> Self {
        Self {
            row,
            column,
            assigned_text: None,
            custom_name: None,
            color: default_color(),
            shape: ButtonShape::Square,
            button_label: Some(format!("{}-{}", row + 1, column + 1)),
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    /// Text printed on the sticker: the custom name wins over the assigned command.
    pub fn display_text(&self) -> Option<&str> {
        self.custom_name
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.assigned_text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLayout {
    pub buttons: Vec<ControllerButton>,
    pub grid_rows: u32,
    pub grid_columns: u32,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    #[default]
    Mm,
    Cm,
}

impl SizeUnit {
    pub fn to_mm(&self, value: f64) -> f64 {
        match self {
            SizeUnit::Mm => value,
            SizeUnit::Cm => value * 10.0,
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeUnit::Mm => f.write_str("mm"),
            SizeUnit::Cm => f.write_str("cm"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonSize {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: SizeUnit,
    pub last_modified: DateTime<Utc>,
}

impl Default for ButtonSize {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 15.0,
            unit: SizeUnit::Mm,
            last_modified: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_ignores_case_and_normalizes() {
        assert_eq!(
            PresetCategory::from_name("fxchain"),
            Some(PresetCategory::FxChain)
        );
        assert_eq!(
            PresetCategory::from_name("AudioSynth"),
            Some(PresetCategory::AudioSynth)
        );
        assert_eq!(PresetCategory::from_name("Loop"), None);
        assert_eq!(PresetCategory::from_name(""), None);
    }

    #[test]
    fn category_serializes_with_canonical_name() {
        let json = serde_json::to_string(&PresetCategory::FxChain).unwrap();
        assert_eq!(json, "\"FXChain\"");
    }

    #[test]
    fn category_deserializes_case_insensitively() {
        let category: PresetCategory = serde_json::from_str("\"fxchain\"").unwrap();
        assert_eq!(category, PresetCategory::FxChain);
        assert!(serde_json::from_str::<PresetCategory>("\"Loop\"").is_err());
    }

    #[test]
    fn preset_path_prefers_sub_folder() {
        let mut preset = PresetRecord::new(PresetCategory::FxChain);
        preset.title = Some("Warm Vocal".into());
        assert_eq!(preset.preset_path(), "Warm Vocal");

        preset.sub_folder = Some("Vocals".into());
        assert_eq!(preset.preset_path(), "Vocals/Warm Vocal");

        preset.title = None;
        assert_eq!(preset.preset_path(), "");
    }

    #[test]
    fn compressed_projection_keeps_five_fields() {
        let preset = PresetRecord {
            category: PresetCategory::AudioEffect,
            class_id: Some("{ABC}".into()),
            vendor: Some("PreSonus".into()),
            title: Some("Pro EQ Air".into()),
            creator: None,
            sub_folder: Some("Mixing".into()),
        };

        let expanded = preset.compress().expand(PresetCategory::AudioEffect);
        assert_eq!(expanded, preset);

        let json = serde_json::to_string(&preset.compress()).unwrap();
        assert!(!json.contains("category"));
        assert!(!json.contains("creator"));
    }

    #[test]
    fn button_assignment_ignores_whitespace() {
        let mut button = ControllerButton::blank(0, 1);
        assert_eq!(button.button_label.as_deref(), Some("1-2"));
        assert!(!button.is_assigned());

        button.assigned_text = Some("   ".into());
        assert!(!button.is_assigned());
        assert_eq!(button.display_text(), None);

        button.assigned_text = Some("Record".into());
        assert!(button.is_assigned());
        assert_eq!(button.display_text(), Some("Record"));

        button.custom_name = Some("REC".into());
        assert_eq!(button.display_text(), Some("REC"));
    }

    #[test]
    fn button_defaults_fill_missing_fields() {
        let button: ControllerButton = serde_json::from_str(r#"{"row":1,"column":2}"#).unwrap();
        assert_eq!(button.color, DEFAULT_BUTTON_COLOR);
        assert_eq!(button.shape, ButtonShape::Square);
    }
}
