//! # Query Engine
//!
//! Reads one preset category back out of whichever tier holds it, then applies
//! filters, sorting and pagination in that order:
//!
//! ```text
//! tier resolution -> exact field match -> free-text search -> sort -> page
//! ```
//!
//! Tier resolution probes the per-category key, then the compressed key, then the
//! combined key, and uses the first one that yields records. Tiers are never
//! merged. A tier that cannot be decoded is logged and skipped.
//!
//! Plugin and command listings have simpler filters and live here too.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{KitError, Result};
use crate::model::{CommandRecord, CompressedPreset, PluginRecord, PresetCategory, PresetRecord};
use crate::store::{get_json, keys, KeyValueStore};
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetField {
    Category,
    ClassId,
    Vendor,
    Title,
    Creator,
    SubFolder,
}

impl PresetField {
    pub const ALL: [PresetField; 6] = [
        PresetField::Category,
        PresetField::ClassId,
        PresetField::Vendor,
        PresetField::Title,
        PresetField::Creator,
        PresetField::SubFolder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetField::Category => "Category",
            PresetField::ClassId => "ClassId",
            PresetField::Vendor => "Vendor",
            PresetField::Title => "Title",
            PresetField::Creator => "Creator",
            PresetField::SubFolder => "SubFolder",
        }
    }

    /// Field names match ignoring case and underscores ("class_id" == "ClassId").
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().to_lowercase() == wanted)
    }

    pub fn value<'a>(&self, preset: &'a PresetRecord) -> Option<&'a str> {
        match self {
            PresetField::Category => Some(preset.category.as_str()),
            PresetField::ClassId => preset.class_id.as_deref(),
            PresetField::Vendor => preset.vendor.as_deref(),
            PresetField::Title => preset.title.as_deref(),
            PresetField::Creator => preset.creator.as_deref(),
            PresetField::SubFolder => preset.sub_folder.as_deref(),
        }
    }

    /// Fields a listing can be sorted by.
    pub fn is_sortable(&self) -> bool {
        !matches!(self, PresetField::Category)
    }
}

impl fmt::Display for PresetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown preset field '{}'", s))
    }
}

#[derive(Debug, Clone)]
pub struct PresetQuery {
    pub category: PresetCategory,
    /// Zero-based
    pub page: usize,
    pub page_size: usize,
    pub search: Option<String>,
    pub exact: Option<(PresetField, String)>,
    pub sort_by: Option<String>,
    pub ascending: bool,
}

impl PresetQuery {
    pub fn new(category: PresetCategory) -> Self {
        Self {
            category,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            exact: None,
            sort_by: None,
            ascending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of records after filtering, across all pages
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

/// Decode a tier. Corrupt JSON is logged and treated as absent; store failures propagate.
fn read_tier<S: KeyValueStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>> {
    match get_json(store, key) {
        Ok(value) => Ok(value),
        Err(KitError::Serialization(e)) => {
            warn!(key = key, error = %e, "skipping undecodable preset tier");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// All presets of one category, from the highest-priority tier that has any.
pub fn load_category<S: KeyValueStore + ?Sized>(
    store: &S,
    category: PresetCategory,
) -> Result<Vec<PresetRecord>> {
    let own: Option<Vec<PresetRecord>> = read_tier(store, &keys::preset_category(category))?;
    if let Some(presets) = own.filter(|p| !p.is_empty()) {
        debug!(category = %category, count = presets.len(), "loaded from category tier");
        return Ok(presets);
    }

    let compressed: Option<BTreeMap<String, Vec<CompressedPreset>>> =
        read_tier(store, keys::PRESETS_COMPRESSED)?;
    if let Some(entries) = compressed
        .and_then(|mut map| map.remove(category.as_str()))
        .filter(|entries| !entries.is_empty())
    {
        debug!(category = %category, count = entries.len(), "loaded from compressed tier");
        return Ok(entries.into_iter().map(|c| c.expand(category)).collect());
    }

    let combined: Option<Vec<PresetRecord>> = read_tier(store, keys::PRESETS)?;
    let presets: Vec<PresetRecord> = combined
        .unwrap_or_default()
        .into_iter()
        .filter(|p| p.category == category)
        .collect();
    debug!(category = %category, count = presets.len(), "loaded from combined tier");
    Ok(presets)
}

fn matches_search(preset: &PresetRecord, needle: &str) -> bool {
    PresetField::ALL.iter().any(|field| {
        field
            .value(preset)
            .map(|v| v.to_lowercase().contains(needle))
            .unwrap_or(false)
    })
}

/// Exact match first, then the case-insensitive search over every field.
pub fn filter_presets(
    presets: Vec<PresetRecord>,
    exact: Option<&(PresetField, String)>,
    search: Option<&str>,
) -> Vec<PresetRecord> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    presets
        .into_iter()
        .filter(|p| match exact {
            Some((field, value)) if !value.is_empty() => field.value(p) == Some(value.as_str()),
            _ => true,
        })
        .filter(|p| match &needle {
            Some(needle) => matches_search(p, needle),
            None => true,
        })
        .collect()
}

fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

/// Total order over presets keyed on `primary`, with the remaining fields as tie-breakers.
pub fn compare_by(primary: PresetField, a: &PresetRecord, b: &PresetRecord) -> Ordering {
    std::iter::once(primary)
        .chain(PresetField::ALL.iter().copied().filter(|f| *f != primary))
        .map(|field| compare_values(field.value(a), field.value(b)))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Sort in place. Unknown or unsortable field names leave the order untouched.
pub fn sort_presets(presets: &mut [PresetRecord], sort_by: &str, ascending: bool) {
    let field = match PresetField::from_name(sort_by).filter(PresetField::is_sortable) {
        Some(field) => field,
        None => return,
    };
    if ascending {
        presets.sort_by(|a, b| compare_by(field, a, b));
    } else {
        presets.sort_by(|a, b| compare_by(field, b, a));
    }
}

pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let start = page.saturating_mul(page_size);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page_size).min(items.len());
    items[start..end].to_vec()
}

pub fn query<S: KeyValueStore + ?Sized>(store: &S, q: &PresetQuery) -> Result<Page<PresetRecord>> {
    let presets = load_category(store, q.category)?;
    if presets.is_empty() {
        return Ok(Page::empty());
    }

    let mut filtered = filter_presets(presets, q.exact.as_ref(), q.search.as_deref());
    if let Some(sort_by) = q.sort_by.as_deref() {
        sort_presets(&mut filtered, sort_by, q.ascending);
    }

    Ok(Page {
        items: paginate(&filtered, q.page, q.page_size),
        total_count: filtered.len(),
    })
}

/// Categories that have preset data, resolved tier by tier like [`load_category`].
pub fn available_categories<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<PresetCategory>> {
    let mut found = Vec::new();
    for category in PresetCategory::ALL {
        if crate::store::has_value(store, &keys::preset_category(category))? {
            found.push(category);
        }
    }
    if !found.is_empty() {
        return Ok(found);
    }

    let compressed: Option<BTreeMap<String, serde_json::Value>> =
        read_tier(store, keys::PRESETS_COMPRESSED)?;
    if let Some(map) = compressed {
        found.extend(map.keys().filter_map(|k| PresetCategory::from_name(k)));
        if !found.is_empty() {
            return Ok(found);
        }
    }

    let combined: Option<Vec<PresetRecord>> = read_tier(store, keys::PRESETS)?;
    for preset in combined.unwrap_or_default() {
        if !found.contains(&preset.category) {
            found.push(preset.category);
        }
    }
    Ok(found)
}

/// First preset of `category` whose title and class id match, ignoring case.
///
/// Looks in whichever tier holds the category. Blank arguments never match.
pub fn find_preset<S: KeyValueStore + ?Sized>(
    store: &S,
    category: PresetCategory,
    title: &str,
    class_id: &str,
) -> Result<Option<PresetRecord>> {
    if title.is_empty() || class_id.is_empty() {
        return Ok(None);
    }
    let same = |value: &Option<String>, wanted: &str| {
        value
            .as_deref()
            .map(|v| !v.is_empty() && v.eq_ignore_ascii_case(wanted))
            .unwrap_or(false)
    };
    Ok(load_category(store, category)?
        .into_iter()
        .find(|p| same(&p.title, title) && same(&p.class_id, class_id)))
}

// --- Plugins and commands ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginField {
    Name,
    Vendor,
    Folder,
    ClassId,
}

impl PluginField {
    pub fn value<'a>(&self, plugin: &'a PluginRecord) -> Option<&'a str> {
        match self {
            PluginField::Name => plugin.name.as_deref(),
            PluginField::Vendor => Some(plugin.vendor.as_str()),
            PluginField::Folder => Some(plugin.folder.as_str()),
            PluginField::ClassId => plugin.class_id.as_deref(),
        }
    }
}

impl FromStr for PluginField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().replace('_', "").to_lowercase().as_str() {
            "name" => Ok(PluginField::Name),
            "vendor" => Ok(PluginField::Vendor),
            "folder" => Ok(PluginField::Folder),
            "classid" => Ok(PluginField::ClassId),
            _ => Err(format!("unknown plugin field '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PluginFilter {
    pub vst3_only: bool,
    pub exact: Option<(PluginField, String)>,
    pub search: Option<String>,
}

pub fn filter_plugins(plugins: &[PluginRecord], filter: &PluginFilter) -> Vec<PluginRecord> {
    let needle = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    plugins
        .iter()
        .filter(|p| {
            !filter.vst3_only
                || p.sub_category
                    .as_deref()
                    .map(|s| s.contains("VST3"))
                    .unwrap_or(false)
        })
        .filter(|p| match &filter.exact {
            Some((field, value)) if !value.is_empty() => field.value(p) == Some(value.as_str()),
            _ => true,
        })
        .filter(|p| match &needle {
            Some(needle) => [
                Some(p.category.as_str()),
                p.name.as_deref(),
                Some(p.vendor.as_str()),
                Some(p.version.as_str()),
                Some(p.folder.as_str()),
                p.class_id.as_deref(),
            ]
            .iter()
            .flatten()
            .any(|v| v.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .cloned()
        .collect()
}

pub fn filter_commands(commands: &[CommandRecord], search: Option<&str>) -> Vec<CommandRecord> {
    let needle = match search.map(|s| s.trim().to_lowercase()) {
        Some(needle) if !needle.is_empty() => needle,
        _ => return commands.to_vec(),
    };
    commands
        .iter()
        .filter(|c| {
            [&c.section_name, &c.command_name, &c.shortcut]
                .iter()
                .any(|v| v.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}
