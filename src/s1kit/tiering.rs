//! # Preset Storage Tiering
//!
//! A preset database can easily be larger than the store will accept. Presets are
//! therefore written in up to three representations ("tiers"):
//!
//! 1. **Per-category**: `PresetData_<Category>`, one full list per category. The
//!    normal case, and the fastest to read.
//! 2. **Combined**: `PresetData`, the whole batch. Only written when at least one
//!    category could not be stored on its own.
//! 3. **Compressed**: `PresetData_Compressed`, an object keyed by the failed
//!    categories holding [`CompressedPreset`] projections.
//!
//! Readers in [`crate::query`] probe the tiers in that order and stop at the first
//! hit. Every import starts by removing all preset keys, so stale tiers from an
//! earlier import can never shadow the new data.

use crate::error::Result;
use crate::model::{CompressedPreset, PresetCategory, PresetRecord};
use crate::store::{get_json, keys, set_json, KeyValueStore};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What [`persist_presets`] ended up writing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// Total presets persisted
    pub total: usize,
    /// Categories held in their own key once persistence finished
    pub stored: Vec<PresetCategory>,
    /// Categories whose own key could not be written
    pub failed: Vec<PresetCategory>,
    pub combined_written: bool,
    /// Per-category and compressed keys were dropped to make room for the combined tier
    pub purged: bool,
    pub compressed_written: bool,
}

impl PersistReport {
    pub fn fully_split(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Groups presets by category, in order of first appearance.
pub fn group_by_category(presets: &[PresetRecord]) -> Vec<(PresetCategory, Vec<&PresetRecord>)> {
    let mut groups: Vec<(PresetCategory, Vec<&PresetRecord>)> = Vec::new();
    for preset in presets {
        match groups.iter_mut().find(|(c, _)| *c == preset.category) {
            Some((_, group)) => group.push(preset),
            None => groups.push((preset.category, vec![preset])),
        }
    }
    groups
}

/// Removes every per-category key and the compressed key.
fn purge_split_tiers<S: KeyValueStore + ?Sized>(store: &S) -> Result<()> {
    for category in PresetCategory::ALL {
        store.remove(&keys::preset_category(category))?;
    }
    store.remove(keys::PRESETS_COMPRESSED)
}

/// Removes every preset key: all tiers of a previous import.
pub fn remove_preset_keys<S: KeyValueStore + ?Sized>(store: &S) -> Result<()> {
    purge_split_tiers(store)?;
    store.remove(keys::PRESETS)
}

/// Persist a freshly imported preset batch, replacing any earlier one.
///
/// Per-category write failures are recovered from. The only fatal outcome is the
/// combined tier failing again after the split tiers were purged to make room.
pub fn persist_presets<S: KeyValueStore + ?Sized>(
    store: &S,
    presets: &[PresetRecord],
) -> Result<PersistReport> {
    remove_preset_keys(store)?;

    let groups = group_by_category(presets);
    let mut report = PersistReport {
        total: presets.len(),
        ..PersistReport::default()
    };

    for (category, group) in &groups {
        let key = keys::preset_category(*category);
        match set_json(store, &key, group) {
            Ok(()) => {
                debug!(category = %category, count = group.len(), "stored preset category");
                report.stored.push(*category);
            }
            Err(e) if e.is_capacity() => {
                warn!(category = %category, "category too large for its own key, falling back");
                report.failed.push(*category);
            }
            Err(e) => {
                warn!(category = %category, error = %e, "failed to store category");
                report.failed.push(*category);
            }
        }
    }

    if report.failed.is_empty() {
        info!(
            total = report.total,
            categories = report.stored.len(),
            "all preset categories stored individually"
        );
        return Ok(report);
    }

    match set_json(store, keys::PRESETS, presets) {
        Ok(()) => {}
        Err(e) if e.is_capacity() => {
            warn!("combined preset data does not fit, purging split tiers and retrying");
            purge_split_tiers(store)?;
            report.purged = true;
            report.stored.clear();
            set_json(store, keys::PRESETS, presets)?;
        }
        Err(e) => return Err(e),
    }
    report.combined_written = true;

    let compressed: BTreeMap<&str, Vec<CompressedPreset>> = groups
        .iter()
        .filter(|(category, _)| report.failed.contains(category))
        .map(|(category, group)| {
            (
                category.as_str(),
                group.iter().map(|p| p.compress()).collect(),
            )
        })
        .collect();

    match set_json(store, keys::PRESETS_COMPRESSED, &compressed) {
        Ok(()) => report.compressed_written = true,
        Err(e) => warn!(error = %e, "failed to store compressed presets"),
    }

    info!(
        total = report.total,
        stored = report.stored.len(),
        failed = report.failed.len(),
        purged = report.purged,
        "presets stored with fallback tiers"
    );
    Ok(report)
}

/// Move the combined tier into per-category keys.
///
/// Returns the number of categories written. Write failures are logged and
/// skipped; the combined tier is left in place either way.
pub fn split_combined<S: KeyValueStore + ?Sized>(store: &S) -> Result<usize> {
    let presets: Vec<PresetRecord> = get_json(store, keys::PRESETS)?.unwrap_or_default();
    if presets.is_empty() {
        info!("no combined preset data to split");
        return Ok(0);
    }

    let mut written = 0;
    for (category, group) in group_by_category(&presets) {
        match set_json(store, &keys::preset_category(category), &group) {
            Ok(()) => {
                debug!(category = %category, count = group.len(), "split category");
                written += 1;
            }
            Err(e) => warn!(category = %category, error = %e, "failed to split category"),
        }
    }

    info!(total = presets.len(), categories = written, "split combined preset data");
    Ok(written)
}
