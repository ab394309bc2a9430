//! Preset database extraction.
//!
//! Reading the embedded database is behind [`PresetRowSource`] so the mapping
//! from loosely typed rows to [`PresetRecord`]s can be exercised without SQLite.

use crate::config::DEFAULT_PRESET_QUERY;
use crate::error::Result;
use crate::model::{PresetCategory, PresetRecord};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::debug;

/// One result row: column name to optional text value.
pub type RawRow = BTreeMap<String, Option<String>>;

pub trait PresetRowSource {
    fn rows(&self, bytes: &[u8]) -> Result<Vec<RawRow>>;
}

/// Reads rows out of a SQLite database image.
pub struct SqliteRowSource {
    query: String,
}

impl SqliteRowSource {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

impl Default for SqliteRowSource {
    fn default() -> Self {
        Self::new(DEFAULT_PRESET_QUERY)
    }
}

fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

impl PresetRowSource for SqliteRowSource {
    fn rows(&self, bytes: &[u8]) -> Result<Vec<RawRow>> {
        // SQLite needs a file; the image only lives as long as this call
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;

        let conn = Connection::open_with_flags(
            file.path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut stmt = conn.prepare(&self.query)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut result = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut raw = RawRow::new();
            for (i, name) in columns.iter().enumerate() {
                raw.insert(name.clone(), value_text(row.get_ref(i)?));
            }
            result.push(raw);
        }
        debug!(rows = result.len(), "read preset database");
        Ok(result)
    }
}

fn field(row: &RawRow, name: &str) -> Option<String> {
    row.get(name).cloned().flatten()
}

/// Map a raw row to a preset. Rows without an allow-listed category yield `None`.
pub fn preset_from_row(row: &RawRow) -> Option<PresetRecord> {
    let category = field(row, "category")
        .as_deref()
        .and_then(PresetCategory::from_name)?;

    Some(PresetRecord {
        category,
        class_id: field(row, "classId"),
        vendor: field(row, "vendor"),
        title: field(row, "title"),
        creator: field(row, "creator"),
        sub_folder: field(row, "subFolder"),
    })
}

/// Extract allow-listed presets from a database image, in row order.
pub fn extract_presets<R: PresetRowSource + ?Sized>(
    source: &R,
    bytes: &[u8],
) -> Result<Vec<PresetRecord>> {
    let rows = source.rows(bytes)?;
    let total = rows.len();
    let presets: Vec<PresetRecord> = rows.iter().filter_map(preset_from_row).collect();
    debug!(
        kept = presets.len(),
        discarded = total - presets.len(),
        "extracted presets"
    );
    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KitError;
    use std::fs;

    struct FixedRows(Vec<RawRow>);

    impl PresetRowSource for FixedRows {
        fn rows(&self, _bytes: &[u8]) -> Result<Vec<RawRow>> {
            Ok(self.0.clone())
        }
    }

    fn row(pairs: &[(&str, Option<&str>)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    fn database(rows: &[[Option<&str>; 6]]) -> Vec<u8> {
        let file = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(file.path()).unwrap();
            conn.execute_batch(
                "CREATE TABLE PresetDescriptors (
                    category TEXT, classId TEXT, vendor TEXT,
                    title TEXT, creator TEXT, subFolder TEXT
                )",
            )
            .unwrap();
            for r in rows {
                conn.execute(
                    "INSERT INTO PresetDescriptors VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![r[0], r[1], r[2], r[3], r[4], r[5]],
                )
                .unwrap();
            }
        }
        fs::read(file.path()).unwrap()
    }

    #[test]
    fn rows_outside_allow_list_are_discarded() {
        let source = FixedRows(vec![
            row(&[("category", Some("AudioSynth")), ("title", Some("Pad"))]),
            row(&[("category", Some("Loop")), ("title", Some("Drums"))]),
            row(&[("category", None), ("title", Some("Nothing"))]),
            row(&[("title", Some("No column"))]),
            row(&[("category", Some("fxchain")), ("title", Some("Vocal"))]),
        ]);

        let presets = extract_presets(&source, &[]).unwrap();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].category, PresetCategory::AudioSynth);
        assert_eq!(presets[1].category, PresetCategory::FxChain);
    }

    #[test]
    fn missing_fields_become_none() {
        let preset =
            preset_from_row(&row(&[("category", Some("Artist")), ("vendor", None)])).unwrap();
        assert_eq!(preset, PresetRecord::new(PresetCategory::Artist));
    }

    #[test]
    fn sqlite_source_reads_descriptor_table() {
        let bytes = database(&[
            [
                Some("AudioEffect"),
                Some("{PRO-EQ}"),
                Some("PreSonus"),
                Some("Air"),
                Some("factory"),
                Some("Mixing"),
            ],
            [Some("Loop"), None, None, Some("Beat"), None, None],
            [Some("TrackPreset"), None, None, Some("Lead Vox"), None, None],
        ]);

        let presets = extract_presets(&SqliteRowSource::default(), &bytes).unwrap();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].class_id.as_deref(), Some("{PRO-EQ}"));
        assert_eq!(presets[0].sub_folder.as_deref(), Some("Mixing"));
        assert_eq!(presets[1].category, PresetCategory::TrackPreset);
        assert_eq!(presets[1].vendor, None);
    }

    #[test]
    fn custom_query_is_honoured() {
        let bytes = database(&[[Some("Artist"), None, None, Some("A"), None, None]]);
        let source = SqliteRowSource::new(
            "SELECT 'AudioSynth' AS category, title FROM PresetDescriptors",
        );
        let presets = extract_presets(&source, &bytes).unwrap();
        assert_eq!(presets[0].category, PresetCategory::AudioSynth);
        assert_eq!(presets[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let garbage = b"definitely not sqlite ".repeat(64);
        let err = extract_presets(&SqliteRowSource::default(), &garbage).unwrap_err();
        assert!(matches!(err, KitError::Database(_)));
    }
}
