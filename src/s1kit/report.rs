//! # Reports and Document Delivery
//!
//! Reports are plain tables built from stored records. Rendering is behind
//! [`ReportRenderer`]: the built-in [`TextRenderer`] writes aligned text tables
//! and SVG sticker sheets, and a richer backend (PDF, say) only needs to implement
//! the same two methods.
//!
//! Rendered bytes reach the user through a [`DocumentSink`]. The CLI delivers into
//! an output directory; tests collect documents in memory.

use crate::error::{KitError, Result};
use crate::model::{CommandRecord, PluginRecord, PresetCategory, PresetRecord};
use crate::sticker::{CellShape, StickerSheet, PT_TO_MM};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

pub const COMMANDS_REPORT: &str = "S1_Shortcuts";
pub const PLUGINS_REPORT: &str = "S1_Plugins";
pub const STICKERS_REPORT: &str = "Controller_Stickers";

pub fn presets_report_name(category: PresetCategory) -> String {
    format!("S1_{}_Presets", category.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn commands(commands: &[CommandRecord]) -> Self {
        let mut table = Self::new(&["Section", "Command", "Shortcut"]);
        table.rows = commands
            .iter()
            .map(|c| {
                vec![
                    c.section_name.clone(),
                    c.command_name.clone(),
                    c.shortcut.clone(),
                ]
            })
            .collect();
        table
    }

    pub fn plugins(plugins: &[PluginRecord]) -> Self {
        let mut table = Self::new(&["Category", "Name", "Vendor", "Version", "Folder"]);
        table.rows = plugins
            .iter()
            .map(|p| {
                vec![
                    p.category.to_string(),
                    p.name.clone().unwrap_or_default(),
                    p.vendor.clone(),
                    p.version.clone(),
                    p.folder.clone(),
                ]
            })
            .collect();
        table
    }

    pub fn presets(presets: &[PresetRecord]) -> Self {
        let mut table = Self::new(&["Vendor", "Class ID", "Title", "Creator", "SubFolder"]);
        table.rows = presets
            .iter()
            .map(|p| {
                [&p.vendor, &p.class_id, &p.title, &p.creator, &p.sub_folder]
                    .iter()
                    .map(|v| v.as_deref().unwrap_or_default().to_string())
                    .collect()
            })
            .collect();
        table
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A rendered file, ready for a [`DocumentSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub trait ReportRenderer {
    fn render_table(&self, table: &ReportTable, output_name: &str) -> Result<Document>;
    fn render_grid(&self, sheet: &StickerSheet, output_name: &str) -> Result<Document>;
}

/// Text tables and SVG sticker sheets.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

const COLUMN_GAP: &str = "  ";

fn pad_to(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.width());
    format!("{}{}", cell, " ".repeat(fill))
}

fn table_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| pad_to(cells.get(i).map(String::as_str).unwrap_or(""), *w))
        .collect();
    padded.join(COLUMN_GAP).trim_end().to_string()
}

/// Millimetre values with at most two decimals.
fn mm(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn svg_err(e: impl std::fmt::Display) -> KitError {
    KitError::Render(e.to_string())
}

impl ReportRenderer for TextRenderer {
    fn render_table(&self, table: &ReportTable, output_name: &str) -> Result<Document> {
        let mut widths: Vec<usize> = table.columns.iter().map(|c| c.width()).collect();
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let mut out = String::new();
        out.push_str(&table_line(&table.columns, &widths));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join(COLUMN_GAP));
        out.push('\n');
        for row in &table.rows {
            out.push_str(&table_line(row, &widths));
            out.push('\n');
        }

        Ok(Document {
            file_name: format!("{}.txt", output_name),
            bytes: out.into_bytes(),
        })
    }

    fn render_grid(&self, sheet: &StickerSheet, output_name: &str) -> Result<Document> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(svg_err)?;

        let width = format!("{}mm", mm(sheet.page_width));
        let height = format!("{}mm", mm(sheet.page_height));
        let view_box = format!("0 0 {} {}", mm(sheet.page_width), mm(sheet.page_height));
        let mut svg = BytesStart::new("svg");
        svg.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
        svg.push_attribute(("width", width.as_str()));
        svg.push_attribute(("height", height.as_str()));
        svg.push_attribute(("viewBox", view_box.as_str()));
        writer.write_event(Event::Start(svg)).map_err(svg_err)?;

        for cell in &sheet.cells {
            let mut shape = match &cell.shape {
                CellShape::Rect => {
                    let mut rect = BytesStart::new("rect");
                    rect.push_attribute(("x", mm(cell.x).as_str()));
                    rect.push_attribute(("y", mm(cell.y).as_str()));
                    rect.push_attribute(("width", mm(cell.width).as_str()));
                    rect.push_attribute(("height", mm(cell.height).as_str()));
                    rect
                }
                CellShape::Circle { cx, cy, radius } => {
                    let mut circle = BytesStart::new("circle");
                    circle.push_attribute(("cx", mm(*cx).as_str()));
                    circle.push_attribute(("cy", mm(*cy).as_str()));
                    circle.push_attribute(("r", mm(*radius).as_str()));
                    circle
                }
            };
            shape.push_attribute(("fill", cell.color.as_str()));
            shape.push_attribute(("stroke", "#000000"));
            shape.push_attribute(("stroke-width", "0.2"));
            writer.write_event(Event::Empty(shape)).map_err(svg_err)?;

            let label = match &cell.label {
                Some(label) => label,
                None => continue,
            };
            // Font sizes are points; the canvas is in millimetres
            let font_size = mm(label.font_size * PT_TO_MM);
            for (i, line) in label.lines.iter().enumerate() {
                let mut text = BytesStart::new("text");
                text.push_attribute(("x", mm(label.x).as_str()));
                text.push_attribute((
                    "y",
                    mm(label.y + i as f64 * label.line_height).as_str(),
                ));
                text.push_attribute(("font-size", font_size.as_str()));
                text.push_attribute(("font-family", "Helvetica, Arial, sans-serif"));
                text.push_attribute(("text-anchor", "middle"));
                text.push_attribute(("fill", "#FFFFFF"));
                writer.write_event(Event::Start(text)).map_err(svg_err)?;
                writer
                    .write_event(Event::Text(BytesText::new(line)))
                    .map_err(svg_err)?;
                writer
                    .write_event(Event::End(BytesEnd::new("text")))
                    .map_err(svg_err)?;
            }
        }

        writer
            .write_event(Event::End(BytesEnd::new("svg")))
            .map_err(svg_err)?;

        Ok(Document {
            file_name: format!("{}.svg", output_name),
            bytes: writer.into_inner(),
        })
    }
}

// --- Sinks ---

pub trait DocumentSink {
    /// Hand over a finished document. Returns where it ended up, for display.
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// Only the final path component of `file_name` is used.
fn plain_file_name(file_name: &str) -> Result<String> {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| KitError::Api(format!("Invalid output file name: {:?}", file_name)))
}

/// Writes documents into a directory.
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl DocumentSink for DirSink {
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let name = plain_file_name(file_name)?;
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(KitError::Io)?;
        }

        let target = self.dir.join(&name);
        let tmp_path = self.dir.join(format!(".{}.{}.tmp", name, Uuid::new_v4()));
        fs::write(&tmp_path, bytes).map_err(KitError::Io)?;
        fs::rename(&tmp_path, &target).map_err(KitError::Io)?;
        Ok(target.display().to_string())
    }
}

/// Keeps delivered documents in memory.
#[derive(Default)]
pub struct MemorySink {
    documents: RefCell<Vec<Document>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.borrow().clone()
    }

    pub fn get(&self, file_name: &str) -> Option<Document> {
        self.documents
            .borrow()
            .iter()
            .find(|d| d.file_name == file_name)
            .cloned()
    }
}

impl DocumentSink for MemorySink {
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let name = plain_file_name(file_name)?;
        self.documents.borrow_mut().push(Document {
            file_name: name.clone(),
            bytes: bytes.to_vec(),
        });
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ButtonShape, ButtonSize, ControllerButton};
    use crate::sticker::{assign, new_layout};
    use tempfile::TempDir;

    fn text(doc: &Document) -> String {
        String::from_utf8(doc.bytes.clone()).unwrap()
    }

    #[test]
    fn command_table_is_aligned() {
        let table = ReportTable::commands(&[
            CommandRecord {
                section_name: "Transport".into(),
                command_name: "Play".into(),
                shortcut: "Space".into(),
            },
            CommandRecord {
                section_name: "Edit".into(),
                command_name: "Select All".into(),
                shortcut: String::new(),
            },
        ]);
        let doc = TextRenderer.render_table(&table, COMMANDS_REPORT).unwrap();
        assert_eq!(doc.file_name, "S1_Shortcuts.txt");

        let output = text(&doc);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Section    Command     Shortcut");
        assert_eq!(lines[1], "---------  ----------  --------");
        assert_eq!(lines[2], "Transport  Play        Space");
        assert_eq!(lines[3], "Edit       Select All");
    }

    #[test]
    fn wide_characters_are_measured_by_display_width() {
        let mut table = ReportTable::new(&["A", "B"]);
        table.rows.push(vec!["日本".into(), "x".into()]);
        table.rows.push(vec!["ab".into(), "y".into()]);
        let output = text(&TextRenderer.render_table(&table, "t").unwrap());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[2], "日本  x");
        assert_eq!(lines[3], "ab    y");
    }

    #[test]
    fn preset_table_columns() {
        let mut preset = PresetRecord::new(PresetCategory::FxChain);
        preset.title = Some("Vocal".into());
        let table = ReportTable::presets(&[preset]);
        assert_eq!(
            table.columns,
            vec!["Vendor", "Class ID", "Title", "Creator", "SubFolder"]
        );
        assert_eq!(table.rows[0], vec!["", "", "Vocal", "", ""]);
        assert_eq!(presets_report_name(PresetCategory::FxChain), "S1_FXChain_Presets");
    }

    #[test]
    fn sticker_sheet_renders_as_svg() {
        let mut layout = new_layout(1, 2);
        let mut button = ControllerButton::blank(0, 1);
        button.shape = ButtonShape::Circle;
        button.assigned_text = Some("Rec & Play".into());
        assign(&mut layout, button).unwrap();

        let sheet = StickerSheet::plan(&layout, &ButtonSize::default());
        let doc = TextRenderer.render_grid(&sheet, STICKERS_REPORT).unwrap();
        assert_eq!(doc.file_name, "Controller_Stickers.svg");

        let svg = text(&doc);
        let parsed = roxmltree::Document::parse(&svg).unwrap();
        let root = parsed.root_element();
        assert_eq!(root.tag_name().name(), "svg");
        assert_eq!(root.attribute("width"), Some("210mm"));
        assert_eq!(parsed.descendants().filter(|n| n.has_tag_name("rect")).count(), 1);
        assert_eq!(parsed.descendants().filter(|n| n.has_tag_name("circle")).count(), 1);

        let label: String = parsed
            .descendants()
            .filter(|n| n.has_tag_name("text"))
            .filter_map(|n| n.text())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(label, "Rec & Play");
    }

    #[test]
    fn dir_sink_writes_atomically() {
        let dir = TempDir::new().unwrap();
        let sink = DirSink::new(dir.path().join("out"));

        let location = sink.deliver("report.txt", b"hello").unwrap();
        assert!(location.ends_with("report.txt"));
        assert_eq!(fs::read(dir.path().join("out/report.txt")).unwrap(), b"hello");

        let leftovers = fs::read_dir(dir.path().join("out"))
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn sinks_strip_directories() {
        let sink = MemorySink::new();
        sink.deliver("../../etc/macro.studioonemacro", b"x").unwrap();
        assert!(sink.get("macro.studioonemacro").is_some());
        assert!(sink.deliver("", b"x").is_err());
    }

    #[test]
    fn millimetres_are_trimmed() {
        assert_eq!(mm(210.0), "210");
        assert_eq!(mm(12.5), "12.5");
        assert_eq!(mm(1.0 / 3.0), "0.33");
    }
}
