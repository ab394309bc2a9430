//! Controller sticker layouts.
//!
//! A layout is a grid of [`ControllerButton`]s persisted under `StickerLayout`,
//! plus a physical button size under `StickerButtonSize`. [`StickerSheet::plan`]
//! turns both into page geometry that a [`crate::report::ReportRenderer`] draws.

use crate::error::{KitError, Result};
use crate::model::{ButtonShape, ButtonSize, ControllerButton, StoredLayout};
use crate::store::{keys, set_json, KeyValueStore};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::warn;

pub const DEFAULT_GRID: u32 = 4;

/// Above this many columns a sheet rarely fits a page.
pub const MAX_RECOMMENDED_COLUMNS: u32 = 13;

/// Largest accepted row or column count.
pub const MAX_GRID_SIDE: u32 = 64;

const PALETTE: [(&str, &str); 8] = [
    ("Green", "#4CAF50"),
    ("Red", "#F44336"),
    ("Pink", "#E91E63"),
    ("Blue", "#2196F3"),
    ("Yellow", "#FFEB3B"),
    ("Orange", "#FF9800"),
    ("Purple", "#9C27B0"),
    ("Teal", "#009688"),
];

pub fn palette() -> &'static [(&'static str, &'static str)] {
    &PALETTE
}

/// Resolve a palette name (any case) or a `#RRGGBB` literal.
pub fn resolve_color(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some((_, hex)) = PALETTE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(input))
    {
        return Some(hex.to_string());
    }
    let digits = input.strip_prefix('#')?;
    if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", digits.to_uppercase()))
    } else {
        None
    }
}

/// Blank buttons for every grid position, row by row.
pub fn default_layout(rows: u32, columns: u32) -> Vec<ControllerButton> {
    (0..rows)
        .flat_map(|row| (0..columns).map(move |column| ControllerButton::blank(row, column)))
        .collect()
}

pub fn new_layout(rows: u32, columns: u32) -> StoredLayout {
    StoredLayout {
        buttons: default_layout(rows, columns),
        grid_rows: rows,
        grid_columns: columns,
        last_modified: Utc::now(),
    }
}

/// Read a value, treating undecodable data like absent data.
fn read_or_default<S: KeyValueStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>> {
    match crate::store::get_json(store, key) {
        Ok(value) => Ok(value),
        Err(KitError::Serialization(e)) => {
            warn!(key = key, error = %e, "ignoring unreadable sticker data");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// The stored layout, or a blank 4x4 one.
pub fn load_layout<S: KeyValueStore + ?Sized>(store: &S) -> Result<StoredLayout> {
    Ok(read_or_default(store, keys::STICKER_LAYOUT)?
        .unwrap_or_else(|| new_layout(DEFAULT_GRID, DEFAULT_GRID)))
}

pub fn save_layout<S: KeyValueStore + ?Sized>(store: &S, layout: &mut StoredLayout) -> Result<()> {
    layout.last_modified = Utc::now();
    set_json(store, keys::STICKER_LAYOUT, layout)
}

pub fn has_layout<S: KeyValueStore + ?Sized>(store: &S) -> Result<bool> {
    crate::store::has_value(store, keys::STICKER_LAYOUT)
}

/// Put `button` at its grid position, replacing whatever was there.
pub fn assign(layout: &mut StoredLayout, button: ControllerButton) -> Result<()> {
    if button.row >= layout.grid_rows || button.column >= layout.grid_columns {
        return Err(KitError::Api(format!(
            "Button {}-{} is outside the {}x{} grid",
            button.row + 1,
            button.column + 1,
            layout.grid_rows,
            layout.grid_columns
        )));
    }
    match layout
        .buttons
        .iter_mut()
        .find(|b| b.row == button.row && b.column == button.column)
    {
        Some(existing) => *existing = button,
        None => layout.buttons.push(button),
    }
    Ok(())
}

pub fn button_at(layout: &StoredLayout, row: u32, column: u32) -> Option<&ControllerButton> {
    layout
        .buttons
        .iter()
        .find(|b| b.row == row && b.column == column)
}

pub fn load_button_size<S: KeyValueStore + ?Sized>(store: &S) -> Result<ButtonSize> {
    Ok(read_or_default(store, keys::STICKER_BUTTON_SIZE)?.unwrap_or_default())
}

pub fn save_button_size<S: KeyValueStore + ?Sized>(store: &S, size: &mut ButtonSize) -> Result<()> {
    if !(size.width > 0.0 && size.height > 0.0) {
        return Err(KitError::Api(format!(
            "Button size must be positive, got {} x {}",
            size.width, size.height
        )));
    }
    size.last_modified = Utc::now();
    set_json(store, keys::STICKER_BUTTON_SIZE, size)
}

// --- Sheet geometry ---

/// A4, in millimetres.
pub const PAGE_SHORT_MM: f64 = 210.0;
pub const PAGE_LONG_MM: f64 = 297.0;
pub const PAGE_MARGIN_MM: f64 = 10.0;
const LABEL_PADDING_MM: f64 = 2.0;
pub(crate) const PT_TO_MM: f64 = 0.352_778;
/// Average glyph advance as a share of the font size.
const GLYPH_WIDTH_EM: f64 = 0.5;
const LINE_SPACING: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellShape {
    Rect,
    Circle { cx: f64, cy: f64, radius: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StickerLabel {
    pub lines: Vec<String>,
    /// Points
    pub font_size: f64,
    /// Horizontal centre of every line
    pub x: f64,
    /// Baseline of the first line
    pub y: f64,
    pub line_height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StickerCell {
    pub row: u32,
    pub column: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub shape: CellShape,
    pub label: Option<StickerLabel>,
}

/// A printable page of stickers. All lengths in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerSheet {
    pub orientation: Orientation,
    pub page_width: f64,
    pub page_height: f64,
    pub cells: Vec<StickerCell>,
    /// (row, column) of buttons that would leave the printable area
    pub skipped: Vec<(u32, u32)>,
    pub warnings: Vec<String>,
}

/// Greedy word wrap to `max_chars` per line; words longer than a line are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn max_chars(area_width: f64, font_size: f64) -> usize {
    (area_width / (font_size * PT_TO_MM * GLYPH_WIDTH_EM)).floor().max(1.0) as usize
}

fn plan_label(text: &str, x: f64, y: f64, width: f64, height: f64) -> StickerLabel {
    let area_width = width - LABEL_PADDING_MM * 2.0;
    let area_height = height - LABEL_PADDING_MM * 2.0;

    let mut font_size = (width.min(height) / 6.0).clamp(6.0, 16.0);
    let mut lines = wrap(text, max_chars(area_width, font_size));

    let line_mm = |size: f64| size * PT_TO_MM * LINE_SPACING;
    if lines.len() as f64 * line_mm(font_size) > area_height {
        font_size = (area_height / lines.len() as f64 / LINE_SPACING / PT_TO_MM).max(4.0);
        lines = wrap(text, max_chars(area_width, font_size));
    }

    let line_height = line_mm(font_size);
    let block = lines.len() as f64 * line_height;
    StickerLabel {
        x: x + width / 2.0,
        y: y + height / 2.0 - block / 2.0 + font_size * PT_TO_MM / 3.0,
        lines,
        font_size,
        line_height,
    }
}

impl StickerSheet {
    pub fn plan(layout: &StoredLayout, size: &ButtonSize) -> StickerSheet {
        let width = size.unit.to_mm(size.width);
        let height = size.unit.to_mm(size.height);
        let mut warnings = Vec::new();

        if layout.grid_columns > MAX_RECOMMENDED_COLUMNS {
            let msg = format!(
                "Too many columns ({}), at most {} are recommended",
                layout.grid_columns, MAX_RECOMMENDED_COLUMNS
            );
            warn!("{}", msg);
            warnings.push(msg);
        }

        let grid_width = width * layout.grid_columns as f64;
        let portrait_width = PAGE_SHORT_MM - PAGE_MARGIN_MM * 2.0;
        let landscape_width = PAGE_LONG_MM - PAGE_MARGIN_MM * 2.0;
        let orientation = if grid_width > portrait_width && grid_width <= landscape_width {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        let (page_width, page_height) = match orientation {
            Orientation::Portrait => (PAGE_SHORT_MM, PAGE_LONG_MM),
            Orientation::Landscape => (PAGE_LONG_MM, PAGE_SHORT_MM),
        };
        if grid_width > page_width - PAGE_MARGIN_MM * 2.0 {
            let msg = format!(
                "Grid width {:.1}mm exceeds the printable width {:.1}mm",
                grid_width,
                page_width - PAGE_MARGIN_MM * 2.0
            );
            warn!("{}", msg);
            warnings.push(msg);
        }

        let mut cells = Vec::new();
        let mut skipped = Vec::new();
        for button in &layout.buttons {
            let x = PAGE_MARGIN_MM + button.column as f64 * width;
            let y = PAGE_MARGIN_MM + button.row as f64 * height;
            if x + width > page_width - PAGE_MARGIN_MM || y + height > page_height - PAGE_MARGIN_MM
            {
                warn!(
                    row = button.row,
                    column = button.column,
                    "button would leave the page, skipping"
                );
                skipped.push((button.row, button.column));
                continue;
            }

            let shape = match button.shape {
                ButtonShape::Square => CellShape::Rect,
                ButtonShape::Circle => CellShape::Circle {
                    cx: x + width / 2.0,
                    cy: y + height / 2.0,
                    radius: width.min(height) / 2.0 - 1.0,
                },
            };
            let label = button
                .display_text()
                .map(|text| plan_label(text, x, y, width, height));

            cells.push(StickerCell {
                row: button.row,
                column: button.column,
                x,
                y,
                width,
                height,
                color: button.color.clone(),
                shape,
                label,
            });
        }

        StickerSheet {
            orientation,
            page_width,
            page_height,
            cells,
            skipped,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SizeUnit;
    use crate::store::memory::MemStore;

    fn size(width: f64, height: f64, unit: SizeUnit) -> ButtonSize {
        ButtonSize {
            width,
            height,
            unit,
            ..ButtonSize::default()
        }
    }

    #[test]
    fn default_layout_labels_are_one_based() {
        let buttons = default_layout(2, 3);
        assert_eq!(buttons.len(), 6);
        assert_eq!(buttons[0].button_label.as_deref(), Some("1-1"));
        assert_eq!(buttons[5].button_label.as_deref(), Some("2-3"));
        assert_eq!((buttons[4].row, buttons[4].column), (1, 1));
    }

    #[test]
    fn missing_or_corrupt_layout_loads_default() {
        let store = MemStore::new();
        let layout = load_layout(&store).unwrap();
        assert_eq!((layout.grid_rows, layout.grid_columns), (4, 4));
        assert_eq!(layout.buttons.len(), 16);

        store.set(keys::STICKER_LAYOUT, "{broken").unwrap();
        assert_eq!(load_layout(&store).unwrap().buttons.len(), 16);
    }

    #[test]
    fn layout_round_trips_through_store() {
        let store = MemStore::new();
        let mut layout = new_layout(2, 2);
        let mut button = ControllerButton::blank(1, 0);
        button.assigned_text = Some("Record".into());
        button.shape = ButtonShape::Circle;
        assign(&mut layout, button.clone()).unwrap();
        save_layout(&store, &mut layout).unwrap();

        let loaded = load_layout(&store).unwrap();
        assert_eq!(button_at(&loaded, 1, 0), Some(&button));
        assert_eq!(loaded.buttons.len(), 4);
        assert!(has_layout(&store).unwrap());
    }

    #[test]
    fn assign_rejects_positions_outside_grid() {
        let mut layout = new_layout(2, 2);
        assert!(assign(&mut layout, ControllerButton::blank(2, 0)).is_err());
        assert!(assign(&mut layout, ControllerButton::blank(0, 5)).is_err());
        assert_eq!(layout.buttons.len(), 4);
    }

    #[test]
    fn button_size_defaults_and_validation() {
        let store = MemStore::new();
        let default = load_button_size(&store).unwrap();
        assert_eq!((default.width, default.height), (20.0, 15.0));
        assert_eq!(default.unit, SizeUnit::Mm);

        let mut bad = size(0.0, 10.0, SizeUnit::Mm);
        assert!(save_button_size(&store, &mut bad).is_err());

        let mut good = size(2.5, 2.0, SizeUnit::Cm);
        save_button_size(&store, &mut good).unwrap();
        let loaded = load_button_size(&store).unwrap();
        assert_eq!(loaded.unit, SizeUnit::Cm);
        assert_eq!(loaded.width, 2.5);
    }

    #[test]
    fn colors_resolve_by_name_or_hex() {
        assert_eq!(palette().len(), 8);
        assert_eq!(resolve_color("teal").as_deref(), Some("#009688"));
        assert_eq!(resolve_color("#ff00aa").as_deref(), Some("#FF00AA"));
        assert_eq!(resolve_color("#12345"), None);
        assert_eq!(resolve_color("Mauve"), None);
    }

    #[test]
    fn wide_grids_switch_to_landscape() {
        let layout = new_layout(2, 10);
        // 10 x 20mm = 200mm: too wide for portrait (190), fits landscape (277)
        let sheet = StickerSheet::plan(&layout, &size(20.0, 15.0, SizeUnit::Mm));
        assert_eq!(sheet.orientation, Orientation::Landscape);
        assert_eq!(sheet.page_width, 297.0);
        assert!(sheet.skipped.is_empty());

        let narrow = StickerSheet::plan(&layout, &size(1.5, 1.5, SizeUnit::Cm));
        assert_eq!(narrow.orientation, Orientation::Portrait);
        assert_eq!(narrow.cells[1].x, 25.0);
    }

    #[test]
    fn off_page_buttons_are_skipped() {
        let layout = new_layout(1, 20);
        let sheet = StickerSheet::plan(&layout, &size(20.0, 15.0, SizeUnit::Mm));
        // 400mm of grid: stays portrait, 9 buttons fit in 190mm
        assert_eq!(sheet.orientation, Orientation::Portrait);
        assert_eq!(sheet.cells.len(), 9);
        assert_eq!(sheet.skipped.len(), 11);
        assert_eq!(sheet.warnings.len(), 2);
    }

    #[test]
    fn circles_and_labels() {
        let mut layout = new_layout(1, 1);
        let mut button = ControllerButton::blank(0, 0);
        button.shape = ButtonShape::Circle;
        button.assigned_text = Some("Record".into());
        button.custom_name = Some("REC".into());
        assign(&mut layout, button).unwrap();

        let sheet = StickerSheet::plan(&layout, &size(30.0, 20.0, SizeUnit::Mm));
        let cell = &sheet.cells[0];
        assert_eq!(
            cell.shape,
            CellShape::Circle {
                cx: 25.0,
                cy: 20.0,
                radius: 9.0
            }
        );
        let label = cell.label.as_ref().unwrap();
        assert_eq!(label.lines, vec!["REC".to_string()]);
        assert_eq!(label.font_size, 6.0);
        assert_eq!(label.x, 25.0);
    }

    #[test]
    fn unassigned_buttons_have_no_label() {
        let sheet = StickerSheet::plan(&new_layout(1, 2), &ButtonSize::default());
        assert!(sheet.cells.iter().all(|c| c.label.is_none()));
    }

    #[test]
    fn long_labels_wrap_and_shrink() {
        let label = plan_label(
            "Toggle Loop Follows Selection In Arranger",
            0.0,
            0.0,
            20.0,
            10.0,
        );
        assert!(label.lines.len() > 1);
        assert!(label.font_size <= 6.0);
        assert!(label.font_size >= 4.0);
        assert!(label.lines.iter().all(|l| !l.is_empty()));
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert!(wrap("   ", 4).is_empty());
    }
}
