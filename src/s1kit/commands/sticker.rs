use crate::commands::{CmdMessage, CmdResult};
use crate::error::{KitError, Result};
use crate::model::{ButtonShape, ButtonSize, ControllerButton, SizeUnit};
use crate::report::{DocumentSink, ReportRenderer, STICKERS_REPORT};
use crate::sticker::{
    self, button_at, load_button_size, load_layout, new_layout, palette, resolve_color,
    save_button_size, save_layout, StickerSheet, MAX_GRID_SIDE, MAX_RECOMMENDED_COLUMNS,
};
use crate::store::KeyValueStore;
use chrono::Utc;

/// Changes to one button. Row and column are 1-based; unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct ButtonEdit {
    pub row: u32,
    pub column: u32,
    pub assigned_text: Option<String>,
    pub custom_name: Option<String>,
    pub color: Option<String>,
    pub shape: Option<ButtonShape>,
}

fn position(row: u32, column: u32) -> Result<(u32, u32)> {
    if row == 0 || column == 0 {
        return Err(KitError::Api(
            "Rows and columns are numbered from 1".to_string(),
        ));
    }
    Ok((row - 1, column - 1))
}

pub fn show<S: KeyValueStore + ?Sized>(store: &S) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if !sticker::has_layout(store)? {
        result.add_message(CmdMessage::info(
            "No layout saved yet; showing the default grid",
        ));
    }
    Ok(result
        .with_layout(load_layout(store)?)
        .with_button_size(load_button_size(store)?))
}

/// Replace the stored layout with a blank grid.
pub fn init<S: KeyValueStore + ?Sized>(store: &S, rows: u32, columns: u32) -> Result<CmdResult> {
    if rows == 0 || columns == 0 {
        return Err(KitError::Api("A layout needs at least one row and column".to_string()));
    }
    if rows > MAX_GRID_SIDE || columns > MAX_GRID_SIDE {
        return Err(KitError::Api(format!(
            "A layout has at most {} rows and {} columns",
            MAX_GRID_SIDE, MAX_GRID_SIDE
        )));
    }
    let mut layout = new_layout(rows, columns);
    save_layout(store, &mut layout)?;

    let mut result = CmdResult::default();
    if columns > MAX_RECOMMENDED_COLUMNS {
        result.add_message(CmdMessage::warning(format!(
            "{} columns will not fit on one page; at most {} are recommended",
            columns, MAX_RECOMMENDED_COLUMNS
        )));
    }
    result.add_message(CmdMessage::success(format!(
        "Created a {}x{} layout",
        rows, columns
    )));
    Ok(result.with_layout(layout))
}

pub fn assign<S: KeyValueStore + ?Sized>(store: &S, edit: ButtonEdit) -> Result<CmdResult> {
    let (row, column) = position(edit.row, edit.column)?;
    let mut layout = load_layout(store)?;

    let mut button = button_at(&layout, row, column)
        .cloned()
        .unwrap_or_else(|| ControllerButton::blank(row, column));
    if let Some(text) = edit.assigned_text {
        button.assigned_text = Some(text).filter(|t| !t.trim().is_empty());
    }
    if let Some(name) = edit.custom_name {
        button.custom_name = Some(name).filter(|n| !n.trim().is_empty());
    }
    if let Some(color) = edit.color {
        button.color = resolve_color(&color)
            .ok_or_else(|| KitError::Api(format!("Unknown color '{}'", color)))?;
    }
    if let Some(shape) = edit.shape {
        button.shape = shape;
    }

    sticker::assign(&mut layout, button)?;
    save_layout(store, &mut layout)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Updated button {}-{}",
        edit.row, edit.column
    )));
    Ok(result.with_layout(layout))
}

/// Reset one button to blank.
pub fn unassign<S: KeyValueStore + ?Sized>(store: &S, row: u32, column: u32) -> Result<CmdResult> {
    let (r, c) = position(row, column)?;
    let mut layout = load_layout(store)?;
    sticker::assign(&mut layout, ControllerButton::blank(r, c))?;
    save_layout(store, &mut layout)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Cleared button {}-{}", row, column)));
    Ok(result.with_layout(layout))
}

pub fn size<S: KeyValueStore + ?Sized>(
    store: &S,
    width: f64,
    height: f64,
    unit: SizeUnit,
) -> Result<CmdResult> {
    let mut size = ButtonSize {
        width,
        height,
        unit,
        last_modified: Utc::now(),
    };
    save_button_size(store, &mut size)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Button size set to {} x {} {}",
        width, height, unit
    )));
    Ok(result.with_button_size(size))
}

/// Lay out the stored grid on a page and deliver the rendered sheet.
pub fn export<S, R, K>(store: &S, renderer: &R, sink: &K) -> Result<CmdResult>
where
    S: KeyValueStore + ?Sized,
    R: ReportRenderer + ?Sized,
    K: DocumentSink + ?Sized,
{
    let layout = load_layout(store)?;
    let size = load_button_size(store)?;
    let sheet = StickerSheet::plan(&layout, &size);

    let document = renderer.render_grid(&sheet, STICKERS_REPORT)?;
    let location = sink.deliver(&document.file_name, &document.bytes)?;

    let mut result = CmdResult::default();
    for warning in &sheet.warnings {
        result.add_message(CmdMessage::warning(warning.clone()));
    }
    if !sheet.skipped.is_empty() {
        result.add_message(CmdMessage::warning(format!(
            "{} buttons did not fit on the page and were left out",
            sheet.skipped.len()
        )));
    }
    result.add_message(CmdMessage::success(format!(
        "Sticker sheet with {} buttons written to {}",
        sheet.cells.len(),
        location
    )));
    Ok(result.with_document(location))
}

pub fn colors() -> CmdResult {
    let mut result = CmdResult::default();
    result.palette = palette()
        .iter()
        .map(|(name, hex)| (name.to_string(), hex.to_string()))
        .collect();
    result
}
