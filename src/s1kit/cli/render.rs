//! Terminal output for command results.
//!
//! Layout math (column widths, truncation) is done here with `unicode-width` so
//! wide characters in plugin and preset names keep columns aligned.

use chrono::{DateTime, Utc};
use colored::Colorize;
use s1kit::api::{CmdMessage, DataStatus, MessageLevel, PresetRow};
use s1kit::config::KitConfig;
use s1kit::model::{ButtonSize, CommandRecord, PluginRecord, PresetCategory, StoredLayout};
use s1kit::query::Page;
use s1kit::sticker::button_at;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const CELL_WIDTH: usize = 12;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    let limit = max_width.saturating_sub(1);
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > limit {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    timeago::Formatter::new().convert(duration.to_std().unwrap_or_default())
}

/// Column widths fitted to the content, with the last column taking what is left
/// of the line.
fn column_widths(header: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }
    if let Some((last, rest)) = widths.split_last_mut() {
        let used: usize = rest.iter().map(|w| w + 2).sum();
        *last = (*last).min(LINE_WIDTH.saturating_sub(used).max(8));
    }
    widths
}

fn print_table(header: &[&str], rows: &[Vec<String>]) {
    let widths = column_widths(header, rows);
    let head: Vec<String> = header
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();
    println!("{}", head.join("  ").trim_end().bold());

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(&truncate_to_width(cell, *w), *w))
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

pub(super) fn print_commands(commands: &[CommandRecord]) {
    if commands.is_empty() {
        return;
    }
    let rows: Vec<Vec<String>> = commands
        .iter()
        .map(|c| {
            vec![
                c.section_name.clone(),
                c.command_name.clone(),
                c.shortcut.clone(),
            ]
        })
        .collect();
    print_table(&["Section", "Command", "Shortcut"], &rows);
}

pub(super) fn print_plugins(plugins: &[PluginRecord]) {
    if plugins.is_empty() {
        return;
    }
    let rows: Vec<Vec<String>> = plugins
        .iter()
        .map(|p| {
            vec![
                p.name.clone().unwrap_or_default(),
                p.vendor.clone(),
                p.category.to_string(),
                p.class_id.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["Name", "Vendor", "Category", "Class ID"], &rows);
}

pub(super) fn print_presets(page: &Page<PresetRow>, page_number: usize, page_size: usize) {
    if page.items.is_empty() {
        return;
    }
    let rows: Vec<Vec<String>> = page
        .items
        .iter()
        .map(|row| {
            let p = &row.preset;
            vec![
                p.title.clone().unwrap_or_default(),
                row.plugin_name.clone().unwrap_or_default(),
                p.vendor.clone().unwrap_or_default(),
                p.sub_folder.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["Title", "Plugin", "Vendor", "Folder"], &rows);

    let pages = page.total_count.div_ceil(page_size.max(1));
    println!(
        "{}",
        format!(
            "Page {} of {} ({} presets)",
            page_number, pages, page.total_count
        )
        .dimmed()
    );
}

pub(super) fn print_categories(categories: &[PresetCategory]) {
    for category in categories {
        println!("{}", category);
    }
}

pub(super) fn print_status(status: &[DataStatus]) {
    for entry in status {
        let state = if entry.present {
            pad(&format!("{} records", entry.records), 16).green()
        } else {
            pad("not imported", 16).dimmed()
        };
        println!(
            "{}  {}  {}",
            pad(entry.dataset, 10).bold(),
            state,
            format!("imported {}", entry.imported).dimmed()
        );
    }
}

pub(super) fn print_layout(layout: &StoredLayout, size: Option<&ButtonSize>) {
    println!(
        "{}",
        format!(
            "{} x {} grid, modified {}",
            layout.grid_rows,
            layout.grid_columns,
            format_time_ago(layout.last_modified)
        )
        .bold()
    );
    if let Some(size) = size {
        println!(
            "{}",
            format!("Buttons {} x {} {}", size.width, size.height, size.unit).dimmed()
        );
    }

    for row in 0..layout.grid_rows {
        let cells: Vec<String> = (0..layout.grid_columns)
            .map(|column| {
                let button = button_at(layout, row, column);
                let text = button
                    .and_then(|b| b.display_text())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}-{}", row + 1, column + 1));
                let cell = pad(&truncate_to_width(&text, CELL_WIDTH), CELL_WIDTH);
                match button {
                    Some(b) if b.is_assigned() || b.display_text().is_some() => {
                        cell.normal().to_string()
                    }
                    _ => cell.dimmed().to_string(),
                }
            })
            .collect();
        println!("[{}]", cells.join("|"));
    }
}

pub(super) fn print_button_size(size: &ButtonSize) {
    println!("Buttons {} x {} {}", size.width, size.height, size.unit);
}

fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub(super) fn print_palette(palette: &[(String, String)]) {
    for (name, hex) in palette {
        let swatch = match hex_rgb(hex) {
            Some((r, g, b)) => "    ".on_truecolor(r, g, b).to_string(),
            None => "    ".to_string(),
        };
        println!("{} {}  {}", swatch, pad(name, 8), hex.dimmed());
    }
}

pub(super) fn print_config(config: &KitConfig) {
    for key in KitConfig::KEYS {
        let value = config.get(key).unwrap_or_default();
        println!("{} = {}", pad(key, 20), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 12), "short");
        assert_eq!(truncate_to_width("Arpeggiator X", 8), "Arpeggi…");
        assert_eq!(truncate_to_width("合成器合成器", 5).width(), 5);
    }

    #[test]
    fn last_column_is_capped() {
        let rows = vec![vec!["a".to_string(), "x".repeat(300)]];
        let widths = column_widths(&["Name", "Value"], &rows);
        assert_eq!(widths, vec![4, LINE_WIDTH - 6]);
    }

    #[test]
    fn palette_hex_parses() {
        assert_eq!(hex_rgb("#4CAF50"), Some((0x4C, 0xAF, 0x50)));
        assert_eq!(hex_rgb("4CAF50"), None);
    }
}
