use crate::error::{KitError, Result};
use crate::model::CommandRecord;
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| KitError::Parse(format!("Invalid selector {}: {}", css, e)))
}

fn inner_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First `table` element among the following siblings of `heading`.
fn next_table(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

/// Extract shortcut rows from a shortcuts export.
///
/// Every `h2` names a section; the rows of that section come from the first
/// table that follows the heading as a sibling. Markup errors are recovered by
/// the HTML parser, so malformed input yields fewer rows rather than an error.
pub fn parse_commands(html: &str) -> Result<Vec<CommandRecord>> {
    let document = Html::parse_document(html);
    let headings = selector("h2")?;
    let rows = selector("tr")?;
    let cells = selector("td")?;

    let mut commands = Vec::new();
    for heading in document.select(&headings) {
        let section_name = inner_text(heading);
        let table = match next_table(heading) {
            Some(table) => table,
            None => continue,
        };

        for row in table.select(&rows) {
            let tds: Vec<ElementRef<'_>> = row.select(&cells).collect();
            if tds.is_empty() {
                continue;
            }
            commands.push(CommandRecord {
                section_name: section_name.clone(),
                command_name: inner_text(tds[0]),
                shortcut: tds.get(1).map(|td| inner_text(*td)).unwrap_or_default(),
            });
        }
    }

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"<html><body>
        <h1>Keyboard Shortcuts</h1>
        <h2> Transport </h2>
        <table>
            <tr><th>Command</th><th>Key</th></tr>
            <tr><td>Play</td><td>Space</td></tr>
            <tr><td> Record </td><td>Num *</td></tr>
        </table>
        <h2>Edit</h2>
        <p>Editing commands</p>
        <table>
            <tr><td>Undo</td><td>Ctrl+Z</td></tr>
            <tr><td>Select All</td></tr>
        </table>
        <h2>Empty Section</h2>
    </body></html>"#;

    #[test]
    fn sections_in_document_order() {
        let commands = parse_commands(EXPORT).unwrap();
        assert_eq!(commands.len(), 4);

        assert_eq!(commands[0].section_name, "Transport");
        assert_eq!(commands[0].command_name, "Play");
        assert_eq!(commands[0].shortcut, "Space");
        assert_eq!(commands[1].command_name, "Record");
        assert_eq!(commands[1].shortcut, "Num *");

        assert_eq!(commands[2].section_name, "Edit");
        assert_eq!(commands[2].command_name, "Undo");
    }

    #[test]
    fn header_rows_are_skipped_and_missing_shortcut_is_empty() {
        let commands = parse_commands(EXPORT).unwrap();
        assert!(commands.iter().all(|c| c.command_name != "Command"));

        let select_all = commands
            .iter()
            .find(|c| c.command_name == "Select All")
            .unwrap();
        assert_eq!(select_all.shortcut, "");
    }

    #[test]
    fn heading_without_table_contributes_nothing() {
        let commands = parse_commands(EXPORT).unwrap();
        assert!(commands.iter().all(|c| c.section_name != "Empty Section"));
    }

    #[test]
    fn table_before_heading_is_not_used() {
        let html = "<table><tr><td>Orphan</td></tr></table><h2>Late</h2>";
        assert!(parse_commands(html).unwrap().is_empty());
    }

    #[test]
    fn malformed_markup_recovers() {
        let html = "<h2>Broken<table><tr><td>Play<td>Space";
        // Must not fail; whatever the parser recovers is fine
        assert!(parse_commands(html).is_ok());
        assert!(parse_commands("").unwrap().is_empty());
    }
}
