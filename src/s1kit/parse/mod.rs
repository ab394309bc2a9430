//! Import parsers.
//!
//! Each parser is a pure function from raw export content to a list of flat
//! records. Parsers never touch the store: an import parses completely before
//! anything is written, so a parse failure leaves the previous state intact.
//!
//! - [`commands`]: keyboard shortcut export (HTML)
//! - [`plugins`]: plugin registry export (XML)
//! - [`presets`]: preset database (SQLite), read through [`presets::PresetRowSource`]

use crate::error::{KitError, Result};

pub mod commands;
pub mod plugins;
pub mod presets;

/// Decode an uploaded text export. A leading byte order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| KitError::Parse(format!("Input is not valid UTF-8 text: {}", e)))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_strips_bom() {
        let bytes = b"\xEF\xBB\xBF<html></html>";
        assert_eq!(decode_text(bytes).unwrap(), "<html></html>");
    }

    #[test]
    fn decode_rejects_binary() {
        let err = decode_text(&[0xff, 0xfe, 0x00, 0x80]).unwrap_err();
        assert!(matches!(err, KitError::Parse(_)));
    }
}
