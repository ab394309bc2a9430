use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::tiering::split_combined;
use crate::store::KeyValueStore;

/// Rewrite the combined preset tier into per-category keys.
pub fn run<S: KeyValueStore + ?Sized>(store: &S) -> Result<CmdResult> {
    let written = split_combined(store)?;
    let mut result = CmdResult::default();
    if written == 0 {
        result.add_message(CmdMessage::info("No combined preset data to split"));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Split preset data into {} categories",
            written
        )));
    }
    Ok(result)
}
