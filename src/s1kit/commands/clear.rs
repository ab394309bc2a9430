use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{keys, KeyValueStore};
use tracing::info;

/// Remove every key s1kit writes, imported data and sticker settings alike.
pub fn run<S: KeyValueStore + ?Sized>(store: &S) -> Result<CmdResult> {
    let all = keys::all();
    for key in &all {
        store.remove(key)?;
    }
    info!(keys = all.len(), "cleared all data");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success("All imported data cleared"));
    Ok(result)
}
