//! Identity validation
//!
//! The pure guard every inbound path runs before touching registry or
//! table state.

use stagelink_core::{DeviceTable, MacAddr};
use tracing::warn;

/// Validate a board-supplied identity string.
///
/// `None` (with a log line, never an error to the sender) when the string
/// fails the hardware-address grammar or names no table entry. `Some` hands
/// back the parsed key so callers skip a re-parse.
pub fn validate_identity(table: &DeviceTable, raw: &str) -> Option<MacAddr> {
    let identity = match MacAddr::parse(raw) {
        Ok(identity) => identity,
        Err(e) => {
            warn!("invalid hardware address: {}", e);
            return None;
        }
    };

    if !table.contains(identity) {
        warn!("unknown board: {}", identity);
        return None;
    }

    Some(identity)
}
