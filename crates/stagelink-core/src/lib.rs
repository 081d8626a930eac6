//! Stagelink Core
//!
//! Core types and wire encoding for the stagelink board protocol.
//!
//! This crate provides:
//! - Hardware identity parsing ([`MacAddr`])
//! - Per-topic wire message types ([`DeviceMessage`], [`ServerMessage`], [`PanelMessage`])
//! - The static device table loaded at startup ([`DeviceTable`])
//! - JSON frame encoding/decoding ([`codec`])

pub mod codec;
pub mod error;
pub mod identity;
pub mod message;
pub mod table;

pub use error::{Error, Result};
pub use identity::MacAddr;
pub use message::{
    BoardInfoPayload, CommandResponsePayload, ConnectivityEntry, DeviceMessage, Origin,
    PanelCommandPayload, PanelMessage, ServerMessage, UploadPayload,
};
pub use table::{DeviceRecord, DeviceTable, DeviceTableEntry};

/// Default device-facing WebSocket port
pub const DEFAULT_BOARD_PORT: u16 = 8082;

/// Default supervisory-panel WebSocket port
pub const DEFAULT_PANEL_PORT: u16 = 8083;

/// Status code meaning "ok" on the wire
pub const STATUS_OK: i32 = 0;
