//! Wire message types
//!
//! Every frame on the wire is a JSON object with a `topic` discriminant.
//! Each direction gets its own tagged enum so routing code matches
//! exhaustively instead of probing string keys.
//!
//! Identity fields stay raw `String`s at this layer: a malformed address
//! must reach the identity validator (and its log line), not die as a
//! decode error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sender marker carried on every server-originated frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Server,
}

/// Messages a board sends to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum DeviceMessage {
    /// Sent once after connecting, announces the board's hardware address
    #[serde(rename = "boardInfo")]
    BoardInfo { payload: BoardInfoPayload },

    /// Result of a previously routed command
    #[serde(rename = "command")]
    CommandResponse {
        payload: CommandResponsePayload,
        #[serde(rename = "statusCode")]
        status_code: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardInfoPayload {
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponsePayload {
    pub identity: String,
    pub command: String,
    pub message: String,
}

/// Messages the server sends to a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum ServerMessage {
    /// Configuration bundle pushed on connect
    #[serde(rename = "upload")]
    Upload {
        from: Origin,
        #[serde(rename = "statusCode")]
        status_code: i32,
        payload: UploadPayload,
    },

    /// A command fanned out from the supervisory side
    #[serde(rename = "command")]
    Command {
        from: Origin,
        #[serde(rename = "statusCode")]
        status_code: i32,
        payload: Value,
    },
}

/// The upload payload is a fixed positional 3-array. Boards index into it
/// by position, so the order is part of the wire contract:
/// `[pinLayout, fiberData, ledData]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadPayload(pub Value, pub Value, pub Value);

impl UploadPayload {
    pub fn pin_layout(&self) -> &Value {
        &self.0
    }

    pub fn fiber_data(&self) -> &Value {
        &self.1
    }

    pub fn led_data(&self) -> &Value {
        &self.2
    }
}

/// Messages relayed up to the supervisory side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum PanelMessage {
    /// A board's command response, rewritten under its display label
    #[serde(rename = "command")]
    CommandResponse {
        from: Origin,
        #[serde(rename = "statusCode")]
        status_code: i32,
        payload: PanelCommandPayload,
    },

    /// Full connectivity snapshot, one entry per known board
    #[serde(rename = "boardInfo")]
    Connectivity {
        from: Origin,
        #[serde(rename = "statusCode")]
        status_code: i32,
        payload: Vec<ConnectivityEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelCommandPayload {
    pub label: String,
    pub command: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityEntry {
    pub label: String,
    pub connected: bool,
}
