//! Stagelink Transport Layer
//!
//! Persistent bidirectional connections for boards and supervisory panels.
//! WebSocket is the only wire in production; the hub itself only sees the
//! traits, so tests substitute in-memory channels.

pub mod error;
pub mod traits;
pub mod websocket;

pub use error::{Result, TransportError};
pub use traits::{Transport, TransportEvent, TransportReceiver, TransportSender, TransportServer};
pub use websocket::{WebSocketConfig, WebSocketServer, WebSocketTransport};
