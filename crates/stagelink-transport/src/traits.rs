//! Transport trait definitions

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;

use crate::error::Result;

/// Events that can occur on a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Connection established
    Connected,
    /// Connection closed (clean or error)
    Disconnected { reason: Option<String> },
    /// Frame received
    Data(Bytes),
    /// Error occurred
    Error(String),
}

/// The outbound half of one live connection.
///
/// This is the channel handle the hub's registry stores per board: cheap to
/// clone behind an `Arc`, safe to send to from any task.
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Send one frame
    async fn send(&self, data: Bytes) -> Result<()>;

    /// Check if the connection is still up
    fn is_connected(&self) -> bool;

    /// Close the connection
    async fn close(&self) -> Result<()>;
}

/// The inbound half of one live connection
#[async_trait]
pub trait TransportReceiver: Send {
    /// Receive the next event; `None` means the stream ended
    async fn recv(&mut self) -> Option<TransportEvent>;
}

/// Client-side transport (used by boards, panels, and tests dialing in)
#[async_trait]
pub trait Transport: Send + Sync {
    type Sender: TransportSender;
    type Receiver: TransportReceiver;

    /// Connect to a remote endpoint
    async fn connect(addr: &str) -> Result<(Self::Sender, Self::Receiver)>
    where
        Self: Sized;
}

/// Server-side transport (listeners)
#[async_trait]
pub trait TransportServer: Send + Sync {
    type Sender: TransportSender;
    type Receiver: TransportReceiver;

    /// Accept a new connection
    async fn accept(&mut self) -> Result<(Self::Sender, Self::Receiver, SocketAddr)>;

    /// Get the local address
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Close the server
    async fn close(&self) -> Result<()>;
}
