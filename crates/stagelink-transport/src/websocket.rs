//! WebSocket transport implementation
//!
//! Boards and panels both speak JSON over WebSocket text frames. Each
//! accepted connection gets a writer task (draining an mpsc queue into the
//! sink) and a reader task (pumping frames into [`TransportEvent`]s), so the
//! hub never touches the split stream halves directly.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    accept_async_with_config, connect_async,
    tungstenite::protocol::{Message as WsMessage, WebSocketConfig as WsProtocolConfig},
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{
    Transport, TransportEvent, TransportReceiver, TransportSender, TransportServer,
};

/// Depth of the per-connection outbound queue
const SEND_QUEUE_DEPTH: usize = 64;

/// WebSocket configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Maximum inbound frame size
    pub max_frame_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            // Uploads carry full LED tables, so frames can be large
            max_frame_size: 16 * 1024 * 1024,
        }
    }
}

/// WebSocket sender half
pub struct WebSocketSender {
    tx: mpsc::Sender<WsMessage>,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for WebSocketSender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        // Frames are JSON text on this protocol
        let text = String::from_utf8(data.to_vec())
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.tx
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        let _ = self.tx.send(WsMessage::Close(None)).await;
        *self.connected.lock() = false;
        Ok(())
    }
}

/// WebSocket receiver half
pub struct WebSocketReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for WebSocketReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

/// Spawn the writer/reader pump tasks for an upgraded stream
fn spawn_pumps<S>(ws_stream: WebSocketStream<S>) -> (WebSocketSender, WebSocketReceiver)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (write, read) = ws_stream.split();

    let (send_tx, mut send_rx) = mpsc::channel::<WsMessage>(SEND_QUEUE_DEPTH);
    let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(SEND_QUEUE_DEPTH);

    let connected = Arc::new(Mutex::new(true));
    let connected_write = connected.clone();
    let connected_read = connected.clone();

    tokio::spawn(async move {
        let mut write = write;
        while let Some(msg) = send_rx.recv().await {
            if let Err(e) = write.send(msg).await {
                error!("WebSocket write error: {}", e);
                break;
            }
        }
        *connected_write.lock() = false;
    });

    tokio::spawn(async move {
        let mut read = read;

        let _ = event_tx.send(TransportEvent::Connected).await;

        while let Some(result) = read.next().await {
            match result {
                Ok(msg) => match msg {
                    WsMessage::Text(text) => {
                        let _ = event_tx.send(TransportEvent::Data(Bytes::from(text))).await;
                    }
                    WsMessage::Binary(data) => {
                        // Some firmware builds send binary frames; the JSON
                        // inside is the same
                        let _ = event_tx.send(TransportEvent::Data(Bytes::from(data))).await;
                    }
                    WsMessage::Ping(_) | WsMessage::Pong(_) => {
                        // Handled by tungstenite
                    }
                    WsMessage::Close(frame) => {
                        let reason = frame.map(|f| f.reason.to_string());
                        debug!("WebSocket closed: {:?}", reason);
                        let _ = event_tx.send(TransportEvent::Disconnected { reason }).await;
                        break;
                    }
                    WsMessage::Frame(_) => {}
                },
                Err(e) => {
                    warn!("WebSocket read error: {}", e);
                    let _ = event_tx
                        .send(TransportEvent::Disconnected {
                            reason: Some(e.to_string()),
                        })
                        .await;
                    break;
                }
            }
        }

        *connected_read.lock() = false;
    });

    (
        WebSocketSender {
            tx: send_tx,
            connected,
        },
        WebSocketReceiver { rx: event_rx },
    )
}

/// Client-side WebSocket transport (boards, panels, tests)
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    type Sender = WebSocketSender;
    type Receiver = WebSocketReceiver;

    async fn connect(url: &str) -> Result<(Self::Sender, Self::Receiver)> {
        info!("Connecting to WebSocket: {}", url);

        let (ws_stream, response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        debug!("WebSocket connected, response: {:?}", response.status());

        Ok(spawn_pumps(ws_stream))
    }
}

/// WebSocket server
pub struct WebSocketServer {
    listener: tokio::net::TcpListener,
    config: WebSocketConfig,
}

impl WebSocketServer {
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        info!("WebSocket server listening on {}", addr);

        Ok(Self {
            listener,
            config: WebSocketConfig::default(),
        })
    }

    pub fn with_config(mut self, config: WebSocketConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl TransportServer for WebSocketServer {
    type Sender = WebSocketSender;
    type Receiver = WebSocketReceiver;

    async fn accept(&mut self) -> Result<(Self::Sender, Self::Receiver, SocketAddr)> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        debug!("Accepted TCP connection from {}", addr);

        let mut ws_config = WsProtocolConfig::default();
        ws_config.max_message_size = Some(self.config.max_frame_size);
        let ws_stream = accept_async_with_config(stream, Some(ws_config))
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        info!("WebSocket client connected from {}", addr);

        let (sender, receiver) = spawn_pumps(ws_stream);
        Ok((sender, receiver, addr))
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(TransportError::Io)
    }

    async fn close(&self) -> Result<()> {
        // TCP listener closes on drop
        Ok(())
    }
}
