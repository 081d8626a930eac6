//! Supervisory panel fan-out
//!
//! Accepts panel WebSocket connections and broadcasts every relayed
//! message to all of them. On a connectivity trigger it re-reads the
//! device table's connected flags and broadcasts the snapshot, so the hub
//! never has to build one.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use stagelink_core::{codec, ConnectivityEntry, DeviceTable, Origin, PanelMessage, STATUS_OK};
use stagelink_hub::PanelLink;
use stagelink_transport::{
    TransportEvent, TransportReceiver, TransportSender, TransportServer, WebSocketServer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PanelBroadcaster {
    table: Arc<DeviceTable>,
    panels: DashMap<SocketAddr, Arc<dyn TransportSender>>,
}

impl PanelBroadcaster {
    pub fn new(table: Arc<DeviceTable>) -> Arc<Self> {
        Arc::new(Self {
            table,
            panels: DashMap::new(),
        })
    }

    /// Accept panel connections until the listener fails
    pub async fn serve(self: Arc<Self>, mut server: WebSocketServer) -> anyhow::Result<()> {
        loop {
            let (sender, receiver, addr) = server.accept().await?;
            info!("panel connected from {}", addr);

            let sender: Arc<dyn TransportSender> = Arc::new(sender);
            self.panels.insert(addr, sender.clone());

            // New panels start from the current connectivity state
            if let Ok(frame) = codec::encode(&self.snapshot()) {
                let _ = sender.send(frame).await;
            }

            let broadcaster = self.clone();
            tokio::spawn(async move {
                broadcaster.drain(receiver, addr).await;
                broadcaster.panels.remove(&addr);
                info!("panel disconnected from {}", addr);
            });
        }
    }

    /// Panels are receive-only; drain until the connection closes
    async fn drain(&self, mut receiver: impl TransportReceiver, addr: SocketAddr) {
        loop {
            match receiver.recv().await {
                Some(TransportEvent::Data(_)) => {
                    debug!("ignoring inbound frame from panel {}", addr);
                }
                Some(TransportEvent::Connected) => {}
                Some(TransportEvent::Disconnected { .. }) | Some(TransportEvent::Error(_))
                | None => break,
            }
        }
    }

    fn snapshot(&self) -> PanelMessage {
        let mut payload: Vec<ConnectivityEntry> = self
            .table
            .records()
            .map(|record| ConnectivityEntry {
                label: record.label.clone(),
                connected: record.is_connected(),
            })
            .collect();
        payload.sort_by(|a, b| a.label.cmp(&b.label));

        PanelMessage::Connectivity {
            from: Origin::Server,
            status_code: STATUS_OK,
            payload,
        }
    }

    async fn broadcast(&self, frame: Bytes) {
        // Snapshot the recipients first; a map shard guard must not live
        // across the sends
        let recipients: Vec<(SocketAddr, Arc<dyn TransportSender>)> = self
            .panels
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (addr, sender) in recipients {
            if let Err(e) = sender.send(frame.clone()).await {
                warn!("panel send to {} failed: {}", addr, e);
            }
        }
    }
}

#[async_trait]
impl PanelLink for PanelBroadcaster {
    async fn publish(&self, message: PanelMessage) {
        match codec::encode(&message) {
            Ok(frame) => self.broadcast(frame).await,
            Err(e) => warn!("failed to encode panel message: {}", e),
        }
    }

    async fn publish_connectivity(&self) {
        match codec::encode(&self.snapshot()) {
            Ok(frame) => self.broadcast(frame).await,
            Err(e) => warn!("failed to encode connectivity snapshot: {}", e),
        }
    }
}
