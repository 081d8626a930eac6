//! Main hub implementation
//!
//! One task per board connection; shared state is the connection registry
//! and the per-record connected flags, each locked per-operation only. No
//! lock is held across an await.

use parking_lot::RwLock;
use stagelink_core::{
    codec, CommandResponsePayload, DeviceMessage, DeviceTable, MacAddr, Origin,
    PanelCommandPayload, PanelMessage, ServerMessage,
};
use stagelink_transport::{
    TransportEvent, TransportReceiver, TransportSender, TransportServer, WebSocketServer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    panel::PanelLink, registry::ConnectionRegistry, sources::DataSource, upload::build_upload,
    validate::validate_identity, Result,
};

/// Hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Server name, used in logs
    pub name: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            name: "Stagelink Hub".to_string(),
        }
    }
}

/// The device-connection registry and message-routing layer
pub struct Hub {
    config: HubConfig,
    table: Arc<DeviceTable>,
    registry: Arc<ConnectionRegistry>,
    sources: Arc<dyn DataSource>,
    panel: Arc<dyn PanelLink>,
    running: Arc<RwLock<bool>>,
}

impl Hub {
    pub fn new(
        config: HubConfig,
        table: Arc<DeviceTable>,
        sources: Arc<dyn DataSource>,
        panel: Arc<dyn PanelLink>,
    ) -> Self {
        Self {
            config,
            table,
            registry: Arc::new(ConnectionRegistry::new()),
            sources,
            panel,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// The shared registry handle
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// The shared device table
    pub fn table(&self) -> Arc<DeviceTable> {
        Arc::clone(&self.table)
    }

    /// Number of boards currently reachable
    pub fn board_count(&self) -> usize {
        self.registry.len()
    }

    /// Accept board connections from any `TransportServer` implementation
    pub async fn serve_on<S>(&self, mut server: S) -> Result<()>
    where
        S: TransportServer + 'static,
        S::Sender: 'static,
        S::Receiver: 'static,
    {
        info!("{} accepting board connections", self.config.name);
        *self.running.write() = true;

        while *self.running.read() {
            match server.accept().await {
                Ok((sender, receiver, addr)) => {
                    info!("New connection from {}", addr);
                    self.handle_connection(Arc::new(sender), receiver, addr);
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Accept board connections over WebSocket
    pub async fn serve_websocket(&self, addr: &str) -> Result<()> {
        let server = WebSocketServer::bind(addr).await?;
        self.serve_on(server).await
    }

    /// Stop accepting connections
    pub fn stop(&self) {
        *self.running.write() = false;
    }

    /// Internal clone for spawned tasks; shares all Arc state
    fn clone_internal(&self) -> Self {
        Self {
            config: self.config.clone(),
            table: Arc::clone(&self.table),
            registry: Arc::clone(&self.registry),
            sources: Arc::clone(&self.sources),
            panel: Arc::clone(&self.panel),
            running: Arc::clone(&self.running),
        }
    }

    /// Spawn the per-connection worker
    fn handle_connection(
        &self,
        sender: Arc<dyn TransportSender>,
        mut receiver: impl TransportReceiver + 'static,
        addr: SocketAddr,
    ) {
        let hub = self.clone_internal();

        tokio::spawn(async move {
            // Set once the connection identifies itself via boardInfo
            let mut identity: Option<MacAddr> = None;

            loop {
                match receiver.recv().await {
                    Some(TransportEvent::Data(data)) => {
                        match codec::decode::<DeviceMessage>(&data) {
                            Ok(msg) => {
                                let _ = hub.handle_device_message(msg, &sender, &mut identity).await;
                            }
                            Err(e) => {
                                warn!("decode error from {}: {}", addr, e);
                            }
                        }
                    }
                    Some(TransportEvent::Disconnected { reason }) => {
                        debug!("connection {} closed: {:?}", addr, reason);
                        break;
                    }
                    Some(TransportEvent::Error(e)) => {
                        error!("transport error from {}: {}", addr, e);
                        break;
                    }
                    Some(TransportEvent::Connected) => {}
                    None => break,
                }
            }

            if let Some(identity) = identity {
                hub.handle_disconnect(identity, &sender).await;
            }
        });
    }

    /// Dispatch one inbound frame.
    ///
    /// Returns the handle of the upload task spawned on a successful
    /// connect, so callers that need determinism (tests) can await it; the
    /// connection loop drops it, keeping the push fire-and-forget.
    pub async fn handle_device_message(
        &self,
        msg: DeviceMessage,
        sender: &Arc<dyn TransportSender>,
        identity: &mut Option<MacAddr>,
    ) -> Option<JoinHandle<()>> {
        match msg {
            DeviceMessage::BoardInfo { payload } => {
                let id = validate_identity(&self.table, &payload.identity)?;

                // A channel announcing a different identity releases the
                // old one first, so no registry entry outlives its session
                if let Some(prev) = *identity {
                    if prev != id {
                        self.handle_disconnect(prev, sender).await;
                    }
                }

                let record = self.table.get(id)?;

                info!("board connected: {} ({})", record.label, id);
                record.set_connected(true);
                self.registry.register(id, Arc::clone(sender));
                *identity = Some(id);

                Some(self.push_upload(id))
            }
            DeviceMessage::CommandResponse {
                payload,
                status_code,
            } => {
                self.relay(payload, status_code).await;
                None
            }
        }
    }

    /// Detached configuration push for one board.
    ///
    /// A failed fetch aborts the push and nothing else; the board stays
    /// connected. If the board drops mid-aggregation the finished upload
    /// simply finds no channel.
    pub fn push_upload(&self, identity: MacAddr) -> JoinHandle<()> {
        let hub = self.clone_internal();

        tokio::spawn(async move {
            let Some(message) = build_upload(&hub.table, hub.sources.as_ref(), identity).await
            else {
                return;
            };
            let Some(record) = hub.table.get(identity) else {
                return;
            };
            hub.route(std::slice::from_ref(&record.label), &message).await;
        })
    }

    /// Fan a message out to the named boards.
    ///
    /// The message is serialized once and shared across targets. Offline
    /// targets are expected steady state and skipped silently; delivery is
    /// at-most-once with no queuing or retry.
    pub async fn route(&self, targets: &[String], message: &ServerMessage) {
        let frame = match codec::encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to encode outbound message: {}", e);
                return;
            }
        };

        for label in targets {
            let Some(identity) = self.table.identity_of(label) else {
                warn!("unknown label: {}", label);
                continue;
            };
            let Some(channel) = self.registry.lookup(identity) else {
                debug!("{} offline, skipping", label);
                continue;
            };
            if let Err(e) = channel.send(frame.clone()).await {
                warn!("send to {} failed: {}", label, e);
            }
        }
    }

    /// Relay a board's command response to the supervisory side, rewritten
    /// under its display label. Invalid identities are dropped (logged by
    /// the validator), producing no publish.
    pub async fn relay(&self, payload: CommandResponsePayload, status_code: i32) {
        let Some(identity) = validate_identity(&self.table, &payload.identity) else {
            return;
        };
        let Some(record) = self.table.get(identity) else {
            return;
        };

        let message = PanelMessage::CommandResponse {
            from: Origin::Server,
            status_code,
            payload: PanelCommandPayload {
                label: record.label.clone(),
                command: payload.command,
                message: payload.message,
            },
        };

        self.panel.publish(message).await;
    }

    /// Transport signaled closure for an identified board.
    ///
    /// The unregister is guarded by channel identity: when this close
    /// belongs to a superseded session of a board that has already
    /// reconnected, the newer registration (and its connected flag) is
    /// left untouched and no snapshot is broadcast.
    pub async fn handle_disconnect(&self, identity: MacAddr, channel: &Arc<dyn TransportSender>) {
        let removed = self.registry.unregister(identity, channel);
        if !removed && self.registry.contains(identity) {
            debug!("stale disconnect for {}, newer session active", identity);
            return;
        }

        if let Some(record) = self.table.get(identity) {
            record.set_connected(false);
            info!("board disconnected: {} ({})", record.label, identity);
        }

        self.panel.publish_connectivity().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_table, MockChannel, MockSource, RecordingPanel, MAC_1, MAC_2};
    use serde_json::json;
    use stagelink_core::{BoardInfoPayload, UploadPayload};

    fn hub_with(sources: MockSource) -> (Hub, Arc<RecordingPanel>) {
        let panel = RecordingPanel::new();
        let hub = Hub::new(
            HubConfig::default(),
            test_table(),
            Arc::new(sources),
            panel.clone(),
        );
        (hub, panel)
    }

    fn board_info(identity: &str) -> DeviceMessage {
        DeviceMessage::BoardInfo {
            payload: BoardInfoPayload {
                identity: identity.to_string(),
            },
        }
    }

    async fn connect(hub: &Hub, channel: &MockChannel, identity: &str) -> Option<JoinHandle<()>> {
        let mut session = None;
        let handle = hub
            .handle_device_message(board_info(identity), &channel.clone_handle(), &mut session)
            .await;
        assert_eq!(session, Some(MacAddr::parse(identity).unwrap()));
        handle
    }

    #[tokio::test]
    async fn connect_registers_and_pushes_upload() {
        let (hub, _panel) = hub_with(MockSource::ok());
        let channel = MockChannel::new();
        let other = MockChannel::new();
        let id = MacAddr::parse(MAC_1).unwrap();

        let upload = connect(&hub, &channel, MAC_1).await.unwrap();
        upload.await.unwrap();

        assert!(hub.registry().contains(id));
        assert!(hub.table().get(id).unwrap().is_connected());

        // Exactly one frame, to this board only
        let frames = channel.sent();
        assert_eq!(frames.len(), 1);
        assert_eq!(other.sent_count(), 0);

        let msg: ServerMessage = codec::decode(&frames[0]).unwrap();
        match msg {
            ServerMessage::Upload { payload, .. } => {
                let UploadPayload(pin, fiber, led) = payload;
                assert_eq!(pin, json!({ "led": [4, 5, 6] }));
                assert_eq!(fiber, json!([{ "strand": 1 }]));
                assert_eq!(led, json!([{ "frame": 0 }]));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_failure_keeps_board_connected() {
        let (hub, _panel) = hub_with(MockSource {
            lighting: None,
            ..MockSource::ok()
        });
        let channel = MockChannel::new();
        let id = MacAddr::parse(MAC_1).unwrap();

        let upload = connect(&hub, &channel, MAC_1).await.unwrap();
        upload.await.unwrap();

        // Upload aborted, CONNECTED transition not rolled back
        assert_eq!(channel.sent_count(), 0);
        assert!(hub.registry().contains(id));
        assert!(hub.table().get(id).unwrap().is_connected());
    }

    #[tokio::test]
    async fn malformed_identity_mutates_nothing() {
        let (hub, _panel) = hub_with(MockSource::ok());
        let channel = MockChannel::new();
        let mut session = None;

        let handle = hub
            .handle_device_message(
                board_info("definitely-not-a-mac"),
                &channel.clone_handle(),
                &mut session,
            )
            .await;

        assert!(handle.is_none());
        assert!(session.is_none());
        assert!(hub.registry().is_empty());
        assert_eq!(channel.sent_count(), 0);
    }

    #[tokio::test]
    async fn unknown_identity_mutates_nothing() {
        let (hub, _panel) = hub_with(MockSource::ok());
        let channel = MockChannel::new();
        let mut session = None;

        let handle = hub
            .handle_device_message(
                board_info("FF:FF:FF:FF:FF:FF"),
                &channel.clone_handle(),
                &mut session,
            )
            .await;

        assert!(handle.is_none());
        assert!(session.is_none());
        assert!(hub.registry().is_empty());
    }

    #[tokio::test]
    async fn disconnect_clears_state_and_notifies_once() {
        let (hub, panel) = hub_with(MockSource::ok());
        let channel = MockChannel::new();
        let id = MacAddr::parse(MAC_1).unwrap();

        connect(&hub, &channel, MAC_1).await.unwrap().await.unwrap();

        hub.handle_disconnect(id, &channel.clone_handle()).await;

        assert!(!hub.registry().contains(id));
        assert!(!hub.table().get(id).unwrap().is_connected());
        assert_eq!(panel.connectivity_count(), 1);
    }

    #[tokio::test]
    async fn stale_disconnect_keeps_newer_session() {
        let (hub, panel) = hub_with(MockSource::ok());
        let first = MockChannel::new();
        let second = MockChannel::new();
        let id = MacAddr::parse(MAC_1).unwrap();

        connect(&hub, &first, MAC_1).await.unwrap().await.unwrap();
        // Board reconnects before the old channel's close handler runs
        connect(&hub, &second, MAC_1).await.unwrap().await.unwrap();

        hub.handle_disconnect(id, &first.clone_handle()).await;

        assert!(hub.registry().contains(id));
        assert!(hub.table().get(id).unwrap().is_connected());
        assert_eq!(panel.connectivity_count(), 0);

        // The live channel's close still tears everything down
        hub.handle_disconnect(id, &second.clone_handle()).await;
        assert!(!hub.registry().contains(id));
        assert!(!hub.table().get(id).unwrap().is_connected());
        assert_eq!(panel.connectivity_count(), 1);
    }

    #[tokio::test]
    async fn reidentification_releases_previous_identity() {
        let (hub, panel) = hub_with(MockSource::ok());
        let channel = MockChannel::new();
        let first = MacAddr::parse(MAC_1).unwrap();
        let second = MacAddr::parse(MAC_2).unwrap();

        let mut session = None;
        hub.handle_device_message(board_info(MAC_1), &channel.clone_handle(), &mut session)
            .await
            .unwrap()
            .await
            .unwrap();

        // Same channel announces a different identity
        hub.handle_device_message(board_info(MAC_2), &channel.clone_handle(), &mut session)
            .await
            .unwrap()
            .await
            .unwrap();
        assert_eq!(session, Some(second));

        // The superseded identity is fully released, with one snapshot
        assert!(!hub.registry().contains(first));
        assert!(!hub.table().get(first).unwrap().is_connected());
        assert_eq!(panel.connectivity_count(), 1);

        assert!(hub.registry().contains(second));
        assert!(hub.table().get(second).unwrap().is_connected());

        hub.handle_disconnect(second, &channel.clone_handle()).await;
        assert!(!hub.registry().contains(second));
        assert!(!hub.table().get(second).unwrap().is_connected());
        assert_eq!(panel.connectivity_count(), 2);
    }

    #[tokio::test]
    async fn route_delivers_to_connected_subset_only() {
        let (hub, _panel) = hub_with(MockSource::ok());
        let channel = MockChannel::new();

        connect(&hub, &channel, MAC_1).await.unwrap().await.unwrap();
        let after_upload = channel.sent_count();

        let message = ServerMessage::Command {
            from: Origin::Server,
            status_code: 0,
            payload: json!({ "command": "play" }),
        };
        // dancer2 never connected
        hub.route(&["dancer1".to_string(), "dancer2".to_string()], &message)
            .await;

        assert_eq!(channel.sent_count(), after_upload + 1);
        let frames = channel.sent();
        let delivered: ServerMessage = codec::decode(frames.last().unwrap()).unwrap();
        assert_eq!(delivered, message);
    }

    #[tokio::test]
    async fn route_to_unknown_label_is_silent() {
        let (hub, _panel) = hub_with(MockSource::ok());
        let message = ServerMessage::Command {
            from: Origin::Server,
            status_code: 0,
            payload: json!({}),
        };
        hub.route(&["nobody".to_string()], &message).await;
        assert!(hub.registry().is_empty());
    }

    #[tokio::test]
    async fn relay_rewrites_identity_to_label() {
        let (hub, panel) = hub_with(MockSource::ok());

        hub.relay(
            CommandResponsePayload {
                identity: MAC_2.to_string(),
                command: "pause".to_string(),
                message: "ok".to_string(),
            },
            0,
        )
        .await;

        let messages = panel.messages();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            PanelMessage::CommandResponse {
                status_code,
                payload,
                ..
            } => {
                assert_eq!(*status_code, 0);
                assert_eq!(payload.label, "dancer2");
                assert_eq!(payload.command, "pause");
                assert_eq!(payload.message, "ok");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn relay_unknown_identity_publishes_nothing() {
        let (hub, panel) = hub_with(MockSource::ok());

        hub.relay(
            CommandResponsePayload {
                identity: "FF:FF:FF:FF:FF:FF".to_string(),
                command: "pause".to_string(),
                message: "ok".to_string(),
            },
            0,
        )
        .await;
        hub.relay(
            CommandResponsePayload {
                identity: "garbage".to_string(),
                command: "pause".to_string(),
                message: "ok".to_string(),
            },
            0,
        )
        .await;

        assert!(panel.messages().is_empty());
    }

    #[tokio::test]
    async fn command_dropped_when_channel_already_dead() {
        let (hub, _panel) = hub_with(MockSource::ok());
        let channel = MockChannel::new();

        connect(&hub, &channel, MAC_1).await.unwrap().await.unwrap();
        channel.disconnect();

        // Fire-and-forget: the lost send is logged, never an error
        hub.route(
            &["dancer1".to_string()],
            &ServerMessage::Command {
                from: Origin::Server,
                status_code: 0,
                payload: json!({}),
            },
        )
        .await;
    }
}
