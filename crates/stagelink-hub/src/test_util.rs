//! Shared test doubles for hub tests

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{json, Value};
use stagelink_core::{DeviceTable, DeviceTableEntry, PanelMessage};
use stagelink_transport::{Result as TransportResult, TransportError, TransportSender};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::panel::PanelLink;
use crate::sources::DataSource;

pub const MAC_1: &str = "A1:B2:C3:D4:E5:F6";
pub const MAC_2: &str = "11:22:33:44:55:66";

/// Two-board table: dancer1 / dancer2
pub fn test_table() -> Arc<DeviceTable> {
    let entries = vec![
        DeviceTableEntry {
            identity: MAC_1.to_string(),
            label: "dancer1".to_string(),
            pin_layout: json!({ "led": [4, 5, 6] }),
        },
        DeviceTableEntry {
            identity: MAC_2.to_string(),
            label: "dancer2".to_string(),
            pin_layout: json!({ "led": [7, 8] }),
        },
    ];
    Arc::new(DeviceTable::from_entries(entries).unwrap())
}

struct MockChannelInner {
    frames: Mutex<Vec<Bytes>>,
    connected: AtomicBool,
}

#[async_trait]
impl TransportSender for MockChannelInner {
    async fn send(&self, data: Bytes) -> TransportResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        self.frames.lock().push(data);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> TransportResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory channel capturing every frame sent to it
pub struct MockChannel {
    inner: Arc<MockChannelInner>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockChannelInner {
                frames: Mutex::new(Vec::new()),
                connected: AtomicBool::new(true),
            }),
        }
    }

    /// The registry-facing handle; repeated calls share one allocation so
    /// `Arc::ptr_eq` identifies the channel
    pub fn clone_handle(&self) -> Arc<dyn TransportSender> {
        self.inner.clone()
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.inner.frames.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.inner.frames.lock().len()
    }

    pub fn disconnect(&self) {
        self.inner.connected.store(false, Ordering::SeqCst);
    }
}

/// Data source returning canned values; `None` simulates a failed fetch
pub struct MockSource {
    pub lighting: Option<Value>,
    pub fiber: Option<Value>,
}

impl MockSource {
    pub fn ok() -> Self {
        Self {
            lighting: Some(json!([{ "frame": 0 }])),
            fiber: Some(json!([{ "strand": 1 }])),
        }
    }
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch_lighting(&self, label: &str) -> anyhow::Result<Value> {
        self.lighting
            .clone()
            .ok_or_else(|| anyhow::anyhow!("lighting source down for {}", label))
    }

    async fn fetch_fiber(&self, label: &str) -> anyhow::Result<Value> {
        self.fiber
            .clone()
            .ok_or_else(|| anyhow::anyhow!("fiber source down for {}", label))
    }
}

/// Panel capturing published messages and connectivity triggers
#[derive(Default)]
pub struct RecordingPanel {
    messages: Mutex<Vec<PanelMessage>>,
    connectivity: AtomicU32,
}

impl RecordingPanel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<PanelMessage> {
        self.messages.lock().clone()
    }

    pub fn connectivity_count(&self) -> u32 {
        self.connectivity.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PanelLink for RecordingPanel {
    async fn publish(&self, message: PanelMessage) {
        self.messages.lock().push(message);
    }

    async fn publish_connectivity(&self) {
        self.connectivity.fetch_add(1, Ordering::SeqCst);
    }
}
