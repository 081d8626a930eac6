//! Connection registry
//!
//! Single source of truth for "is board X currently reachable". Keyed by
//! hardware address, storing only the transient channel handle; the device
//! record itself lives in the static table.

use dashmap::DashMap;
use stagelink_core::MacAddr;
use stagelink_transport::TransportSender;
use std::sync::Arc;

/// Process-wide map from board identity to its live outbound channel.
///
/// Constructed once at hub start and shared by handle; never a hidden
/// global. Invariant: at most one entry per identity, so the registry can
/// never outgrow the device table.
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: DashMap<MacAddr, Arc<dyn TransportSender>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the channel for `identity`.
    ///
    /// Last writer wins. A superseded channel is not closed here; closing
    /// stale handles belongs to the transport layer.
    pub fn register(&self, identity: MacAddr, channel: Arc<dyn TransportSender>) {
        self.channels.insert(identity, channel);
    }

    /// Remove the entry for `identity`, but only if it still holds
    /// `channel`.
    ///
    /// A disconnect handler for a superseded channel may run after a newer
    /// registration for the same board; the pointer comparison keeps it
    /// from evicting the legitimate entry. Returns whether an entry was
    /// removed; absent entries are a no-op, not an error.
    pub fn unregister(&self, identity: MacAddr, channel: &Arc<dyn TransportSender>) -> bool {
        self.channels
            .remove_if(&identity, |_, current| Arc::ptr_eq(current, channel))
            .is_some()
    }

    /// Look up the live channel for `identity`. Absence means "not
    /// currently reachable".
    pub fn lookup(&self, identity: MacAddr) -> Option<Arc<dyn TransportSender>> {
        self.channels.get(&identity).map(|e| e.value().clone())
    }

    pub fn contains(&self, identity: MacAddr) -> bool {
        self.channels.contains_key(&identity)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
