//! Supervisory sink seam
//!
//! The supervisory side (control consoles) is an external collaborator.
//! The hub only ever calls these two hooks; it never builds the
//! connectivity snapshot itself. The panel implementation re-reads the
//! device table's connected flags when asked.

use async_trait::async_trait;
use stagelink_core::PanelMessage;

/// Best-effort publisher toward supervisory consumers.
///
/// Both calls are fire-and-forget: implementations log their own failures
/// and never propagate them back into the routing core.
#[async_trait]
pub trait PanelLink: Send + Sync {
    /// Relay one message upstream
    async fn publish(&self, message: PanelMessage);

    /// Signal that some board's connectivity changed; the panel side
    /// rebuilds and broadcasts the full snapshot
    async fn publish_connectivity(&self);
}

/// Panel that drops everything (no supervisory side attached)
pub struct NullPanel;

#[async_trait]
impl PanelLink for NullPanel {
    async fn publish(&self, _message: PanelMessage) {}

    async fn publish_connectivity(&self) {}
}
