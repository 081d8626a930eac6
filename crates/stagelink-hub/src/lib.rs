//! Stagelink Hub
//!
//! The hub is the device-connection registry and message-routing layer:
//! - Identifies boards on connect and tracks them by hardware address
//! - Holds the live channel handle per board ([`ConnectionRegistry`])
//! - Pushes the configuration upload on connect ([`upload`])
//! - Fans commands out to named boards, skipping offline ones
//! - Relays board responses to the supervisory side ([`PanelLink`])
//! - Mirrors connectivity state on connect/disconnect
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stagelink_core::DeviceTable;
//! use stagelink_hub::{Hub, HubConfig, NullPanel};
//! # use stagelink_hub::DataSource;
//! # fn sources() -> Arc<dyn DataSource> { unimplemented!() }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = Arc::new(DeviceTable::from_json(&std::fs::read("devices.json")?)?);
//!     let hub = Hub::new(HubConfig::default(), table, sources(), Arc::new(NullPanel));
//!     hub.serve_websocket("0.0.0.0:8082").await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod hub;
pub mod panel;
pub mod registry;
pub mod sources;
pub mod upload;
pub mod validate;

#[cfg(test)]
mod test_util;

pub use error::{HubError, Result};
pub use hub::{Hub, HubConfig};
pub use panel::{NullPanel, PanelLink};
pub use registry::ConnectionRegistry;
pub use sources::DataSource;
pub use upload::build_upload;
pub use validate::validate_identity;
