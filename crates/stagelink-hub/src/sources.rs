//! External data-source seam
//!
//! The lighting and fiber payloads live in backend services the hub does
//! not own. Both fetches may fail independently; the aggregator decides
//! what a failure means.

use async_trait::async_trait;
use serde_json::Value;

/// Per-board configuration data, fetched by display label.
///
/// Values are opaque to the hub; they are forwarded positionally in the
/// upload payload without inspection.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// LED strip data for one board
    async fn fetch_lighting(&self, label: &str) -> anyhow::Result<Value>;

    /// Optic-fiber data for one board
    async fn fetch_fiber(&self, label: &str) -> anyhow::Result<Value>;
}
