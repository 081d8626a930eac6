//! Payload aggregation
//!
//! On (re)connect a board gets its full configuration in one upload. The
//! pin layout comes from the static table; lighting and fiber data come
//! from the two external sources, fetched concurrently.

use stagelink_core::{DeviceTable, MacAddr, Origin, ServerMessage, UploadPayload, STATUS_OK};
use tracing::warn;

use crate::sources::DataSource;

/// Assemble the upload for one board.
///
/// Fail-closed: if either source fetch fails the whole upload is aborted;
/// an incomplete configuration is worse than none. Returns the assembled
/// message only when both fetches succeed.
pub async fn build_upload(
    table: &DeviceTable,
    sources: &dyn DataSource,
    identity: MacAddr,
) -> Option<ServerMessage> {
    let record = table.get(identity)?;
    let label = record.label.as_str();

    let Some(pin_layout) = table.pin_layout(identity) else {
        warn!("no pin layout for {} ({})", label, identity);
        return None;
    };

    let (lighting, fiber) = tokio::join!(
        sources.fetch_lighting(label),
        sources.fetch_fiber(label),
    );

    let lighting = match lighting {
        Ok(value) => value,
        Err(e) => {
            warn!("failed to fetch lighting data for {}: {}", label, e);
            return None;
        }
    };
    let fiber = match fiber {
        Ok(value) => value,
        Err(e) => {
            warn!("failed to fetch fiber data for {}: {}", label, e);
            return None;
        }
    };

    Some(ServerMessage::Upload {
        from: Origin::Server,
        status_code: STATUS_OK,
        payload: UploadPayload(pin_layout.clone(), fiber, lighting),
    })
}
