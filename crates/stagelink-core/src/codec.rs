//! JSON frame encoding/decoding
//!
//! Boards speak JSON text frames. Encoding is done once per outbound
//! message; the resulting `Bytes` is cheap to clone across fan-out targets.

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::Result;

/// Encode a message to a JSON frame
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes> {
    let vec = serde_json::to_vec(message)?;
    Ok(Bytes::from(vec))
}

/// Decode a JSON frame into a message
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(data)?)
}
