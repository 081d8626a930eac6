//! Error types for stagelink

use thiserror::Error;

/// Result type alias for stagelink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stagelink core error types
#[derive(Error, Debug)]
pub enum Error {
    /// Hardware address does not match the canonical grammar
    #[error("invalid hardware address: {0}")]
    InvalidIdentity(String),

    /// JSON encoding error
    #[error("encode error: {0}")]
    EncodeError(String),

    /// JSON decoding error
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Device table rejected its configuration input
    #[error("invalid device table: {0}")]
    InvalidTable(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            Error::DecodeError(e.to_string())
        } else {
            Error::EncodeError(e.to_string())
        }
    }
}
