//! Hub error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HubError>;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] stagelink_transport::TransportError),

    #[error("core protocol error: {0}")]
    Core(#[from] stagelink_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
