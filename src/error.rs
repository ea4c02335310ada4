//! Errors that occur when talking to a store

use thiserror::Error;

use crate::net::{cmd::CommandParseError, connection::ConnectionError, frame::Frame};

/// Error returned by store operations.
///
/// Errors coming from the store are surfaced as they are, [`RedisUtils`] never wraps or
/// retries them.
///
/// [`RedisUtils`]: crate::RedisUtils
#[derive(Error, Debug)]
pub enum Error {
    /// The store replied with an error message, e.g. `WRONGTYPE ...`
    #[error("{0}")]
    Command(String),

    /// The reply does not have the shape expected for the issued command
    #[error("Unexpected frame (got {0:?})")]
    UnexpectedFrame(Frame),

    /// The request could not be interpreted as a supported command
    #[error("Invalid command - {0}")]
    Parse(#[from] CommandParseError),

    /// Frames could not be exchanged with the peer
    #[error("Connection error - {0}")]
    Connection(#[from] ConnectionError),

    /// Error from I/O operations
    #[error("I/O error - {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Error reply for a command issued against a key holding another kind of value.
    pub(crate) fn wrong_type() -> Self {
        Self::Command(
            "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
        )
    }
}
