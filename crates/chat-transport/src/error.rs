//! Transport errors.

use std::io;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("connection closed")]
    ConnectionClosed,
    #[error("outbound queue is full")]
    Backpressure,
    #[error("write did not complete in time")]
    WriteTimeout,
    #[error("line exceeds maximum length")]
    LineTooLong,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("transport task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<LinesCodecError> for TransportError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Self::LineTooLong,
            LinesCodecError::Io(e) => Self::Io(e),
        }
    }
}
