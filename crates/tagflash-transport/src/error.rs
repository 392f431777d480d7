use thiserror::Error;

/// Failure of a single interaction with a tag.
///
/// None of these are fatal: the caller reports them and waits for the next
/// tap.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("tag does not support NDEF")]
    NotSupported,

    #[error("tag is not writable")]
    NotWritable,

    #[error("tag storage too small: need {needed} bytes, have {available}")]
    CapacityExceeded { needed: usize, available: usize },

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("malformed message on tag: {0}")]
    MalformedMessage(String),
}

pub type TransportResult<T> = Result<T, TransportError>;
