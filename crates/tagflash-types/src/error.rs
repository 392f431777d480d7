use thiserror::Error;

/// Input rejected before it reaches the store or a tag.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown building type: {0}")]
    UnknownType(String),

    #[error("value {0} is outside 0..=255")]
    ValueOutOfRange(i64),

    #[error("invalid number format: {0:?}")]
    InvalidNumber(String),
}
