use thiserror::Error;

use crate::record::Tnf;

/// Reasons a tag's content is not a building record.
///
/// Every variant keeps the bytes that were inspected so the caller can show
/// them (see [`DecodeError::raw_hex`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// `tnf` is `None` when only the record type was available.
    #[error("not a building record: tnf={}, type={}", tnf_label(.tnf), hex::encode(.discriminator))]
    NotRecognizedDiscriminator {
        tnf: Option<Tnf>,
        discriminator: Vec<u8>,
        raw: Vec<u8>,
    },

    #[error("building record has an empty payload")]
    EmptyPayload { raw: Vec<u8> },

    #[error("first record is chunked across a multi-record container")]
    MultiRecordContainer { raw: Vec<u8> },

    #[error("malformed message: {reason}")]
    Malformed { reason: String, raw: Vec<u8> },
}

impl DecodeError {
    /// The bytes that failed to decode.
    pub fn raw(&self) -> &[u8] {
        match self {
            Self::NotRecognizedDiscriminator { raw, .. }
            | Self::EmptyPayload { raw }
            | Self::MultiRecordContainer { raw }
            | Self::Malformed { raw, .. } => raw,
        }
    }

    /// Uppercase hex dump of [`raw`](Self::raw).
    pub fn raw_hex(&self) -> String {
        hex::encode_upper(self.raw())
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;

fn tnf_label(tnf: &Option<Tnf>) -> String {
    match tnf {
        Some(tnf) => tnf.to_string(),
        None => "unspecified".to_string(),
    }
}

/// A record field too long for NDEF framing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("record {index}: {field} is {len} bytes, at most {max} allowed")]
    FieldTooLong {
        index: usize,
        field: &'static str,
        len: usize,
        max: usize,
    },
}

pub type EncodeResult<T> = Result<T, EncodeError>;
