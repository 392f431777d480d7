//! Tag record format for tagflash.
//!
//! A building tag carries one NDEF message holding one short record:
//!
//! ```text
//! 0xD1  header: MB | ME | SR | TNF=well-known
//! 0x01  type length
//! 0x01  payload length
//! 0x42  type 'B'
//! 0xNN  payload: effective building value
//! ```
//!
//! There is no ID field. This byte layout is what previously written tags
//! contain and must not change. Only the first record of a message is
//! inspected when decoding; anything after it is ignored.

pub mod codec;
pub mod error;
pub mod record;

pub use codec::RecordCodec;
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use record::{RawRecord, Record, Tnf, RECORD_TYPE};
