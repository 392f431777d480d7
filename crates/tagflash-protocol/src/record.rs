use std::fmt;

use serde::{Deserialize, Serialize};

/// Record type of a building record: ASCII `'B'`.
pub const RECORD_TYPE: u8 = b'B';

pub(crate) const FLAG_MB: u8 = 0x80;
pub(crate) const FLAG_ME: u8 = 0x40;
pub(crate) const FLAG_CF: u8 = 0x20;
pub(crate) const FLAG_SR: u8 = 0x10;
pub(crate) const FLAG_IL: u8 = 0x08;
pub(crate) const TNF_MASK: u8 = 0x07;

/// Type Name Format: how a record's type field is to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tnf {
    Empty,
    WellKnown,
    Media,
    AbsoluteUri,
    External,
    Unknown,
    Unchanged,
    Reserved,
}

impl Tnf {
    pub fn from_bits(bits: u8) -> Self {
        match bits & TNF_MASK {
            0x00 => Self::Empty,
            0x01 => Self::WellKnown,
            0x02 => Self::Media,
            0x03 => Self::AbsoluteUri,
            0x04 => Self::External,
            0x05 => Self::Unknown,
            0x06 => Self::Unchanged,
            _ => Self::Reserved,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Empty => 0x00,
            Self::WellKnown => 0x01,
            Self::Media => 0x02,
            Self::AbsoluteUri => 0x03,
            Self::External => 0x04,
            Self::Unknown => 0x05,
            Self::Unchanged => 0x06,
            Self::Reserved => 0x07,
        }
    }
}

impl fmt::Display for Tnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::WellKnown => "well-known",
            Self::Media => "media",
            Self::AbsoluteUri => "absolute-uri",
            Self::External => "external",
            Self::Unknown => "unknown",
            Self::Unchanged => "unchanged",
            Self::Reserved => "reserved",
        };
        f.write_str(s)
    }
}

/// A building record: type `'B'` with a one-byte payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    value: u8,
}

impl Record {
    /// Size of the framed message on the tag.
    pub const WIRE_LEN: usize = 5;

    pub(crate) fn new(value: u8) -> Self {
        Self { value }
    }

    pub fn discriminator(&self) -> u8 {
        RECORD_TYPE
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn payload(&self) -> [u8; 1] {
        [self.value]
    }

    /// The framed single-record message, as written to a tag.
    pub fn to_bytes(&self) -> [u8; Self::WIRE_LEN] {
        [
            FLAG_MB | FLAG_ME | FLAG_SR | Tnf::WellKnown.bits(),
            1,
            1,
            RECORD_TYPE,
            self.value,
        ]
    }
}

/// A record as found on a tag, before any building-specific checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRecord {
    pub message_begin: bool,
    pub message_end: bool,
    /// Payload continues in the following record(s).
    pub chunked: bool,
    pub tnf: Tnf,
    pub record_type: Vec<u8>,
    pub id: Vec<u8>,
    pub payload: Vec<u8>,
}
