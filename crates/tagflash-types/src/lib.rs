//! Foundation types for tagflash.
//!
//! This crate holds the fixed catalogue of building types that can be
//! written to a tag, plus helpers for parsing and displaying the single
//! byte value each type is identified by. Every other tagflash crate
//! depends on `tagflash-types`.
//!
//! # Key Types
//!
//! - [`BuildingType`]: closed, ordered catalogue of building types with
//!   their default byte values
//! - [`ValidationError`]: rejected user input (unknown type name, value
//!   outside `0..=255`, unparsable number)

pub mod building;
pub mod error;
pub mod value;

pub use building::BuildingType;
pub use error::ValidationError;
pub use value::{format_value, parse_value, value_from_int};
