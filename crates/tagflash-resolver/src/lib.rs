//! Effective value resolution for tagflash.
//!
//! Every building type has a compile-time default byte. Users may override
//! that byte per type; overrides are persisted through a
//! [`tagflash_store::ValueStore`]. The [`ValueResolver`] combines both:
//!
//! - forward: building type → effective byte (written to tags)
//! - inverse: byte read from a tag → building type, first match in
//!   catalogue order
//!
//! Effective values are not unique once overrides are applied. Two types
//! overridden to the same byte alias to the one declared first.

pub mod entry;
pub mod error;
pub mod resolver;

pub use entry::{ConfigEntry, Resolution};
pub use error::{ResolveError, ResolveResult};
pub use resolver::{override_key, ValueResolver, OVERRIDE_KEY_PREFIX};
