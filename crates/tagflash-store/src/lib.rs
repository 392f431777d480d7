//! Key-value persistence for tagflash override values.
//!
//! The resolver stores one integer per overridden building type. This
//! crate defines the narrow contract it relies on and two backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`ValueStore`] trait:
//!
//! - [`InMemoryValueStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileValueStore`] -- JSON object file, rewritten atomically on every
//!   mutation
//!
//! # Design Rules
//!
//! 1. Writes are synchronous: once `put_int`/`remove` returns `Ok`, every
//!    later read observes the change.
//! 2. The store never interprets keys or values.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileValueStore;
pub use memory::InMemoryValueStore;
pub use traits::ValueStore;
