//! Token transport surface for tagflash.
//!
//! The core never talks to NFC hardware directly. It needs only the
//! capability surface in [`TokenTransport`] and a stream of
//! [`TokenEvent`]s, one per tag tap. Hardware integrations implement the
//! trait and push events into the channel from [`token_channel`].
//!
//! - [`error`]: [`TransportError`], per-attempt failures
//! - [`traits`]: the [`TokenTransport`] trait
//! - [`event`]: [`TokenEvent`], [`TokenId`] and the event channel
//! - [`memory`]: [`MemoryTag`], an in-memory tag for tests and simulation

pub mod error;
pub mod event;
pub mod memory;
pub mod traits;

pub use error::{TransportError, TransportResult};
pub use event::{token_channel, TokenEvent, TokenEventReceiver, TokenEventSender, TokenId};
pub use memory::{MemoryTag, TagKind};
pub use traits::TokenTransport;
