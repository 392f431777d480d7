//! Write session state machine and tag flows for tagflash.
//!
//! A [`WriteSession`] is either idle or armed with a building type and the
//! effective value captured when it was armed. While armed, each presented
//! tag receives that value. In continuous mode the session stays armed
//! across taps; in single-shot mode it disarms after the first tap.
//!
//! The [`WriteController`] owns a session and drives it from two channels:
//! user commands (arm/disarm) and tag presentations. Commands are always
//! applied before the next tag is handled, and each tag is handled to
//! completion before the next one is accepted.
//!
//! [`read_token`] is the read-side counterpart: it decodes a tag and maps
//! its byte back to a building type.

pub mod config;
pub mod controller;
pub mod error;
pub mod reader;
pub mod session;
pub mod writer;

pub use config::SessionConfig;
pub use controller::{ControllerHandle, SessionReport, WriteController};
pub use error::{SessionError, SessionResult};
pub use reader::{read_token, ReadOutcome};
pub use session::{SessionState, TokenOutcome, WriteMode, WriteSession};
pub use writer::{write_record, WriteMethod};
