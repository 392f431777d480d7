//! The [`TokenTransport`] trait.

use async_trait::async_trait;
use tagflash_protocol::Record;

use crate::error::{TransportError, TransportResult};

/// Capability surface of one presented tag.
///
/// A handle is only valid while its tag is in the field. Once the tag is
/// removed every call is expected to fail with
/// [`TransportError::ConnectionLost`]. Calls may block for as long as the
/// hardware takes; callers bound them with their own timeout.
#[async_trait]
pub trait TokenTransport: Send {
    /// The tag already speaks NDEF.
    fn supports_ndef(&self) -> bool;

    /// The tag has no NDEF message area yet but can be formatted with one.
    fn is_formatable(&self) -> bool {
        false
    }

    /// Open a connection to the tag.
    async fn connect(&mut self) -> TransportResult<()>;

    /// Whether the NDEF area accepts writes. Valid after `connect`.
    fn is_writable(&self) -> bool;

    /// Size in bytes of the NDEF message area. Valid after `connect`.
    fn max_payload_size(&self) -> usize;

    /// Replace the tag's message with a message holding `record`.
    async fn write_record(&mut self, record: &Record) -> TransportResult<()>;

    /// The raw bytes of the tag's NDEF message, or `None` if it holds none.
    async fn read_message(&mut self) -> TransportResult<Option<Vec<u8>>>;

    /// Format the tag for NDEF and write `record` as its first message.
    async fn format(&mut self, _record: &Record) -> TransportResult<()> {
        Err(TransportError::NotSupported)
    }

    /// Close the connection.
    async fn close(&mut self) -> TransportResult<()>;
}
