use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagflash_protocol::{Record, RecordCodec};
use tagflash_transport::{TokenTransport, TransportError, TransportResult};
use tracing::{debug, warn};

/// How a record ended up on the tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMethod {
    /// Written into the existing NDEF area.
    Ndef,
    /// The tag was formatted for NDEF with the record as its first message.
    Formatted,
}

/// Run `op` with an upper bound; running out of time is a lost connection.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    what: &str,
    op: impl Future<Output = TransportResult<T>>,
) -> TransportResult<T> {
    match tokio::time::timeout(timeout, op).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::ConnectionLost(format!(
            "{what} timed out after {} ms",
            timeout.as_millis()
        ))),
    }
}

/// Close the connection after an attempt. A failing close never changes the
/// attempt's outcome.
pub(crate) async fn close_quietly(transport: &mut dyn TokenTransport, timeout: Duration) {
    if let Err(e) = bounded(timeout, "close", transport.close()).await {
        debug!(error = %e, "closing tag connection failed");
    }
}

async fn write_connected(
    transport: &mut dyn TokenTransport,
    record: &Record,
    timeout: Duration,
) -> TransportResult<()> {
    if !transport.is_writable() {
        return Err(TransportError::NotWritable);
    }
    let needed = RecordCodec::encode_message(record).len();
    let available = transport.max_payload_size();
    if available < needed {
        return Err(TransportError::CapacityExceeded { needed, available });
    }
    bounded(timeout, "write", transport.write_record(record)).await
}

/// Put `record` on a presented tag.
///
/// NDEF tags are checked for writability and capacity before writing. Tags
/// without NDEF that can be formatted are formatted with the record. Every
/// transport call is bounded by `timeout`.
pub async fn write_record(
    transport: &mut dyn TokenTransport,
    record: &Record,
    timeout: Duration,
) -> TransportResult<WriteMethod> {
    if transport.supports_ndef() {
        bounded(timeout, "connect", transport.connect()).await?;
        let result = write_connected(transport, record, timeout).await;
        close_quietly(transport, timeout).await;
        result.map(|()| WriteMethod::Ndef)
    } else if transport.is_formatable() {
        bounded(timeout, "connect", transport.connect()).await?;
        let result = bounded(timeout, "format", transport.format(record)).await;
        close_quietly(transport, timeout).await;
        result.map(|()| WriteMethod::Formatted)
    } else {
        warn!("tag supports neither NDEF nor formatting");
        Err(TransportError::NotSupported)
    }
}
