use std::time::Duration;

use tagflash_protocol::{DecodeError, RecordCodec};
use tagflash_resolver::{Resolution, ValueResolver};
use tagflash_store::ValueStore;
use tagflash_transport::{TokenTransport, TransportError, TransportResult};
use tagflash_types::{format_value, BuildingType};
use tracing::{debug, info, warn};

use crate::error::SessionResult;
use crate::writer::{bounded, close_quietly};

/// User-visible result of reading one tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A building record whose value maps to a type.
    Building { building: BuildingType, value: u8 },
    /// A building record whose value no type currently has.
    Unknown { value: u8 },
    /// The tag holds no NDEF message.
    Blank,
    /// The tag holds something that is not a building record.
    Unrecognized(DecodeError),
    /// The tag could not be read.
    Failed(TransportError),
}

async fn read_connected(
    transport: &mut dyn TokenTransport,
    timeout: Duration,
) -> TransportResult<Option<Vec<u8>>> {
    bounded(timeout, "connect", transport.connect()).await?;
    let result = bounded(timeout, "read", transport.read_message()).await;
    close_quietly(transport, timeout).await;
    result
}

/// Read a presented tag and resolve its building type.
///
/// Transport and decode problems are outcomes, not errors; only a resolver
/// failure is returned as `Err`.
pub async fn read_token<S: ValueStore>(
    transport: &mut dyn TokenTransport,
    resolver: &ValueResolver<S>,
    timeout: Duration,
) -> SessionResult<ReadOutcome> {
    if !transport.supports_ndef() {
        debug!("tag is not NDEF formatted");
        return Ok(ReadOutcome::Failed(TransportError::NotSupported));
    }

    let message = match read_connected(transport, timeout).await {
        Ok(Some(message)) => message,
        Ok(None) => return Ok(ReadOutcome::Blank),
        Err(e) => {
            warn!(error = %e, "reading tag failed");
            return Ok(ReadOutcome::Failed(e));
        }
    };

    let value = match RecordCodec::decode_message(&message) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, raw = %e.raw_hex(), "tag is not a building record");
            return Ok(ReadOutcome::Unrecognized(e));
        }
    };

    let outcome = match resolver.resolve_byte(value)? {
        Resolution::Known(building) => ReadOutcome::Building { building, value },
        Resolution::Unknown(value) => ReadOutcome::Unknown { value },
    };
    info!(value = %format_value(value), ?outcome, "read tag");
    Ok(outcome)
}
