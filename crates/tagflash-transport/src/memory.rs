//! In-memory tag for tests and simulation.
//!
//! [`MemoryTag`] is a cloneable handle onto shared tag state, so a test can
//! hand one clone to the code under test inside a [`TokenEvent`] and keep
//! another to inspect what was written.
//!
//! [`TokenEvent`]: crate::event::TokenEvent

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tagflash_protocol::{Record, RecordCodec};
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::event::TokenId;
use crate::traits::TokenTransport;

/// Default NDEF area of a small NTAG-class tag.
const DEFAULT_CAPACITY: usize = 137;

/// What the tag supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    Ndef,
    Formatable,
    Unsupported,
}

#[derive(Debug)]
struct TagState {
    uid: Vec<u8>,
    kind: TagKind,
    writable: bool,
    capacity: usize,
    message: Option<Vec<u8>>,
    connected: bool,
    present: bool,
    delay: Option<Duration>,
    writes: usize,
}

/// An in-memory tag implementing [`TokenTransport`].
#[derive(Clone, Debug)]
pub struct MemoryTag {
    state: Arc<Mutex<TagState>>,
}

impl MemoryTag {
    fn with_kind(uid: Vec<u8>, kind: TagKind) -> Self {
        Self {
            state: Arc::new(Mutex::new(TagState {
                uid,
                kind,
                writable: true,
                capacity: DEFAULT_CAPACITY,
                message: None,
                connected: false,
                present: true,
                delay: None,
                writes: 0,
            })),
        }
    }

    /// A blank, writable NDEF tag.
    pub fn ndef(uid: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(uid.into(), TagKind::Ndef)
    }

    /// A tag that must be formatted before it holds NDEF data.
    pub fn formatable(uid: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(uid.into(), TagKind::Formatable)
    }

    /// A tag with no NDEF support at all.
    pub fn unsupported(uid: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(uid.into(), TagKind::Unsupported)
    }

    pub fn with_message(self, message: impl Into<Vec<u8>>) -> Self {
        self.state().message = Some(message.into());
        self
    }

    pub fn with_capacity(self, capacity: usize) -> Self {
        self.state().capacity = capacity;
        self
    }

    pub fn read_only(self) -> Self {
        self.state().writable = false;
        self
    }

    /// Delay every connection attempt, simulating a hanging reader.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state().delay = Some(delay);
        self
    }

    fn state(&self) -> MutexGuard<'_, TagState> {
        self.state.lock().expect("tag lock poisoned")
    }

    pub fn id(&self) -> TokenId {
        TokenId::new(self.state().uid.clone())
    }

    pub fn kind(&self) -> TagKind {
        self.state().kind
    }

    /// Current NDEF message bytes.
    pub fn message(&self) -> Option<Vec<u8>> {
        self.state().message.clone()
    }

    /// Number of successful writes (including formats).
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    /// Take the tag out of the field. Later calls fail with `ConnectionLost`.
    pub fn remove(&self) {
        let mut state = self.state();
        state.present = false;
        state.connected = false;
    }

    fn check_connected(state: &TagState) -> TransportResult<()> {
        if !state.present {
            return Err(TransportError::ConnectionLost("tag removed".into()));
        }
        if !state.connected {
            return Err(TransportError::ConnectionLost("not connected".into()));
        }
        Ok(())
    }

    fn store(state: &mut TagState, record: &Record) -> TransportResult<()> {
        let bytes = RecordCodec::encode_message(record);
        if bytes.len() > state.capacity {
            return Err(TransportError::CapacityExceeded {
                needed: bytes.len(),
                available: state.capacity,
            });
        }
        state.message = Some(bytes);
        state.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl TokenTransport for MemoryTag {
    fn supports_ndef(&self) -> bool {
        self.state().kind == TagKind::Ndef
    }

    fn is_formatable(&self) -> bool {
        self.state().kind == TagKind::Formatable
    }

    async fn connect(&mut self) -> TransportResult<()> {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        if !state.present {
            return Err(TransportError::ConnectionLost("tag removed".into()));
        }
        if state.kind == TagKind::Unsupported {
            return Err(TransportError::NotSupported);
        }
        state.connected = true;
        debug!(uid = %hex::encode_upper(&state.uid), "memory tag connected");
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.state().writable
    }

    fn max_payload_size(&self) -> usize {
        self.state().capacity
    }

    async fn write_record(&mut self, record: &Record) -> TransportResult<()> {
        let mut state = self.state();
        Self::check_connected(&state)?;
        if state.kind != TagKind::Ndef {
            return Err(TransportError::NotSupported);
        }
        if !state.writable {
            return Err(TransportError::NotWritable);
        }
        Self::store(&mut state, record)
    }

    async fn read_message(&mut self) -> TransportResult<Option<Vec<u8>>> {
        let state = self.state();
        Self::check_connected(&state)?;
        if state.kind != TagKind::Ndef {
            return Err(TransportError::NotSupported);
        }
        match &state.message {
            Some(message) if message.is_empty() => Err(TransportError::MalformedMessage(
                "NDEF area holds a zero-length message".into(),
            )),
            message => Ok(message.clone()),
        }
    }

    async fn format(&mut self, record: &Record) -> TransportResult<()> {
        let mut state = self.state();
        Self::check_connected(&state)?;
        if state.kind != TagKind::Formatable {
            return Err(TransportError::NotSupported);
        }
        Self::store(&mut state, record)?;
        state.kind = TagKind::Ndef;
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        let mut state = self.state();
        if !state.present {
            return Err(TransportError::ConnectionLost("tag removed".into()));
        }
        state.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read() {
        let tag = MemoryTag::ndef(vec![1]);
        let mut handle = tag.clone();
        handle.connect().await.unwrap();
        handle.write_record(&RecordCodec::encode(14)).await.unwrap();
        let bytes = handle.read_message().await.unwrap().unwrap();
        assert_eq!(bytes, vec![0xD1, 0x01, 0x01, 0x42, 0x0E]);
        handle.close().await.unwrap();
        assert_eq!(tag.write_count(), 1);
        assert!(!tag.is_connected());
    }

    #[tokio::test]
    async fn write_requires_connection() {
        let mut tag = MemoryTag::ndef(vec![1]);
        let err = tag.write_record(&RecordCodec::encode(1)).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionLost(_)));
    }

    #[tokio::test]
    async fn read_only_rejects_write() {
        let mut tag = MemoryTag::ndef(vec![1]).read_only();
        tag.connect().await.unwrap();
        assert!(!tag.is_writable());
        let err = tag.write_record(&RecordCodec::encode(1)).await.unwrap_err();
        assert_eq!(err, TransportError::NotWritable);
    }

    #[tokio::test]
    async fn tiny_tag_rejects_write() {
        let mut tag = MemoryTag::ndef(vec![1]).with_capacity(4);
        tag.connect().await.unwrap();
        let err = tag.write_record(&RecordCodec::encode(1)).await.unwrap_err();
        assert_eq!(err, TransportError::CapacityExceeded { needed: 5, available: 4 });
    }

    #[tokio::test]
    async fn removed_tag_loses_connection() {
        let tag = MemoryTag::ndef(vec![1]);
        let mut handle = tag.clone();
        handle.connect().await.unwrap();
        tag.remove();
        let err = handle.read_message().await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionLost(_)));
        assert!(handle.connect().await.is_err());
    }

    #[tokio::test]
    async fn zero_length_message_is_malformed() {
        let mut tag = MemoryTag::ndef(vec![1]).with_message(Vec::new());
        tag.connect().await.unwrap();
        let err = tag.read_message().await.unwrap_err();
        assert!(matches!(err, TransportError::MalformedMessage(_)));
    }

    #[tokio::test]
    async fn format_turns_tag_into_ndef() {
        let tag = MemoryTag::formatable(vec![2]);
        let mut handle = tag.clone();
        assert!(!handle.supports_ndef());
        assert!(handle.is_formatable());
        handle.connect().await.unwrap();
        handle.format(&RecordCodec::encode(9)).await.unwrap();
        assert_eq!(tag.kind(), TagKind::Ndef);
        assert_eq!(tag.message().unwrap()[4], 9);
    }

    #[tokio::test]
    async fn unsupported_tag_refuses_connection() {
        let mut tag = MemoryTag::unsupported(vec![3]);
        assert!(!tag.supports_ndef());
        assert!(!tag.is_formatable());
        assert_eq!(tag.connect().await.unwrap_err(), TransportError::NotSupported);
    }

    #[test]
    fn id_reflects_uid() {
        let tag = MemoryTag::ndef(vec![0xDE, 0xAD]);
        assert_eq!(tag.id().to_hex(), "DEAD");
    }
}
