use std::fmt;

use tokio::sync::mpsc;

use crate::traits::TokenTransport;

/// Hardware identifier of a tag (its UID).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenId(Vec<u8>);

impl TokenId {
    pub fn new(uid: impl Into<Vec<u8>>) -> Self {
        Self(uid.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag:{}", self.to_hex())
    }
}

/// One tag presentation.
///
/// The transport handle is only usable while handling this event.
pub struct TokenEvent {
    pub id: TokenId,
    pub transport: Box<dyn TokenTransport>,
}

impl TokenEvent {
    pub fn new(id: TokenId, transport: impl TokenTransport + 'static) -> Self {
        Self {
            id,
            transport: Box::new(transport),
        }
    }
}

impl fmt::Debug for TokenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEvent").field("id", &self.id).finish()
    }
}

pub type TokenEventSender = mpsc::Sender<TokenEvent>;
pub type TokenEventReceiver = mpsc::Receiver<TokenEvent>;

/// Channel carrying tag presentations from the hardware side to a single
/// consumer. A bounded capacity applies back-pressure to the producer.
pub fn token_channel(capacity: usize) -> (TokenEventSender, TokenEventReceiver) {
    mpsc::channel(capacity.max(1))
}
