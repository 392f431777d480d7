use serde::{Deserialize, Serialize};
use tagflash_protocol::RecordCodec;
use tagflash_resolver::ValueResolver;
use tagflash_store::ValueStore;
use tagflash_transport::{TokenEvent, TransportError};
use tagflash_types::{format_value, BuildingType};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::writer::{write_record, WriteMethod};

/// Whether the session stays armed after a tap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// Write every presented tag until disarmed.
    Continuous,
    /// Write the next presented tag, then disarm.
    SingleShot,
}

/// Write session state.
///
/// `value` is the effective value of `building` at the moment the session
/// was armed. Overrides changed while armed are not picked up until the
/// session is armed again, so every tag in one run receives the same byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Armed {
        building: BuildingType,
        value: u8,
        mode: WriteMode,
    },
}

/// What happened to one presented tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenOutcome {
    /// The session was idle; the tag was consumed without writing.
    Ignored,
    Written {
        building: BuildingType,
        value: u8,
        method: WriteMethod,
    },
    Failed {
        building: BuildingType,
        value: u8,
        error: TransportError,
    },
}

/// The write state machine.
///
/// Not internally synchronized: the owner feeds it one tag at a time.
#[derive(Debug)]
pub struct WriteSession {
    state: SessionState,
    config: SessionConfig,
}

impl WriteSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: SessionState::Idle,
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, SessionState::Armed { .. })
    }

    /// Idle → Armed.
    ///
    /// Arming an armed session is rejected; disarm first. On any error the
    /// state is left unchanged.
    pub fn arm<S: ValueStore>(
        &mut self,
        selection: Option<BuildingType>,
        mode: WriteMode,
        resolver: &ValueResolver<S>,
    ) -> SessionResult<SessionState> {
        let building = selection.ok_or(SessionError::NoSelection)?;
        if let SessionState::Armed { building: current, .. } = self.state {
            return Err(SessionError::AlreadyArmed { building: current });
        }
        let value = resolver.effective_value(building)?;
        self.state = SessionState::Armed {
            building,
            value,
            mode,
        };
        info!(building = %building, value = %format_value(value), ?mode, "write session armed");
        Ok(self.state)
    }

    /// Armed → Idle. Always succeeds; returns the previous state.
    pub fn disarm(&mut self) -> SessionState {
        let previous = std::mem::replace(&mut self.state, SessionState::Idle);
        if previous != SessionState::Idle {
            info!("write session disarmed");
        }
        previous
    }

    /// React to one presented tag.
    ///
    /// When idle the tag is consumed and nothing is written. When armed the
    /// snapshot value is written; a failure is reported and the session
    /// stays armed, except in single-shot mode where any attempt disarms.
    pub async fn handle_token(&mut self, mut event: TokenEvent) -> TokenOutcome {
        let SessionState::Armed {
            building,
            value,
            mode,
        } = self.state
        else {
            debug!(token = %event.id, "tag presented while idle; ignored");
            return TokenOutcome::Ignored;
        };

        let record = RecordCodec::encode(value);
        let result = write_record(
            event.transport.as_mut(),
            &record,
            self.config.transport_timeout(),
        )
        .await;

        if mode == WriteMode::SingleShot {
            self.disarm();
        }

        match result {
            Ok(method) => {
                info!(
                    token = %event.id,
                    building = %building,
                    value = %format_value(value),
                    ?method,
                    "wrote building record"
                );
                TokenOutcome::Written {
                    building,
                    value,
                    method,
                }
            }
            Err(error) => {
                warn!(token = %event.id, building = %building, error = %error, "write failed");
                TokenOutcome::Failed {
                    building,
                    value,
                    error,
                }
            }
        }
    }
}

impl Default for WriteSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
