use std::sync::Arc;

use tagflash_resolver::ValueResolver;
use tagflash_store::ValueStore;
use tagflash_transport::{TokenEvent, TokenEventReceiver, TokenId};
use tagflash_types::BuildingType;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::session::{SessionState, TokenOutcome, WriteMode, WriteSession};

/// Commands accepted by the controller.
enum SessionCommand {
    Arm {
        selection: Option<BuildingType>,
        mode: WriteMode,
        reply: oneshot::Sender<SessionResult<SessionState>>,
    },
    Disarm {
        reply: oneshot::Sender<SessionState>,
    },
    Shutdown,
}

/// Reports broadcast by the controller, one per state change or tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionReport {
    Armed {
        building: BuildingType,
        value: u8,
        mode: WriteMode,
    },
    Disarmed,
    Token {
        token: TokenId,
        outcome: TokenOutcome,
    },
}

/// Single consumer driving a [`WriteSession`] from user commands and tag
/// presentations.
///
/// Runs until the tag channel closes, every [`ControllerHandle`] is
/// dropped, or [`ControllerHandle::shutdown`] is called.
pub struct WriteController<S> {
    session: WriteSession,
    resolver: Arc<ValueResolver<S>>,
    events: TokenEventReceiver,
    commands: mpsc::Receiver<SessionCommand>,
    reports: broadcast::Sender<SessionReport>,
}

/// Cloneable front end to a running [`WriteController`].
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<SessionCommand>,
    reports: broadcast::Sender<SessionReport>,
}

impl<S: ValueStore + 'static> WriteController<S> {
    pub fn new(
        resolver: Arc<ValueResolver<S>>,
        events: TokenEventReceiver,
        config: SessionConfig,
    ) -> (Self, ControllerHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (report_tx, _) = broadcast::channel(config.report_capacity.max(1));
        let controller = Self {
            session: WriteSession::new(config),
            resolver,
            events,
            commands: cmd_rx,
            reports: report_tx.clone(),
        };
        let handle = ControllerHandle {
            commands: cmd_tx,
            reports: report_tx,
        };
        (controller, handle)
    }

    /// Create a controller and run it on the tokio runtime.
    pub fn spawn(
        resolver: Arc<ValueResolver<S>>,
        events: TokenEventReceiver,
        config: SessionConfig,
    ) -> (JoinHandle<WriteSession>, ControllerHandle) {
        let (controller, handle) = Self::new(resolver, events, config);
        (tokio::spawn(controller.run()), handle)
    }

    /// Process commands and tags until either input closes. Returns the
    /// session in its final state.
    pub async fn run(mut self) -> WriteSession {
        info!("write controller started");
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                event = self.events.recv() => match event {
                    Some(event) => self.on_token(event).await,
                    None => break,
                },
            }
        }
        info!("write controller stopped");
        self.session
    }

    fn publish(&self, report: SessionReport) {
        // No subscribers is fine.
        let _ = self.reports.send(report);
    }

    fn apply(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Arm {
                selection,
                mode,
                reply,
            } => {
                let result = self.session.arm(selection, mode, self.resolver.as_ref());
                if let Ok(SessionState::Armed {
                    building,
                    value,
                    mode,
                }) = result
                {
                    self.publish(SessionReport::Armed {
                        building,
                        value,
                        mode,
                    });
                }
                let _ = reply.send(result);
            }
            SessionCommand::Disarm { reply } => {
                let previous = self.session.disarm();
                if previous != SessionState::Idle {
                    self.publish(SessionReport::Disarmed);
                }
                let _ = reply.send(previous);
            }
            SessionCommand::Shutdown => {}
        }
    }

    async fn on_token(&mut self, event: TokenEvent) {
        let token = event.id.clone();
        let was_armed = self.session.is_armed();
        let outcome = self.session.handle_token(event).await;
        debug!(token = %token, ?outcome, "tag handled");
        self.publish(SessionReport::Token { token, outcome });
        if was_armed && !self.session.is_armed() {
            self.publish(SessionReport::Disarmed);
        }
    }
}

impl ControllerHandle {
    /// Arm the session. See [`WriteSession::arm`].
    pub async fn arm(
        &self,
        selection: Option<BuildingType>,
        mode: WriteMode,
    ) -> SessionResult<SessionState> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Arm {
                selection,
                mode,
                reply,
            })
            .await
            .map_err(|_| SessionError::ControllerClosed)?;
        rx.await.map_err(|_| SessionError::ControllerClosed)?
    }

    /// Disarm the session; returns the state it was in.
    pub async fn disarm(&self) -> SessionResult<SessionState> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Disarm { reply })
            .await
            .map_err(|_| SessionError::ControllerClosed)?;
        rx.await.map_err(|_| SessionError::ControllerClosed)
    }

    /// Stop the controller after the tag in flight, if any. Tags still
    /// queued are dropped.
    pub async fn shutdown(&self) -> SessionResult<()> {
        self.commands
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::ControllerClosed)
    }

    /// Receive reports published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionReport> {
        self.reports.subscribe()
    }
}

impl std::fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("closed", &self.commands.is_closed())
            .finish()
    }
}
