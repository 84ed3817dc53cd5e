//! Transport session - one WebSocket connection feeding one Dispatcher
//!
//! Lifecycle: `Idle → Connecting → Open → Closed`. `Closed` is terminal; there
//! is no reconnection here, a supervisor that wants one builds a new session.
//!
//! Once open, a single tokio task owns the socket. Inbound frames are decoded
//! and dispatched on that task, and outbound frames are written by it, so a
//! dispatch is never interleaved with a write and `close()` always lets the
//! message being dispatched finish first.

mod connection;
mod endpoint;

pub use endpoint::Endpoint;

use crate::codec::{Codec, Frame};
use crate::dispatch::Dispatcher;
use crate::osc::{Message, OscError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default time allowed for the WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, `open` not called yet
    Idle,
    Connecting,
    Open,
    /// Terminal
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Work handed to the connection task
pub(crate) enum Command {
    Send {
        frame: Frame,
        ack: oneshot::Sender<Result<(), OscError>>,
    },
    Close,
}

/// OSC client session over a WebSocket
pub struct Session {
    endpoint: Endpoint,
    codec: Arc<dyn Codec>,
    dispatcher: Arc<Mutex<Dispatcher>>,
    connect_timeout: Duration,
    state_tx: Arc<watch::Sender<SessionState>>,
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Create an idle session; nothing touches the network until `open`
    pub fn new(endpoint: Endpoint, codec: Arc<dyn Codec>, dispatcher: Dispatcher) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            endpoint,
            codec,
            dispatcher: Arc::new(Mutex::new(dispatcher)),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            state_tx: Arc::new(state_tx),
            commands: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Override the handshake timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Shared handle to the routing table
    ///
    /// The connection task holds this lock while dispatching, so handlers
    /// must not lock it themselves.
    pub fn dispatcher(&self) -> Arc<Mutex<Dispatcher>> {
        Arc::clone(&self.dispatcher)
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Connect and start delivering inbound messages to the dispatcher
    ///
    /// A failed or timed-out handshake leaves the session `Closed`; no retry
    /// is attempted.
    pub async fn open(&self) -> Result<(), OscError> {
        let mut started = false;
        self.state_tx.send_if_modified(|state| {
            if *state == SessionState::Idle {
                *state = SessionState::Connecting;
                started = true;
            }
            started
        });
        if !started {
            return Err(OscError::AlreadyStarted {
                state: self.state().to_string(),
            });
        }

        let url = self.endpoint.url();
        info!("🔌 Connecting to OSC endpoint {}", url);

        let handshake =
            tokio::time::timeout(self.connect_timeout, tokio_tungstenite::connect_async(url.as_str()))
                .await;
        let ws = match handshake {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => return Err(self.fail_connect(e.to_string())),
            Err(_) => {
                return Err(self.fail_connect(format!(
                    "timed out after {}ms",
                    self.connect_timeout.as_millis()
                )))
            },
        };

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        *self.commands.lock() = Some(cmd_tx);

        let mut opened = false;
        self.state_tx.send_if_modified(|state| {
            if *state == SessionState::Connecting {
                *state = SessionState::Open;
                opened = true;
            }
            opened
        });
        if !opened {
            // close() won the race while the handshake was in flight
            self.commands.lock().take();
            let mut ws = ws;
            let _ = ws.close(None).await;
            debug!("Session closed during handshake, dropping connection");
            return Err(OscError::NotConnected {
                state: self.state().to_string(),
            });
        }

        let task = tokio::spawn(connection::run(
            ws,
            cmd_rx,
            Arc::clone(&self.codec),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.state_tx),
        ));
        *self.task.lock() = Some(task);

        info!("✅ OSC session open ({} codec) at {}", self.codec.name(), url);
        Ok(())
    }

    /// Encode and transmit a message
    ///
    /// Fails with `NotConnected` (codec untouched) unless the session is
    /// open; nothing is queued for later.
    pub async fn send(&self, message: &Message) -> Result<(), OscError> {
        let state = self.state();
        if state != SessionState::Open {
            return Err(OscError::NotConnected {
                state: state.to_string(),
            });
        }

        message.validate_outbound()?;
        let frame = self.codec.encode(message)?;

        let commands = self.commands.lock().clone();
        let not_connected = || OscError::NotConnected {
            state: SessionState::Closed.to_string(),
        };
        let commands = commands.ok_or_else(not_connected)?;

        let (ack_tx, ack_rx) = oneshot::channel();
        commands
            .send(Command::Send { frame, ack: ack_tx })
            .map_err(|_| not_connected())?;

        ack_rx.await.map_err(|_| not_connected())??;
        debug!("Sent OSC: {}", message);
        Ok(())
    }

    /// Close the session; closing a closed session is a no-op
    ///
    /// Resolves once the session is `Closed`. A dispatch in progress
    /// completes first.
    pub async fn close(&self) {
        let mut closed_early = false;
        self.state_tx.send_if_modified(|state| match *state {
            SessionState::Idle | SessionState::Connecting => {
                *state = SessionState::Closed;
                closed_early = true;
                true
            },
            _ => false,
        });
        if closed_early {
            info!("OSC session closed before opening");
            return;
        }

        if let Some(commands) = self.commands.lock().take() {
            let _ = commands.send(Command::Close);
        }
        self.wait_closed().await;
        self.task.lock().take();
    }

    /// Resolve once the session reaches `Closed`, for any reason
    pub async fn wait_closed(&self) {
        let mut rx = self.state_tx.subscribe();
        if rx.wait_for(|state| *state == SessionState::Closed).await.is_err() {
            warn!("Session state channel dropped");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint.url())
            .field("codec", &self.codec.name())
            .field("state", &self.state())
            .finish()
    }
}

impl Session {
    fn fail_connect(&self, reason: String) -> OscError {
        self.state_tx.send_replace(SessionState::Closed);
        warn!("❌ Connection to {} failed: {}", self.endpoint, reason);
        OscError::ConnectFailed {
            endpoint: self.endpoint.url(),
            reason,
        }
    }
}
