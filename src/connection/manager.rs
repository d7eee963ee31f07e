//! Relay connection lifecycle.
//!
//! The `ConnectionManager` owns at most one live link at a time. It opens the
//! link when enabled, tears it down on disable, channel change or drop, and
//! decodes inbound frames for the presence store. Every teardown of an open
//! connection first sends a best-effort `visible:false` frame for the local
//! participant so peers can hide the departing cursor.
//!
//! There is no retry loop: after an unexpected close the manager stays
//! `Closed` until it is reconfigured or `reopen` is called.

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::connection::config::ConnectionConfig;
use crate::connection::state::ConnectionState;
use crate::connection::transport::{
    ConnectRequest, ConnectionId, Link, Transport, TransportEvent, TransportEventKind,
};
use crate::protocol::{CursorUpdate, WireMessage, decode, encode_cursor};
use crate::types::ParticipantId;

/// The live link together with the id its events are tagged with
struct ActiveConnection<L> {
    id: ConnectionId,
    link: L,
}

/// State machine around one relay connection at a time.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    endpoint: String,
    local_id: ParticipantId,
    config: ConnectionConfig,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    active: Option<ActiveConnection<T::Link>>,
    next_connection: u64,
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates an idle manager. Nothing is opened until `connect` is called.
    ///
    /// # Arguments
    ///
    /// * `transport` - Opens the underlying links
    /// * `endpoint` - Relay URL without the channel query
    /// * `local_id` - Identity used for the farewell frame on teardown
    /// * `config` - Initial channel, credential and disabled flag
    pub fn new(
        transport: T,
        endpoint: impl Into<String>,
        local_id: ParticipantId,
        config: ConnectionConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);

        ConnectionManager {
            transport,
            endpoint: endpoint.into(),
            local_id,
            config,
            state: ConnectionState::Idle,
            state_tx,
            active: None,
            next_connection: 1,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Watches state transitions from outside the event loop
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Gets the id of the live connection, if any
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Opens a connection unless one is already held or the config is disabled.
    pub fn connect(&mut self) {
        if self.active.is_some() {
            return;
        }
        if self.state == ConnectionState::Closed {
            self.transition(ConnectionState::Idle);
        }
        if self.config.disabled {
            debug!("relay connection disabled, staying idle");
            return;
        }

        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;

        let request = ConnectRequest {
            connection: id,
            url: self.config.request_url(&self.endpoint),
            protocol: self.config.credential.clone(),
        };
        info!(connection = %id, url = %request.url, "connecting to relay");

        self.transition(ConnectionState::Connecting);
        match self.transport.open(request) {
            Ok(link) => self.active = Some(ActiveConnection { id, link }),
            Err(e) => {
                warn!(connection = %id, error = %e, "failed to open relay connection");
                self.transition(ConnectionState::Closed);
            }
        }
    }

    /// Applies new connection parameters.
    ///
    /// A change of channel, credential or disabled flag tears the current
    /// connection down and starts a fresh one (unless now disabled).
    pub fn reconfigure(&mut self, config: ConnectionConfig) {
        if !self.config.requires_reconnect(&config) {
            return;
        }

        info!(
            channel = ?config.channel,
            disabled = config.disabled,
            "relay configuration changed"
        );
        self.config = config;
        self.teardown("configuration changed");
        self.connect();
    }

    /// Reconnects after the connection was lost. No-op while one is held.
    pub fn reopen(&mut self) {
        if self.active.is_none() {
            self.connect();
        }
    }

    /// Tears down the live connection, if any
    pub fn disconnect(&mut self) {
        self.teardown("disconnect requested");
    }

    /// Sends a cursor update if the connection is open.
    ///
    /// Returns whether the frame was handed to the transport. Failures are
    /// logged and otherwise swallowed.
    pub fn send(&mut self, update: &CursorUpdate) -> bool {
        if !self.state.is_open() {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let frame = match encode_cursor(update) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to encode cursor update");
                return false;
            }
        };

        match active.link.send(frame) {
            Ok(()) => true,
            Err(e) => {
                debug!(connection = %active.id, error = %e, "cursor send failed");
                false
            }
        }
    }

    /// Processes one transport event.
    ///
    /// Events tagged with anything but the live connection are dropped.
    /// Returns the decoded cursor update for a valid inbound cursor frame.
    pub fn handle_event(&mut self, event: TransportEvent) -> Option<CursorUpdate> {
        if self.connection_id() != Some(event.connection) {
            debug!(connection = %event.connection, "ignoring event from released connection");
            return None;
        }

        match event.kind {
            TransportEventKind::Opened => {
                if self.state == ConnectionState::Connecting {
                    info!(connection = %event.connection, "relay connection open");
                    self.transition(ConnectionState::Open);
                }
                None
            }
            TransportEventKind::Frame(text) => self.dispatch(event.connection, &text),
            TransportEventKind::Closed { reason } => {
                info!(connection = %event.connection, reason = ?reason, "relay connection closed");
                self.teardown("closed by remote");
                None
            }
        }
    }

    fn dispatch(&self, connection: ConnectionId, text: &str) -> Option<CursorUpdate> {
        if !self.state.is_open() {
            debug!(connection = %connection, "dropping frame received before open");
            return None;
        }

        match decode(text) {
            Ok(WireMessage::Cursor(update)) => Some(update),
            Ok(WireMessage::Error(relay_error)) => {
                error!(connection = %connection, "relay error: {}", relay_error.message);
                None
            }
            Err(e) => {
                warn!(connection = %connection, error = %e, "dropping undecodable frame");
                None
            }
        }
    }

    /// Releases the live link on every exit path.
    ///
    /// Once `active` is taken, no later event for that connection is
    /// processed.
    fn teardown(&mut self, reason: &str) {
        let Some(ActiveConnection { id, mut link }) = self.active.take() else {
            return;
        };

        let was_open = self.state.is_open();
        self.transition(ConnectionState::Closing);

        if was_open {
            match encode_cursor(&CursorUpdate::hidden(self.local_id.clone())) {
                Ok(frame) => {
                    if let Err(e) = link.send(frame) {
                        debug!(connection = %id, error = %e, "farewell frame not sent");
                    }
                }
                Err(e) => debug!(error = %e, "failed to encode farewell frame"),
            }
        }

        link.close();
        self.transition(ConnectionState::Closed);
        info!(connection = %id, reason, "relay connection released");
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "unexpected connection state transition");
        }

        debug!(from = %self.state, to = %next, "connection state");
        self.state = next;
        self.state_tx.send_replace(next);
    }
}

impl<T: Transport> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        self.teardown("released");
    }
}
