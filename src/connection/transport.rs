//! The seam between the connection state machine and the actual socket.
//!
//! A `Transport` opens links; a `Link` is the owned handle to one live
//! connection. Everything the socket reports comes back as a
//! `TransportEvent` tagged with the `ConnectionId` it belongs to, so events
//! from a connection that has already been torn down can be recognized and
//! dropped.

use std::fmt;

use crate::error::TransportError;

/// Identifies one connection instance. Never reused within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Everything a transport needs to open a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub connection: ConnectionId,
    /// Full relay URL, channel query included
    pub url: String,
    /// Sub-protocol token authenticating the client
    pub protocol: String,
}

/// Something that can open persistent, message-oriented duplex connections.
pub trait Transport {
    type Link: Link;

    /// Starts opening a connection.
    ///
    /// Must not block: completion is reported later through a
    /// `TransportEventKind::Opened` or `Closed` event.
    fn open(&mut self, request: ConnectRequest) -> Result<Self::Link, TransportError>;
}

/// An owned handle to one connection.
pub trait Link {
    /// Queues a text frame for sending
    fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Closes the connection, flushing frames already queued.
    ///
    /// Consumes the link: nothing can be sent on it afterwards.
    fn close(self);
}

/// Something that happened on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub connection: ConnectionId,
    pub kind: TransportEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// The handshake completed
    Opened,
    /// A text frame arrived
    Frame(String),
    /// The connection failed to open or ended
    Closed { reason: Option<String> },
}

impl TransportEvent {
    pub fn opened(connection: ConnectionId) -> Self {
        Self {
            connection,
            kind: TransportEventKind::Opened,
        }
    }

    pub fn frame(connection: ConnectionId, text: impl Into<String>) -> Self {
        Self {
            connection,
            kind: TransportEventKind::Frame(text.into()),
        }
    }

    pub fn closed(connection: ConnectionId, reason: Option<String>) -> Self {
        Self {
            connection,
            kind: TransportEventKind::Closed { reason },
        }
    }
}
