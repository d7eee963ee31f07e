//! Relay connection management.
//!
//! This module contains the connection lifecycle state machine, the transport
//! seam it drives, and the WebSocket transport used in production.

pub mod config;
pub mod manager;
pub mod state;
pub mod transport;
pub mod websocket;

pub use config::{ConnectionConfig, DEFAULT_ENDPOINT};
pub use manager::ConnectionManager;
pub use state::ConnectionState;
pub use transport::{
    ConnectRequest, ConnectionId, Link, Transport, TransportEvent, TransportEventKind,
};
pub use websocket::{LinkTasks, WsLink, WsTransport};
