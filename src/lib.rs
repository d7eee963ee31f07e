//! # cocursor - shared pointer presence
//!
//! A client-side engine that lets several participants see each other's
//! pointer on a shared page in real time, through a relay that fans frames
//! out to everyone on the same channel.
//!
//! ## Features
//!
//! - **Resolution independent**: positions travel as fractions of the document size
//! - **Throttled broadcast**: leading-edge rate limiting selected by quality tier
//! - **Explicit lifecycle**: an owned connection per configuration, torn down on every exit path
//! - **Lossy by design**: malformed or stale frames are dropped, never fatal
//!
//! ## Example
//!
//! ```rust,no_run
//! use cocursor::{ClientConfig, Command, Session, Settings, WsTransport};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() {
//! let (transport, events) = WsTransport::new();
//! let config = ClientConfig::new("api-key")
//!     .with_settings(Settings::default().with_channel("lobby").with_name("Ann"));
//! let session = Session::new(transport, config);
//! let view = session.presence();
//!
//! let (commands, inbox) = mpsc::unbounded_channel::<Command>();
//! tokio::spawn(session.run(events, inbox));
//!
//! println!("{} remote cursors", view.snapshot().visible().count());
//! # drop(commands);
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod emitter;
pub mod error;
pub mod presence;
pub mod protocol;
pub mod session;
pub mod throttle;
pub mod types;

pub use config::ClientConfig;
pub use connection::{
    ConnectionConfig, ConnectionId, ConnectionManager, ConnectionState, Link, LinkTasks,
    Transport, TransportEvent, TransportEventKind, WsTransport,
};
pub use emitter::LocalEmitter;
pub use error::{ConfigError, ProtocolError, TransportError};
pub use presence::{PresenceSnapshot, PresenceStore, PresenceView};
pub use protocol::{CursorUpdate, ErrorMessage, WireMessage};
pub use session::{Command, Session, Settings, SettingsUpdate};
pub use throttle::ThrottleScheduler;
pub use types::{LocalCursor, ParticipantId, PointerSample, QualityTier};
