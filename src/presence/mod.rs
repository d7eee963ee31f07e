//! Remote presence.
//!
//! This module contains the reconciled store of remote cursors and the
//! snapshot view handed to the render layer.

pub mod store;
pub mod view;

pub use store::{PresenceStore, RemoteCursor};
pub use view::{PresenceSnapshot, PresenceView};

pub(crate) use view::PresenceHub;
