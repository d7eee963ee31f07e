//! Host-facing session.
//!
//! This module contains the runtime settings surface, the `Session` that
//! wires emitter, connection and presence together, and its async run loop.

pub mod client;
pub mod runtime;
pub mod settings;

pub use client::Session;
pub use runtime::Command;
pub use settings::{Settings, SettingsUpdate};
