//! Relay wire protocol.
//!
//! This module defines the two message shapes exchanged with the relay and
//! their JSON codec.

pub mod codec;
pub mod message;

pub use codec::{decode, encode, encode_cursor};
pub use message::{CursorUpdate, ErrorMessage, WireMessage};
