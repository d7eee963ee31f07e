//! Participant identifier type.
//!
//! This module contains the ParticipantId newtype which keys every cursor
//! stream, both locally and in the remote presence store.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

const ID_PREFIX: &str = "user-";
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// A per-session identifier for one participant's cursor stream.
///
/// Generated once when a session is created and never persisted: reloading
/// the host produces a new identity. It doubles as the seed for the peer's
/// display color on the render side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Creates an identifier from an existing string
    pub fn new(id: impl Into<String>) -> Self {
        ParticipantId(id.into())
    }

    /// Generates a fresh random identifier of the form `user-xxxxxxxxx`
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        ParticipantId(format!("{ID_PREFIX}{suffix}"))
    }

    /// Gets the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        ParticipantId(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        ParticipantId(id)
    }
}
