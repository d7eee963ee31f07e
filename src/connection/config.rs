//! Connection parameters and endpoint construction.

/// Relay endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8080";

/// The parameters that identify one relay connection.
///
/// Changing any of them invalidates the live connection and forces a full
/// reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionConfig {
    /// Fan-out scope on the relay; `None` means the default channel
    pub channel: Option<String>,
    /// Sent as the WebSocket sub-protocol token
    pub credential: String,
    /// When set, no connection is held at all
    pub disabled: bool,
}

impl ConnectionConfig {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            channel: None,
            credential: credential.into(),
            disabled: false,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Builds the relay URL, scoping it to the channel when one is set.
    ///
    /// An empty channel is treated like no channel.
    pub fn request_url(&self, endpoint: &str) -> String {
        match self.effective_channel() {
            Some(channel) => {
                let separator = if endpoint.contains('?') { '&' } else { '?' };
                let encoded: String = form_urlencoded::byte_serialize(channel.as_bytes()).collect();
                format!("{endpoint}{separator}channel={encoded}")
            }
            None => endpoint.to_string(),
        }
    }

    /// Gets the channel the relay is scoped to, an empty name counting as none
    pub fn effective_channel(&self) -> Option<&str> {
        self.channel.as_deref().filter(|channel| !channel.is_empty())
    }

    /// Whether moving to `next` requires tearing down the live connection
    pub fn requires_reconnect(&self, next: &ConnectionConfig) -> bool {
        self.effective_channel() != next.effective_channel()
            || self.credential != next.credential
            || self.disabled != next.disabled
    }
}
