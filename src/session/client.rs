//! The cursor-sharing session.
//!
//! A `Session` wires the engine together for one mounted host page:
//! pointer samples go through the `LocalEmitter` to the `ConnectionManager`,
//! decoded inbound cursors go into the presence store, and settings changes
//! are turned into the matching reconnects and hide frames. All methods are
//! synchronous and meant to be called from a single event loop.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::connection::{ConnectionConfig, ConnectionManager, ConnectionState, Transport, TransportEvent};
use crate::emitter::LocalEmitter;
use crate::presence::{PresenceHub, PresenceSnapshot, PresenceView};
use crate::session::settings::{Settings, SettingsUpdate};
use crate::types::{LocalCursor, ParticipantId, PointerSample};

/// One participant's live cursor-sharing session.
///
/// Dropping the session is the unmount: the connection is torn down and a
/// final hide frame is sent if it was open.
pub struct Session<T: Transport> {
    settings: Settings,
    emitter: LocalEmitter,
    presence: PresenceHub,
    stale_after: Option<Duration>,
    connection: ConnectionManager<T>,
}

impl<T: Transport> Session<T> {
    /// Starts a session with a freshly generated identity and connects.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_identity(transport, config, ParticipantId::generate())
    }

    /// Starts a session with a given identity and connects.
    pub fn with_identity(transport: T, config: ClientConfig, id: ParticipantId) -> Self {
        let ClientConfig {
            endpoint,
            credential,
            settings,
            stale_after,
        } = config;

        let connection_config = ConnectionConfig {
            channel: settings.channel.clone(),
            credential,
            disabled: settings.disabled,
        };
        let emitter = LocalEmitter::new(
            id.clone(),
            settings.name.clone(),
            settings.sharing,
            settings.quality,
        );
        let presence = PresenceHub::new(settings.show_local_cursor, settings.disabled);
        let connection = ConnectionManager::new(transport, endpoint, id, connection_config);

        let mut session = Session {
            settings,
            emitter,
            presence,
            stale_after,
            connection,
        };

        info!(participant = %session.local_id(), "cursor session started");
        session.connection.connect();
        session
    }

    pub fn local_id(&self) -> &ParticipantId {
        self.emitter.id()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.connection
    }

    /// Gets a render-side handle onto the presence state
    pub fn presence(&self) -> PresenceView {
        self.presence.view()
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        self.presence.snapshot()
    }

    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after
    }

    /// Handles a local pointer movement observed at `now`.
    ///
    /// Samples that arrive while the connection is not open are not
    /// broadcast and do not consume a throttle window.
    pub fn pointer_moved(&mut self, sample: PointerSample, now: Instant) {
        if self.settings.disabled {
            return;
        }

        self.presence.set_local(Some(LocalCursor {
            x: sample.client_x,
            y: sample.client_y,
            name: self.emitter.display_name().to_string(),
        }));

        if !self.connection.state().is_open() {
            return;
        }
        if let Some(update) = self.emitter.pointer_moved(&sample, now) {
            self.connection.send(&update);
        }
    }

    /// The pointer left the viewport
    pub fn pointer_left(&mut self) {
        if self.settings.disabled {
            return;
        }

        self.presence.set_local(None);
        let hide = self.emitter.pointer_left();
        self.connection.send(&hide);
    }

    /// Applies a runtime settings change.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if !self.settings.apply(update.clone()) {
            return;
        }
        debug!(?update, "session settings changed");

        match update {
            SettingsUpdate::Channel(_) => {
                self.emitter.reset_throttle();
                self.reconfigure_connection();
            }
            SettingsUpdate::Disabled(disabled) => {
                if disabled {
                    self.presence.set_local(None);
                }
                self.presence.set_hidden(disabled);
                self.emitter.reset_throttle();
                self.reconfigure_connection();
            }
            SettingsUpdate::Name(name) => self.emitter.set_name(name),
            SettingsUpdate::Sharing(enabled) => {
                if let Some(hide) = self.emitter.set_sharing(enabled) {
                    self.connection.send(&hide);
                }
            }
            SettingsUpdate::Quality(quality) => self.emitter.set_quality(quality),
            SettingsUpdate::ShowLocalCursor(show) => self.presence.set_show_local(show),
        }
    }

    /// Feeds one transport event through the connection into presence
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        if let Some(update) = self.connection.handle_event(event) {
            // Tokio's clock, so last-seen times follow a paused runtime
            self.presence.apply(update, tokio::time::Instant::now().into_std());
        }
    }

    /// Reconnects after the connection was lost. There is no automatic retry.
    pub fn reopen(&mut self) {
        self.connection.reopen();
    }

    /// Tears the connection down while keeping the session around
    pub fn disconnect(&mut self) {
        self.presence.set_local(None);
        self.connection.disconnect();
    }

    /// Drops remote cursors idle longer than the configured window.
    ///
    /// Returns how many were evicted; always zero when eviction is off.
    pub fn evict_stale(&mut self, now: Instant) -> usize {
        let Some(ttl) = self.stale_after else {
            return 0;
        };

        let evicted = self.presence.evict_idle(now, ttl);
        if !evicted.is_empty() {
            info!(count = evicted.len(), "evicted idle remote cursors");
        }
        evicted.len()
    }

    fn reconfigure_connection(&mut self) {
        let config = ConnectionConfig {
            channel: self.settings.channel.clone(),
            credential: self.connection.config().credential.clone(),
            disabled: self.settings.disabled,
        };
        self.connection.reconfigure(config);
    }
}
