//! Render boundary for the presence store.
//!
//! The session mutates presence through a `PresenceHub`; the render side
//! holds any number of `PresenceView`s. The state sits behind a
//! `parking_lot::RwLock` so views can be read from another thread, and every
//! mutation bumps a `watch` revision so renderers know when to redraw.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::presence::store::PresenceStore;
use crate::protocol::CursorUpdate;
use crate::types::{LocalCursor, ParticipantId};

/// What the render layer draws at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresenceSnapshot {
    /// Every known remote cursor, including hidden ones
    pub remote: HashMap<ParticipantId, CursorUpdate>,
    /// The local pointer, when the show-my-cursor overlay is on
    pub local: Option<LocalCursor>,
}

impl PresenceSnapshot {
    /// Remote cursors that should actually be drawn
    pub fn visible(&self) -> impl Iterator<Item = &CursorUpdate> {
        self.remote.values().filter(|update| update.is_renderable())
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&CursorUpdate> {
        self.remote.get(id)
    }
}

#[derive(Debug, Default)]
struct RenderState {
    store: PresenceStore,
    local: Option<LocalCursor>,
    show_local: bool,
    /// Set while the session is disabled: nothing is drawn
    hidden: bool,
}

impl RenderState {
    fn snapshot(&self) -> PresenceSnapshot {
        if self.hidden {
            return PresenceSnapshot::default();
        }

        PresenceSnapshot {
            remote: self.store.snapshot(),
            local: self.local.clone().filter(|_| self.show_local),
        }
    }
}

/// Read-only handle given to the render layer.
#[derive(Debug, Clone)]
pub struct PresenceView {
    state: Arc<RwLock<RenderState>>,
    revision: watch::Receiver<u64>,
}

impl PresenceView {
    pub fn snapshot(&self) -> PresenceSnapshot {
        self.state.read().snapshot()
    }

    /// Number of mutations published so far
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Waits for the next mutation. Returns `false` once the session is gone.
    pub async fn changed(&mut self) -> bool {
        self.revision.changed().await.is_ok()
    }
}

/// Write side of the presence state, owned by the session.
#[derive(Debug)]
pub(crate) struct PresenceHub {
    state: Arc<RwLock<RenderState>>,
    revision: watch::Sender<u64>,
}

impl PresenceHub {
    pub(crate) fn new(show_local: bool, hidden: bool) -> Self {
        let state = RenderState {
            show_local,
            hidden,
            ..RenderState::default()
        };
        let (revision, _) = watch::channel(0);

        PresenceHub {
            state: Arc::new(RwLock::new(state)),
            revision,
        }
    }

    pub(crate) fn view(&self) -> PresenceView {
        PresenceView {
            state: Arc::clone(&self.state),
            revision: self.revision.subscribe(),
        }
    }

    pub(crate) fn snapshot(&self) -> PresenceSnapshot {
        self.state.read().snapshot()
    }

    pub(crate) fn apply(&self, update: CursorUpdate, now: Instant) {
        self.state.write().store.upsert(update, now);
        self.publish();
    }

    pub(crate) fn set_local(&self, local: Option<LocalCursor>) {
        let show_local = {
            let mut state = self.state.write();
            if state.local == local {
                return;
            }
            state.local = local;
            state.show_local
        };
        if show_local {
            self.publish();
        }
    }

    pub(crate) fn set_show_local(&self, show_local: bool) {
        self.state.write().show_local = show_local;
        self.publish();
    }

    pub(crate) fn set_hidden(&self, hidden: bool) {
        self.state.write().hidden = hidden;
        self.publish();
    }

    pub(crate) fn evict_idle(&self, now: Instant, ttl: Duration) -> Vec<ParticipantId> {
        let evicted = self.state.write().store.evict_idle(now, ttl);
        if !evicted.is_empty() {
            self.publish();
        }
        evicted
    }

    fn publish(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
