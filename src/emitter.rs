//! Local pointer sampling.
//!
//! The `LocalEmitter` turns raw pointer samples into outbound cursor updates:
//! it normalizes the position to document fractions, stamps the local
//! identity and display name, and runs the result through the throttle.

use std::time::Instant;

use tracing::debug;

use crate::protocol::CursorUpdate;
use crate::throttle::ThrottleScheduler;
use crate::types::{ParticipantId, PointerSample, QualityTier};

/// Display name used when none is set
pub const ANONYMOUS: &str = "anonymous";

/// Produces the local participant's outbound cursor updates.
#[derive(Debug)]
pub struct LocalEmitter {
    id: ParticipantId,
    name: Option<String>,
    sharing: bool,
    throttle: ThrottleScheduler,
}

impl LocalEmitter {
    pub fn new(id: ParticipantId, name: Option<String>, sharing: bool, quality: QualityTier) -> Self {
        LocalEmitter {
            id,
            name,
            sharing,
            throttle: ThrottleScheduler::for_quality(quality),
        }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    /// Gets the name peers see, falling back to `anonymous`
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS)
    }

    pub fn is_sharing(&self) -> bool {
        self.sharing
    }

    /// Handles a pointer movement observed at `now`.
    ///
    /// Returns the update to send, or `None` when sharing is off, the sample
    /// cannot be normalized, or the throttle suppresses it.
    pub fn pointer_moved(&mut self, sample: &PointerSample, now: Instant) -> Option<CursorUpdate> {
        if !self.sharing {
            return None;
        }

        let Some((x, y)) = sample.normalized() else {
            debug!(?sample, "skipping pointer sample without a usable document size");
            return None;
        };

        if !self.throttle.try_acquire(now) {
            return None;
        }

        Some(CursorUpdate::shown(
            self.id.clone(),
            x,
            y,
            self.display_name(),
        ))
    }

    /// The pointer left the viewport: hide the cursor right away, unthrottled.
    pub fn pointer_left(&self) -> CursorUpdate {
        CursorUpdate::hidden(self.id.clone())
    }

    /// Turns sharing on or off.
    ///
    /// Turning it off yields one hide update. Turning it back on sends
    /// nothing; the next movement resumes the stream.
    pub fn set_sharing(&mut self, enabled: bool) -> Option<CursorUpdate> {
        let was_sharing = self.sharing;
        self.sharing = enabled;

        (was_sharing && !enabled).then(|| CursorUpdate::hidden(self.id.clone()))
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_quality(&mut self, quality: QualityTier) {
        self.throttle.set_interval(quality.interval());
    }

    /// Lets the next movement through regardless of the current window
    pub fn reset_throttle(&mut self) {
        self.throttle.reset();
    }
}
