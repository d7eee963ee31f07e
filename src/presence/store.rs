//! Reconciled map of remote cursors.
//!
//! Last decoded write wins per participant: an update fully replaces the
//! stored record, there is no field-level merge. Entries are marked invisible
//! by their owner but never removed by inbound traffic; the only removal is
//! the opt-in idle eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::protocol::CursorUpdate;
use crate::types::ParticipantId;

/// A stored remote cursor and when it was last heard from.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCursor {
    pub update: CursorUpdate,
    pub last_seen: Instant,
}

/// Latest known cursor of every remote participant.
#[derive(Debug, Default, Clone)]
pub struct PresenceStore {
    entries: HashMap<ParticipantId, RemoteCursor>,
}

impl PresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the record for the update's participant.
    ///
    /// Returns `true` when the participant was not known before.
    pub fn upsert(&mut self, update: CursorUpdate, now: Instant) -> bool {
        let id = update.id.clone();
        self.entries
            .insert(
                id,
                RemoteCursor {
                    update,
                    last_seen: now,
                },
            )
            .is_none()
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&CursorUpdate> {
        self.entries.get(id).map(|entry| &entry.update)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &RemoteCursor)> {
        self.entries.iter()
    }

    /// Cursors the render layer should draw
    pub fn visible(&self) -> impl Iterator<Item = &CursorUpdate> {
        self.entries
            .values()
            .map(|entry| &entry.update)
            .filter(|update| update.is_renderable())
    }

    /// Removes entries not updated within `ttl` of `now`.
    ///
    /// Returns the evicted participants.
    pub fn evict_idle(&mut self, now: Instant, ttl: Duration) -> Vec<ParticipantId> {
        let expired: Vec<ParticipantId> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_seen) >= ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.entries.remove(id);
        }
        expired
    }

    /// Copies out the id to update mapping
    pub fn snapshot(&self) -> HashMap<ParticipantId, CursorUpdate> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.update.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(id: &str, x: f64, y: f64) -> CursorUpdate {
        CursorUpdate::shown(id.into(), x, y, id)
    }

    #[test]
    fn test_upsert_inserts_then_replaces() {
        let mut store = PresenceStore::new();
        let now = Instant::now();

        assert!(store.upsert(shown("a", 0.1, 0.1), now));
        assert!(!store.upsert(shown("a", 0.2, 0.3), now));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"a".into()).unwrap().position(), Some((0.2, 0.3)));
    }

    #[test]
    fn test_hidden_update_replaces_whole_record() {
        let mut store = PresenceStore::new();
        let now = Instant::now();

        store.upsert(shown("a", 0.5, 0.5), now);
        store.upsert(CursorUpdate::hidden("a".into()), now);

        let stored = store.get(&"a".into()).unwrap();
        assert!(!stored.visible);
        assert_eq!(stored.x, None);
        assert_eq!(stored.name, None);
        assert_eq!(store.visible().count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_visible_filters_hidden_entries() {
        let mut store = PresenceStore::new();
        let now = Instant::now();

        store.upsert(shown("a", 0.1, 0.1), now);
        store.upsert(shown("b", 0.2, 0.2), now);
        store.upsert(CursorUpdate::hidden("c".into()), now);

        let mut ids: Vec<&str> = store.visible().map(|u| u.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_evict_idle() {
        let mut store = PresenceStore::new();
        let start = Instant::now();

        store.upsert(shown("old", 0.1, 0.1), start);
        store.upsert(shown("fresh", 0.2, 0.2), start + Duration::from_secs(50));

        let evicted = store.evict_idle(start + Duration::from_secs(60), Duration::from_secs(30));
        assert_eq!(evicted, vec![ParticipantId::from("old")]);
        assert!(store.get(&"old".into()).is_none());
        assert!(store.get(&"fresh".into()).is_some());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = PresenceStore::new();
        let now = Instant::now();
        store.upsert(shown("a", 0.1, 0.1), now);

        let snapshot = store.snapshot();
        store.upsert(CursorUpdate::hidden("a".into()), now);

        assert!(snapshot[&ParticipantId::from("a")].visible);
        assert!(!store.get(&"a".into()).unwrap().visible);
    }
}
