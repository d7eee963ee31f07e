//! Integration tests for the cursor session.
//!
//! These drive a full `Session` against an in-memory transport that records
//! every opened connection, sent frame and close, and check the observable
//! behavior across settings changes, reconnects and inbound traffic.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use cocursor::protocol::decode;
use cocursor::{
    ClientConfig, Command, ConnectionId, ConnectionState, CursorUpdate, Link, ParticipantId,
    PointerSample, QualityTier, Session, Settings, SettingsUpdate, Transport, TransportError,
    TransportEvent, WireMessage,
};
use tokio::sync::mpsc;

#[derive(Default)]
struct Wire {
    opened: Vec<(ConnectionId, String, String)>,
    sent: Vec<(ConnectionId, String)>,
    closed: Vec<ConnectionId>,
}

impl Wire {
    /// Decoded cursor frames sent on one connection
    fn cursors_on(&self, connection: ConnectionId) -> Vec<CursorUpdate> {
        self.sent
            .iter()
            .filter(|(id, _)| *id == connection)
            .map(|(_, frame)| match decode(frame).unwrap() {
                WireMessage::Cursor(update) => update,
                other => panic!("unexpected outbound frame {other:?}"),
            })
            .collect()
    }

    fn all_cursors(&self) -> Vec<CursorUpdate> {
        self.sent
            .iter()
            .map(|(_, frame)| match decode(frame).unwrap() {
                WireMessage::Cursor(update) => update,
                other => panic!("unexpected outbound frame {other:?}"),
            })
            .collect()
    }
}

struct RecordingTransport {
    wire: Rc<RefCell<Wire>>,
}

struct RecordingLink {
    id: ConnectionId,
    wire: Rc<RefCell<Wire>>,
}

impl Transport for RecordingTransport {
    type Link = RecordingLink;

    fn open(&mut self, request: cocursor::connection::ConnectRequest) -> Result<RecordingLink, TransportError> {
        self.wire
            .borrow_mut()
            .opened
            .push((request.connection, request.url, request.protocol));
        Ok(RecordingLink {
            id: request.connection,
            wire: Rc::clone(&self.wire),
        })
    }
}

impl Link for RecordingLink {
    fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.wire.borrow_mut().sent.push((self.id, frame));
        Ok(())
    }

    fn close(self) {
        self.wire.borrow_mut().closed.push(self.id);
    }
}

const ME: &str = "user-me";

fn start(settings: Settings) -> (Session<RecordingTransport>, Rc<RefCell<Wire>>) {
    let wire = Rc::new(RefCell::new(Wire::default()));
    let transport = RecordingTransport {
        wire: Rc::clone(&wire),
    };
    let config = ClientConfig::new("secret")
        .with_endpoint("ws://relay.test")
        .with_settings(settings);
    let session = Session::with_identity(transport, config, ParticipantId::from(ME));
    (session, wire)
}

/// Completes the handshake of the most recently opened connection
fn open_latest(session: &mut Session<RecordingTransport>, wire: &Rc<RefCell<Wire>>) -> ConnectionId {
    let id = wire.borrow().opened.last().unwrap().0;
    session.handle_transport_event(TransportEvent::opened(id));
    assert_eq!(session.connection_state(), ConnectionState::Open);
    id
}

fn sample(x: f64, y: f64) -> PointerSample {
    PointerSample::new(x * 1000.0, y * 1000.0, 1000.0, 1000.0)
}

#[test]
fn test_session_connects_with_channel_and_credential() {
    let (session, wire) = start(Settings::default().with_channel("lobby"));

    assert_eq!(session.connection_state(), ConnectionState::Connecting);
    let wire = wire.borrow();
    assert_eq!(wire.opened.len(), 1);
    assert_eq!(wire.opened[0].1, "ws://relay.test?channel=lobby");
    assert_eq!(wire.opened[0].2, "secret");
}

#[test]
fn test_movement_is_broadcast_when_open() {
    let (mut session, wire) = start(Settings::default().with_name("Ann"));
    let now = Instant::now();

    // Not open yet: dropped
    session.pointer_moved(sample(0.1, 0.1), now);
    assert!(wire.borrow().sent.is_empty());

    let id = open_latest(&mut session, &wire);
    session.pointer_moved(sample(0.25, 0.75), now);

    let sent = wire.borrow().cursors_on(id);
    assert_eq!(
        sent,
        vec![CursorUpdate::shown(ME.into(), 0.25, 0.75, "Ann")]
    );
}

#[test]
fn test_anonymous_name_on_the_wire() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);

    session.pointer_moved(sample(0.5, 0.5), Instant::now());
    assert_eq!(
        wire.borrow().cursors_on(id)[0].name.as_deref(),
        Some("anonymous")
    );
}

#[test]
fn test_low_quality_scenario() {
    let (mut session, wire) = start(Settings::default().with_quality(QualityTier::Low));
    let id = open_latest(&mut session, &wire);
    let start = Instant::now();

    session.pointer_moved(sample(0.1, 0.1), start);
    session.pointer_moved(sample(0.2, 0.2), start + Duration::from_millis(5));
    session.pointer_moved(sample(0.3, 0.3), start + Duration::from_millis(35));

    let positions: Vec<_> = wire
        .borrow()
        .cursors_on(id)
        .iter()
        .map(|u| u.position().unwrap())
        .collect();
    assert_eq!(positions, vec![(0.1, 0.1), (0.3, 0.3)]);
}

#[test]
fn test_high_quality_emits_every_event() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);
    let now = Instant::now();

    for i in 0..50 {
        session.pointer_moved(sample(i as f64 / 100.0, 0.5), now);
    }
    assert_eq!(wire.borrow().cursors_on(id).len(), 50);
}

#[test]
fn test_quality_change_applies_immediately() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);
    let start = Instant::now();

    session.apply(SettingsUpdate::Quality(QualityTier::Middle));
    session.pointer_moved(sample(0.1, 0.1), start);
    session.pointer_moved(sample(0.2, 0.2), start + Duration::from_millis(3));
    session.pointer_moved(sample(0.3, 0.3), start + Duration::from_millis(12));

    assert_eq!(wire.borrow().cursors_on(id).len(), 2);
}

#[test]
fn test_disabling_sharing_sends_one_hide_before_next_position() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);
    let now = Instant::now();

    session.pointer_moved(sample(0.1, 0.1), now);
    session.apply(SettingsUpdate::Sharing(false));
    session.apply(SettingsUpdate::Sharing(false));
    session.pointer_moved(sample(0.2, 0.2), now);
    session.pointer_moved(sample(0.3, 0.3), now);

    // Re-enabling does not resume on its own
    session.apply(SettingsUpdate::Sharing(true));
    assert_eq!(wire.borrow().cursors_on(id).len(), 2);

    session.pointer_moved(sample(0.4, 0.4), now);
    let sent = wire.borrow().cursors_on(id);
    let visibility: Vec<bool> = sent.iter().map(|u| u.visible).collect();
    assert_eq!(visibility, vec![true, false, true]);
    assert_eq!(sent[1], CursorUpdate::hidden(ME.into()));
    assert_eq!(sent[2].position(), Some((0.4, 0.4)));
}

#[test]
fn test_pointer_leave_is_sent_immediately() {
    let (mut session, wire) = start(Settings::default().with_quality(QualityTier::Low));
    let id = open_latest(&mut session, &wire);
    let now = Instant::now();

    session.pointer_moved(sample(0.1, 0.1), now);
    session.pointer_left();

    let sent = wire.borrow().cursors_on(id);
    assert_eq!(sent.len(), 2);
    assert!(!sent[1].visible);
}

#[test]
fn test_channel_change_tears_down_and_reconnects() {
    let (mut session, wire) = start(Settings::default().with_channel("a"));
    let old = open_latest(&mut session, &wire);

    session.apply(SettingsUpdate::Channel(Some("b".to_string())));

    {
        let wire = wire.borrow();
        assert_eq!(wire.cursors_on(old), vec![CursorUpdate::hidden(ME.into())]);
        assert_eq!(wire.closed, vec![old]);
        assert_eq!(wire.opened.len(), 2);
        assert_eq!(wire.opened[1].1, "ws://relay.test?channel=b");
    }
    assert_eq!(session.connection_state(), ConnectionState::Connecting);

    // Late traffic from the old connection is ignored
    session.handle_transport_event(TransportEvent::frame(
        old,
        r#"{"type":"cursor","id":"peer","x":0.5,"y":0.5,"visible":true,"name":"P"}"#,
    ));
    session.handle_transport_event(TransportEvent::closed(old, None));
    assert!(session.snapshot().remote.is_empty());
    assert_eq!(session.connection_state(), ConnectionState::Connecting);

    let new = open_latest(&mut session, &wire);
    assert_ne!(old, new);
    session.handle_transport_event(TransportEvent::frame(
        new,
        r#"{"type":"cursor","id":"peer","x":0.5,"y":0.5,"visible":true,"name":"P"}"#,
    ));
    assert_eq!(session.snapshot().visible().count(), 1);
}

#[test]
fn test_clearing_channel_reconnects_to_default() {
    let (mut session, wire) = start(Settings::default().with_channel("a"));
    open_latest(&mut session, &wire);

    session.apply(SettingsUpdate::Channel(None));
    assert_eq!(wire.borrow().opened[1].1, "ws://relay.test");
}

#[test]
fn test_empty_channel_keeps_default_connection() {
    let (mut session, wire) = start(Settings::default());
    let first = open_latest(&mut session, &wire);

    session.apply(SettingsUpdate::Channel(Some(String::new())));

    assert_eq!(wire.borrow().opened.len(), 1);
    assert!(wire.borrow().closed.is_empty());
    assert_eq!(session.connection().connection_id(), Some(first));
    assert_eq!(session.connection_state(), ConnectionState::Open);
}

#[test]
fn test_disable_and_enable() {
    let (mut session, wire) = start(Settings::default());
    let first = open_latest(&mut session, &wire);
    session.handle_transport_event(TransportEvent::frame(
        first,
        r#"{"type":"cursor","id":"peer","x":0.5,"y":0.5,"visible":true}"#,
    ));
    assert_eq!(session.snapshot().visible().count(), 1);

    session.apply(SettingsUpdate::Disabled(true));
    assert_eq!(session.connection_state(), ConnectionState::Idle);
    assert_eq!(wire.borrow().closed, vec![first]);
    assert_eq!(
        wire.borrow().cursors_on(first),
        vec![CursorUpdate::hidden(ME.into())]
    );
    // Nothing is drawn and nothing is sampled while disabled
    assert!(session.snapshot().remote.is_empty());
    session.pointer_moved(sample(0.1, 0.1), Instant::now());
    session.pointer_left();
    assert_eq!(wire.borrow().sent.len(), 1);

    session.apply(SettingsUpdate::Disabled(false));
    assert_eq!(session.connection_state(), ConnectionState::Connecting);
    assert_eq!(wire.borrow().opened.len(), 2);
    // The store kept the peer across the disabled period
    assert_eq!(session.snapshot().visible().count(), 1);
}

#[test]
fn test_starting_disabled_opens_nothing() {
    let (mut session, wire) = start(Settings::default().with_disabled(true));

    assert_eq!(session.connection_state(), ConnectionState::Idle);
    assert!(wire.borrow().opened.is_empty());

    session.apply(SettingsUpdate::Disabled(false));
    assert_eq!(wire.borrow().opened.len(), 1);
}

#[test]
fn test_remote_update_then_hide() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);

    session.handle_transport_event(TransportEvent::frame(
        id,
        r#"{"type":"cursor","id":"user-abc","x":0.5,"y":0.5,"visible":true,"name":"Ann"}"#,
    ));
    session.handle_transport_event(TransportEvent::frame(
        id,
        r#"{"type":"cursor","id":"user-abc","visible":false}"#,
    ));

    let snapshot = session.snapshot();
    let stored = snapshot.get(&"user-abc".into()).unwrap();
    assert!(!stored.visible);
    assert_eq!(snapshot.visible().count(), 0);
}

#[test]
fn test_last_write_wins_and_replay_is_idempotent() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);

    let frames = [
        r#"{"type":"cursor","id":"p","x":0.1,"y":0.1,"visible":true,"name":"P"}"#,
        r#"{"type":"cursor","id":"p","x":0.2,"y":0.2,"visible":true,"name":"P"}"#,
        r#"{"type":"cursor","id":"p","x":0.3,"y":0.4,"visible":true,"name":"Q"}"#,
    ];
    for frame in frames {
        session.handle_transport_event(TransportEvent::frame(id, frame));
    }
    let after = session.snapshot();
    assert_eq!(
        after.get(&"p".into()),
        Some(&CursorUpdate::shown("p".into(), 0.3, 0.4, "Q"))
    );

    session.handle_transport_event(TransportEvent::frame(id, frames[2]));
    assert_eq!(session.snapshot(), after);
}

#[test]
fn test_bad_frames_do_not_touch_presence() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);
    let view = session.presence();

    for frame in [
        r#"{"type":"selection","id":"p","x":0.1,"y":0.1,"visible":true}"#,
        r#"{"type":"error","message":"rate limited"}"#,
        r#"{"id":"p","visible":false}"#,
        "\u{0}garbage",
    ] {
        session.handle_transport_event(TransportEvent::frame(id, frame));
    }

    assert!(session.snapshot().remote.is_empty());
    assert_eq!(view.revision(), 0);
    assert_eq!(session.connection_state(), ConnectionState::Open);
}

#[test]
fn test_unexpected_close_has_no_retry() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);

    session.handle_transport_event(TransportEvent::closed(id, Some("relay restarted".to_string())));
    assert_eq!(session.connection_state(), ConnectionState::Closed);
    assert_eq!(wire.borrow().opened.len(), 1);

    session.pointer_moved(sample(0.1, 0.1), Instant::now());
    session.reopen();
    assert_eq!(wire.borrow().opened.len(), 2);
    assert_eq!(session.connection_state(), ConnectionState::Connecting);
}

#[test]
fn test_failed_handshake_closes() {
    let (mut session, wire) = start(Settings::default());
    let id = wire.borrow().opened[0].0;

    session.handle_transport_event(TransportEvent::closed(id, Some("401".to_string())));
    assert_eq!(session.connection_state(), ConnectionState::Closed);
    assert!(wire.borrow().sent.is_empty());
}

#[test]
fn test_drop_is_unmount() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);
    drop(session);

    let wire = wire.borrow();
    assert_eq!(wire.all_cursors(), vec![CursorUpdate::hidden(ME.into())]);
    assert_eq!(wire.closed, vec![id]);
}

#[test]
fn test_local_cursor_overlay() {
    let (mut session, wire) = start(Settings::default().with_name("Ann"));
    open_latest(&mut session, &wire);

    session.pointer_moved(sample(0.1, 0.2).with_client(40.0, 50.0), Instant::now());
    assert!(session.snapshot().local.is_none());

    session.apply(SettingsUpdate::ShowLocalCursor(true));
    let local = session.snapshot().local.unwrap();
    assert_eq!((local.x, local.y), (40.0, 50.0));
    assert_eq!(local.name, "Ann");

    session.pointer_left();
    assert!(session.snapshot().local.is_none());
}

#[test]
fn test_stale_eviction_is_opt_in() {
    let (mut session, wire) = start(Settings::default());
    let id = open_latest(&mut session, &wire);
    session.handle_transport_event(TransportEvent::frame(
        id,
        r#"{"type":"cursor","id":"ghost","x":0.5,"y":0.5,"visible":true}"#,
    ));

    assert_eq!(session.evict_stale(Instant::now() + Duration::from_secs(3600)), 0);
    assert_eq!(session.snapshot().remote.len(), 1);
}

#[test]
fn test_stale_eviction_removes_idle_peers() {
    let wire = Rc::new(RefCell::new(Wire::default()));
    let transport = RecordingTransport {
        wire: Rc::clone(&wire),
    };
    let config = ClientConfig::new("secret").with_stale_after(Duration::from_secs(30));
    let mut session = Session::with_identity(transport, config, ME.into());
    let id = open_latest(&mut session, &wire);

    session.handle_transport_event(TransportEvent::frame(
        id,
        r#"{"type":"cursor","id":"ghost","x":0.5,"y":0.5,"visible":true}"#,
    ));

    assert_eq!(session.evict_stale(Instant::now()), 0);
    assert_eq!(session.evict_stale(Instant::now() + Duration::from_secs(31)), 1);
    assert!(session.snapshot().remote.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_sweeps_idle_peers() {
    let wire = Rc::new(RefCell::new(Wire::default()));
    let transport = RecordingTransport {
        wire: Rc::clone(&wire),
    };
    let config = ClientConfig::new("secret")
        .with_endpoint("ws://relay.test")
        .with_stale_after(Duration::from_millis(30));
    let session = Session::with_identity(transport, config, ParticipantId::from(ME));
    let view = session.presence();
    let connection = wire.borrow().opened[0].0;

    let (events, events_rx) = mpsc::unbounded_channel();
    let (commands, commands_rx) = mpsc::unbounded_channel();

    let host = async {
        events.send(TransportEvent::opened(connection)).unwrap();
        events
            .send(TransportEvent::frame(
                connection,
                r#"{"type":"cursor","id":"user-peer","x":0.5,"y":0.5,"visible":true,"name":"Peer"}"#,
            ))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(view.snapshot().remote.len(), 1);

        // The peer goes quiet without a hide frame
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(view.snapshot().remote.is_empty());

        commands.send(Command::Shutdown).unwrap();
    };
    tokio::join!(session.run(events_rx, commands_rx), host);
}
