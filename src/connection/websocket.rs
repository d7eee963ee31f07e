//! WebSocket transport built on tokio-tungstenite.
//!
//! Each opened link is driven by its own tokio task that owns the socket.
//! The link keeps the sending half of the outbound queue; dropping or closing
//! it lets the task flush what is queued, send a close frame and exit. All
//! socket activity comes back on one event channel shared by every link of
//! the transport.
//!
//! Link tasks are tracked so a host can wait for them with `LinkTasks::drain`
//! before its runtime goes away. Otherwise the farewell frame queued on
//! teardown may never reach the socket.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::connection::transport::{
    ConnectRequest, ConnectionId, Link, Transport, TransportEvent,
};
use crate::error::TransportError;

/// Opens relay connections over WebSocket.
pub struct WsTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    tasks: TaskTracker,
}

/// Handle onto every connection task a `WsTransport` has spawned.
#[derive(Debug, Clone)]
pub struct LinkTasks {
    tracker: TaskTracker,
}

/// Owned handle to one WebSocket connection task.
pub struct WsLink {
    connection: ConnectionId,
    outbound: mpsc::UnboundedSender<Message>,
}

impl WsTransport {
    /// Creates a transport and the receiver its events are delivered on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let transport = WsTransport {
            events,
            tasks: TaskTracker::new(),
        };
        (transport, rx)
    }

    /// Gets a handle for waiting on this transport's connection tasks
    pub fn link_tasks(&self) -> LinkTasks {
        LinkTasks {
            tracker: self.tasks.clone(),
        }
    }
}

impl LinkTasks {
    /// Number of connection tasks still running
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Waits until every released link has flushed its queue and closed.
    ///
    /// Call after the session is gone. A link still held by a live session
    /// keeps this pending.
    pub async fn drain(self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Transport for WsTransport {
    type Link = WsLink;

    fn open(&mut self, request: ConnectRequest) -> Result<WsLink, TransportError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        let client_request = build_request(&request)?;

        let (outbound, queue) = mpsc::unbounded_channel();
        let connection = request.connection;
        self.tasks.spawn_on(
            drive_connection(connection, client_request, queue, self.events.clone()),
            &handle,
        );

        Ok(WsLink {
            connection,
            outbound,
        })
    }
}

impl Link for WsLink {
    fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.outbound
            .send(Message::Text(frame))
            .map_err(|_| TransportError::Closed)
    }

    fn close(self) {
        let WsLink {
            connection,
            outbound,
        } = self;
        debug!(connection = %connection, "closing websocket link");
        // The task sees the queue end once what was sent before is drained,
        // then sends the close frame
        drop(outbound);
    }
}

/// Builds the handshake request, carrying the credential as sub-protocol.
fn build_request(request: &ConnectRequest) -> Result<Request, TransportError> {
    let mut client_request = request
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

    if !request.protocol.is_empty() {
        let protocol = HeaderValue::from_str(&request.protocol)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        client_request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, protocol);
    }

    Ok(client_request)
}

/// Runs one connection until either side closes it
async fn drive_connection(
    connection: ConnectionId,
    request: Request,
    mut queue: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let _ = events.send(TransportEvent::closed(connection, Some(e.to_string())));
            return;
        }
    };

    if events.send(TransportEvent::opened(connection)).is_err() {
        return;
    }

    let (mut sink, mut source) = stream.split();
    let reason = loop {
        tokio::select! {
            outbound = queue.recv() => match outbound {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        break Some(e.to_string());
                    }
                }
                None => {
                    // Link released: queued frames are flushed, say goodbye
                    if let Err(e) = sink.close().await {
                        debug!(connection = %connection, error = %e, "close handshake failed");
                    }
                    break None;
                }
            },
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    // With the session gone nobody reads inbound frames, but
                    // the outbound queue still has to be flushed
                    let _ = events.send(TransportEvent::frame(connection, text));
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.to_string());
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite; binary is not part of the protocol
                }
                Some(Err(e)) => {
                    warn!(connection = %connection, error = %e, "websocket error");
                    break Some(e.to_string());
                }
                None => break None,
            },
        }
    };

    let _ = events.send(TransportEvent::closed(connection, reason));
}
