//! Event-stream connection to the session backend.
//!
//! One [`Connection`] per participant. The socket is owned by a driver task;
//! handles only see the lifecycle state, a one-slot outbound channel and the
//! inbound event channel returned by [`ConnectionManager::connect`].
//!
//! ```text
//!   send() ─► LatestSlot ─► driver ─► ws sink
//!                           driver ◄─ ws stream ─► mpsc<ConnectionEvent>
//! ```

use crate::assets::INBOUND_CAPACITY;
use crate::utils::net::endpoint::{ConnectionError, Endpoint};
use crate::utils::net::state::ConnectionState;
use crate::utils::slot::LatestSlot;
use crate::utils::sos::SignalOfStop;
use async_tungstenite::tokio::{connect_async, ConnectStream};
use async_tungstenite::tungstenite::Message;
use async_tungstenite::WebSocketStream;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use url::Url;

/// Payload handed to [`Connection::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Binary(Bytes),
    Text(String),
}

impl Outbound {
    pub fn len(&self) -> usize {
        match self {
            Outbound::Binary(b) => b.len(),
            Outbound::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_message(self) -> Message {
        match self {
            Outbound::Binary(b) => Message::binary(b),
            Outbound::Text(t) => Message::text(t),
        }
    }
}

/// Why a connection reached `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The handshake never completed.
    HandshakeFailed(String),
    /// The peer closed the stream.
    Remote,
    /// Transport error after the connection was open.
    Error(String),
    /// Closed from this side.
    Local,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::HandshakeFailed(e) => write!(f, "handshake failed: {}", e),
            CloseReason::Remote => f.write_str("closed by peer"),
            CloseReason::Error(e) => write!(f, "transport error: {}", e),
            CloseReason::Local => f.write_str("closed locally"),
        }
    }
}

/// Lifecycle and inbound traffic of one connection, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    Message(String),
    Closed(CloseReason),
}

/// Result of a send attempt. Sends never block and never fail loudly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Waiting in the outbound slot.
    Queued,
    /// Queued, replacing a message that had not been written yet.
    Superseded,
    /// Dropped because the connection is not open.
    NotOpen,
}

/// Anything frames can be pushed into.
pub trait FrameSink {
    fn is_open(&self) -> bool;
    fn send(&self, message: Outbound) -> SendOutcome;
}

/// Handle to a live connection. Clones share the same socket.
#[derive(Clone)]
pub struct Connection {
    url: Arc<Url>,
    state: Arc<watch::Sender<ConnectionState>>,
    outbound: Arc<LatestSlot<Outbound>>,
    sos: SignalOfStop,
}

impl Connection {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Queues `message` if the connection is open, otherwise drops it.
    pub fn send(&self, message: Outbound) -> SendOutcome {
        if !self.state().is_open() {
            return SendOutcome::NotOpen;
        }
        match self.outbound.put(message) {
            Some(_) => SendOutcome::Superseded,
            None => SendOutcome::Queued,
        }
    }

    /// Moves to `Closed` immediately and stops the driver. Idempotent.
    pub fn close(&self) {
        if advance(&self.state, ConnectionState::Closed) {
            info!("Closing connection to {}", self.url);
        }
        self.sos.cancel();
    }
}

impl FrameSink for Connection {
    fn is_open(&self) -> bool {
        self.state().is_open()
    }

    fn send(&self, message: Outbound) -> SendOutcome {
        Connection::send(self, message)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url.as_str())
            .field("state", &self.state())
            .finish()
    }
}

/// Opens connections. Every connection stops when the manager's signal does.
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    sos: SignalOfStop,
}

impl ConnectionManager {
    pub fn new(sos: SignalOfStop) -> Self {
        Self { sos }
    }

    /// Starts connecting to `endpoint` and returns at once, in `Connecting`.
    ///
    /// There is no reconnection: once the returned connection is `Closed` a
    /// new one has to be requested.
    pub fn connect(&self, endpoint: &Endpoint) -> Result<(Connection, mpsc::Receiver<ConnectionEvent>), ConnectionError> {
        let url = Arc::new(endpoint.url()?);
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let (events_tx, events_rx) = mpsc::channel(INBOUND_CAPACITY);

        let connection = Connection {
            url,
            state: Arc::new(state),
            outbound: Arc::new(LatestSlot::new()),
            sos: self.sos.child(),
        };

        info!("Connecting to {}", connection.url);
        tokio::spawn(drive(connection.clone(), events_tx));

        Ok((connection, events_rx))
    }

    /// Closes every connection opened by this manager.
    pub fn shutdown(&self) {
        self.sos.cancel();
    }
}

/// Applies `next` if it is a legal, non-trivial transition.
fn advance(state: &watch::Sender<ConnectionState>, next: ConnectionState) -> bool {
    state.send_if_modified(|current| {
        if *current != next && current.can_transition_to(&next) {
            *current = next;
            true
        } else {
            false
        }
    })
}

async fn drive(connection: Connection, events: mpsc::Sender<ConnectionEvent>) {
    let Connection {
        url,
        state,
        outbound,
        sos,
    } = connection;

    let reason = match sos.select(connect_async(url.as_str())).await {
        None => CloseReason::Local,
        Some(Err(e)) => {
            error!("Handshake with {} failed: {}", url, e);
            CloseReason::HandshakeFailed(e.to_string())
        }
        Some(Ok((mut ws, _))) => {
            if advance(&state, ConnectionState::Open) {
                info!("Connection to {} open", url);
                let _ = events.send(ConnectionEvent::Opened).await;
                pump(ws, &outbound, &events, &sos).await
            } else {
                let _ = ws.send(Message::Close(None)).await;
                CloseReason::Local
            }
        }
    };

    advance(&state, ConnectionState::Closed);
    match &reason {
        CloseReason::Local => info!("Connection to {} {}", url, reason),
        _ => warn!("Connection to {} {}, not reconnecting", url, reason),
    }
    if events.send(ConnectionEvent::Closed(reason)).await.is_err() {
        debug!("No listener for close of {}", url);
    }
}

async fn pump(
    ws: WebSocketStream<ConnectStream>,
    outbound: &LatestSlot<Outbound>,
    events: &mpsc::Sender<ConnectionEvent>,
    sos: &SignalOfStop,
) -> CloseReason {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            _ = sos.wait_cancellation() => {
                let _ = sink.send(Message::Close(None)).await;
                return CloseReason::Local;
            }
            message = outbound.next() => {
                if let Err(e) = sink.send(message.into_message()).await {
                    return CloseReason::Error(e.to_string());
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if events.send(ConnectionEvent::Message(text.to_string())).await.is_err() {
                        debug!("Inbound listener gone, dropping message");
                    }
                }
                Some(Ok(Message::Close(_))) | None => return CloseReason::Remote,
                Some(Ok(_)) => {}
                Some(Err(e)) => return CloseReason::Error(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::net::endpoint::{ParticipantId, Role};
    use async_tungstenite::tokio::accept_hdr_async;
    use async_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    fn endpoint(port: u16) -> Endpoint {
        Endpoint::new(
            &format!("ws://127.0.0.1:{}/api/v1/ws", port),
            "s1",
            ParticipantId::for_role(Role::Student, "Jane Doe"),
        )
        .unwrap()
    }

    async fn next_event(rx: &mut mpsc::Receiver<ConnectionEvent>) -> ConnectionEvent {
        timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_against_loopback_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (path_tx, path_rx) = oneshot::channel();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let _ = path_tx.send(req.uri().path().to_string());
                Ok(resp)
            };
            let mut ws = accept_hdr_async(tcp, callback).await.unwrap();

            let frame = loop {
                match ws.next().await.unwrap().unwrap() {
                    Message::Binary(b) => break b,
                    _ => continue,
                }
            };
            ws.send(Message::text(r#"{"event":"student_count","data":{"count":3}}"#))
                .await
                .unwrap();
            ws.send(Message::Close(None)).await.unwrap();
            frame
        });

        let manager = ConnectionManager::new(SignalOfStop::new());
        let (conn, mut events) = manager.connect(&endpoint(port)).unwrap();

        assert_eq!(next_event(&mut events).await, ConnectionEvent::Opened);
        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(path_rx.await.unwrap(), "/api/v1/ws/session/s1/student_jane_doe");

        let outcome = conn.send(Outbound::Binary(Bytes::from_static(&[0xFF, 0xD8, 0x01])));
        assert_eq!(outcome, SendOutcome::Queued);

        assert_eq!(
            next_event(&mut events).await,
            ConnectionEvent::Message(r#"{"event":"student_count","data":{"count":3}}"#.to_string())
        );
        assert_eq!(next_event(&mut events).await, ConnectionEvent::Closed(CloseReason::Remote));
        assert_eq!(conn.state(), ConnectionState::Closed);

        let received = server.await.unwrap();
        assert_eq!(&received[..], &[0xFF, 0xD8, 0x01]);

        assert_eq!(conn.send(Outbound::Text("late".into())), SendOutcome::NotOpen);
    }

    #[tokio::test]
    async fn test_failed_handshake_goes_straight_to_closed() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let manager = ConnectionManager::new(SignalOfStop::new());
        let (conn, mut events) = manager.connect(&endpoint(port)).unwrap();
        let mut states = conn.subscribe_state();

        match next_event(&mut events).await {
            ConnectionEvent::Closed(CloseReason::HandshakeFailed(_)) => {}
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(*states.borrow_and_update(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_send_is_dropped_until_open_and_close_is_immediate() {
        // Accepts TCP but never answers the handshake.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _hold = tokio::spawn(async move {
            let (_tcp, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let manager = ConnectionManager::new(SignalOfStop::new());
        let (conn, mut events) = manager.connect(&endpoint(port)).unwrap();

        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(!FrameSink::is_open(&conn));
        assert_eq!(conn.send(Outbound::Binary(Bytes::from_static(b"x"))), SendOutcome::NotOpen);

        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(next_event(&mut events).await, ConnectionEvent::Closed(CloseReason::Local));

        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_manager_shutdown_closes_its_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _hold = tokio::spawn(async move {
            let (_tcp, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let manager = ConnectionManager::new(SignalOfStop::new());
        let (conn, mut events) = manager.connect(&endpoint(port)).unwrap();
        manager.shutdown();

        assert_eq!(next_event(&mut events).await, ConnectionEvent::Closed(CloseReason::Local));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_rejects_non_websocket_base() {
        let err = Endpoint::new("http://localhost:8000", "s1", ParticipantId::teacher_dashboard()).unwrap_err();
        assert!(matches!(err, ConnectionError::Scheme(_)));
    }
}
