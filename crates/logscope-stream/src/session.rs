use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use logscope_types::LogEvent;

use crate::buffer::EventBuffer;

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(15);

/// Errors surfaced by a push transport
#[derive(Debug, Error)]
pub enum PushError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("push channel error: {0}")]
    Channel(String),

    #[error("malformed push payload: {0}")]
    Decode(String),
}

/// Stream of decoded log events from one push-channel connection
pub type EventStream = BoxStream<'static, Result<LogEvent, PushError>>;

/// Seam for the push channel, so sessions can be driven by a real
/// WebSocket connection or a stub in tests.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Establish one connection and return its event stream
    async fn connect(&self) -> Result<EventStream, PushError>;
}

/// Connection lifecycle of a [`StreamSession`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal; only reached by a caller-initiated close
    Closed,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Closed,
            _ => Self::Disconnected,
        }
    }

    /// Short label for the status line
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "live",
            Self::Closed => "closed",
        }
    }
}

/// Owns the push-channel connection and routes inbound events into the
/// event buffer.
///
/// Transport failures are transparent retry conditions: the session keeps
/// reconnecting (with capped exponential backoff on failed connects) until
/// [`close`](Self::close) is called. Close is terminal and guarantees that
/// no event is dispatched into the buffer afterwards, even if the
/// underlying channel still has messages queued.
pub struct StreamSession {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
    state: Arc<AtomicU8>,
    received: Arc<AtomicU64>,
}

impl StreamSession {
    /// Spawn the session task and begin connecting
    pub fn start(transport: Arc<dyn PushTransport>, buffer: EventBuffer) -> Self {
        let cancel = CancellationToken::new();
        let state = Arc::new(AtomicU8::new(SessionState::Disconnected as u8));
        let received = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(run_session(
            transport,
            buffer,
            cancel.clone(),
            Arc::clone(&state),
            Arc::clone(&received),
        ));

        Self {
            cancel,
            task,
            state,
            received,
        }
    }

    /// Current connection state
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Number of events dispatched into the buffer so far
    pub fn events_received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    /// Tear the session down. Idempotent; once this returns, no further
    /// events reach the buffer.
    pub fn close(&self) {
        self.cancel.cancel();
        self.task.abort();
        self.state
            .store(SessionState::Closed as u8, Ordering::SeqCst);
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_session(
    transport: Arc<dyn PushTransport>,
    buffer: EventBuffer,
    cancel: CancellationToken,
    state: Arc<AtomicU8>,
    received: Arc<AtomicU64>,
) {
    let mut backoff = INITIAL_BACKOFF;

    'reconnect: loop {
        state.store(SessionState::Connecting as u8, Ordering::SeqCst);

        let stream = tokio::select! {
            _ = cancel.cancelled() => break,
            result = transport.connect() => match result {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "push channel connect failed, retrying");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            },
        };

        state.store(SessionState::Connected as u8, Ordering::SeqCst);
        backoff = INITIAL_BACKOFF;
        debug!("push channel connected");

        let mut stream = stream;
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break 'reconnect,

                item = stream.next() => match item {
                    Some(Ok(event)) => {
                        // Teardown may race a buffered message; drop it
                        // rather than dispatch into a closed session.
                        if cancel.is_cancelled() {
                            break 'reconnect;
                        }
                        received.fetch_add(1, Ordering::SeqCst);
                        buffer.insert(event);
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "push channel error, reconnecting");
                        break;
                    }
                    None => {
                        debug!("push channel closed by peer, reconnecting");
                        break;
                    }
                },
            }
        }

        state.store(SessionState::Disconnected as u8, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use chrono::{TimeZone, Utc};
    use futures::channel::mpsc;
    use parking_lot::Mutex;

    use logscope_types::LogLevel;

    fn event(id: u64) -> LogEvent {
        LogEvent {
            id,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            level: LogLevel::Info,
            service: "auth".to_string(),
            message: format!("event {id}"),
        }
    }

    /// Transport that hands out pre-built streams, one per connect
    struct StubTransport {
        streams: Mutex<VecDeque<EventStream>>,
        connects: AtomicUsize,
    }

    impl StubTransport {
        fn new(streams: Vec<EventStream>) -> Self {
            Self {
                streams: Mutex::new(streams.into()),
                connects: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PushTransport for StubTransport {
        async fn connect(&self) -> Result<EventStream, PushError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.streams
                .lock()
                .pop_front()
                .ok_or_else(|| PushError::Connect("no stream".to_string()))
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_events_flow_into_buffer() {
        let (tx, rx) = mpsc::unbounded();
        let transport = Arc::new(StubTransport::new(vec![rx.map(Ok).boxed()]));
        let buffer = EventBuffer::new(10);
        let session = StreamSession::start(transport, buffer.clone());

        tx.unbounded_send(event(1)).unwrap();
        tx.unbounded_send(event(2)).unwrap();

        wait_for(|| buffer.len() == 2).await;
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.events_received(), 2);
        // Arrival order preserved, newest first
        assert_eq!(buffer.snapshot()[0].id, 2);

        session.close();
    }

    #[tokio::test]
    async fn test_no_insert_after_teardown() {
        let (tx, rx) = mpsc::unbounded();
        let transport = Arc::new(StubTransport::new(vec![rx.map(Ok).boxed()]));
        let buffer = EventBuffer::new(10);
        let session = StreamSession::start(transport, buffer.clone());

        tx.unbounded_send(event(1)).unwrap();
        wait_for(|| buffer.len() == 1).await;

        session.close();
        assert_eq!(session.state(), SessionState::Closed);

        // The channel still delivers, but the session must not dispatch
        tx.unbounded_send(event(2)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let transport = Arc::new(StubTransport::new(vec![]));
        let buffer = EventBuffer::new(10);
        let session = StreamSession::start(transport, buffer);

        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_reconnects_after_stream_ends() {
        // First connection ends immediately after one event; the session
        // should reconnect and keep consuming from the second.
        let first = futures::stream::iter(vec![Ok(event(1))]).boxed();
        let (tx, rx) = mpsc::unbounded();
        let second: EventStream = rx.map(Ok).boxed();

        let transport = Arc::new(StubTransport::new(vec![first, second]));
        let buffer = EventBuffer::new(10);
        let session = StreamSession::start(Arc::clone(&transport) as Arc<dyn PushTransport>, buffer.clone());

        wait_for(|| transport.connects.load(Ordering::SeqCst) >= 2).await;

        tx.unbounded_send(event(2)).unwrap();
        wait_for(|| buffer.len() == 2).await;
        assert_eq!(session.state(), SessionState::Connected);

        session.close();
    }

    #[tokio::test]
    async fn test_transport_error_triggers_reconnect() {
        let first = futures::stream::iter(vec![Err(PushError::Channel("reset".to_string()))]).boxed();
        let (tx, rx) = mpsc::unbounded();
        let second: EventStream = rx.map(Ok).boxed();

        let transport = Arc::new(StubTransport::new(vec![first, second]));
        let buffer = EventBuffer::new(10);
        let _session = StreamSession::start(Arc::clone(&transport) as Arc<dyn PushTransport>, buffer.clone());

        wait_for(|| transport.connects.load(Ordering::SeqCst) >= 2).await;
        tx.unbounded_send(event(7)).unwrap();
        wait_for(|| buffer.len() == 1).await;
    }
}
