//! The `/logs` live stream: a hand-framed `text/event-stream` response fed
//! from the outbound queue.
use super::queue::OutboundQueue;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// How long a stream may stay idle before a keepalive event is sent.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// One event on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Sent once when a subscriber connects.
    Open,
    /// One serialized record.
    Data(String),
    /// Sent after an idle interval; the counter restarts after each batch of data.
    Keepalive(u64),
}

impl StreamEvent {
    /// Renders the event exactly as the dashboard expects it.
    pub fn encode(&self) -> String {
        match self {
            StreamEvent::Open => "event: open\n\n".to_string(),
            StreamEvent::Data(payload) => {
                let mut frame = String::with_capacity(payload.len() + 8);
                for line in payload.split('\n') {
                    frame.push_str("data: ");
                    frame.push_str(line.strip_suffix('\r').unwrap_or(line));
                    frame.push('\n');
                }
                frame.push('\n');
                frame
            }
            StreamEvent::Keepalive(count) => {
                format!("event: keepalive\n: keepalive ping {}\n\n", count)
            }
        }
    }
}

/// Per-connection state of a live stream.
struct EventStream {
    queue: Arc<OutboundQueue>,
    shutdown: watch::Receiver<bool>,
    keepalive_interval: Duration,
    opened: bool,
    keepalive_count: u64,
}

impl EventStream {
    /// Produces the next chunk to write, or `None` once the server stops.
    async fn next_chunk(&mut self) -> Option<String> {
        if !self.opened {
            self.opened = true;
            let mut chunk = StreamEvent::Open.encode();
            chunk.push_str(&encode_batch(self.queue.drain()));
            return Some(chunk);
        }

        loop {
            if *self.shutdown.borrow() {
                return None;
            }

            let notified = self.queue.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let pending = self.queue.drain();
            if !pending.is_empty() {
                debug!(count = pending.len(), "Sending log entries to client");
                self.keepalive_count = 0;
                return Some(encode_batch(pending));
            }

            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        return None;
                    }
                }
                woke = tokio::time::timeout(self.keepalive_interval, notified.as_mut()) => {
                    if woke.is_err() {
                        self.keepalive_count += 1;
                        debug!(count = self.keepalive_count, "Sent keepalive ping");
                        return Some(StreamEvent::Keepalive(self.keepalive_count).encode());
                    }
                }
            }
        }
    }
}

fn encode_batch(payloads: Vec<String>) -> String {
    payloads
        .into_iter()
        .map(|payload| StreamEvent::Data(payload).encode())
        .collect()
}

/// The body of a live stream as a stream of text chunks.
///
/// Dropping the stream (which hyper does when the client goes away) ends
/// the connection's share of the queue.
pub fn event_stream(
    queue: Arc<OutboundQueue>,
    shutdown: watch::Receiver<bool>,
    keepalive_interval: Duration,
) -> impl Stream<Item = Result<String, Infallible>> + Send + 'static {
    let state = EventStream {
        queue,
        shutdown,
        keepalive_interval,
        opened: false,
        keepalive_count: 0,
    };

    stream::unfold(state, |mut state| async move {
        let chunk = state.next_chunk().await?;
        Some((Ok(chunk), state))
    })
}

/// Builds the `/logs` response around an event stream.
pub fn stream_response(
    queue: Arc<OutboundQueue>,
    shutdown: watch::Receiver<bool>,
    keepalive_interval: Duration,
) -> Response {
    debug!("Started sending log stream");
    let body = Body::from_stream(event_stream(queue, shutdown, keepalive_interval));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
