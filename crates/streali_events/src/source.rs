// SPDX-License-Identifier: MIT OR Apache-2.0
//! Server-sent events client.
//!
//! [`EventSource::listen`] opens a `text/event-stream` response on a reader
//! thread and forwards decoded [`StreamEvent`]s over a channel. The UI
//! drains the channel once per frame. Dropping or closing the handle stops
//! delivery.

use crate::api::ApiError;
use crate::event::StreamEvent;
use std::io::{self, BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How long a read may block before the reader re-checks `close`.
/// Also bounds the wait for response headers.
const CLOSE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Errors from the event stream
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request failed
    #[error(transparent)]
    Http(#[from] ApiError),
    /// Reading the stream failed
    #[error("stream read error: {0}")]
    Io(#[from] std::io::Error),
}

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseMessage {
    /// `event:` field, if any
    pub event: Option<String>,
    /// Last `id:` seen
    pub id: Option<String>,
    /// `data:` lines joined by newlines
    pub data: String,
}

/// Line parser for the event-stream format
#[derive(Debug, Default)]
pub struct SseParser {
    data: Vec<String>,
    event: Option<String>,
    last_id: Option<String>,
}

impl SseParser {
    /// Create a parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line without its terminator. A blank line dispatches.
    pub fn feed_line(&mut self, line: &str) -> Option<SseMessage> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.last_id = Some(value.to_string()),
            // retry and unknown fields
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseMessage> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseMessage {
            event,
            id: self.last_id.clone(),
            data,
        })
    }
}

/// Messages delivered to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum SourceMessage {
    /// The stream is open
    Connected,
    /// A decoded event
    Event(StreamEvent),
    /// The server ended the stream
    Closed,
    /// The stream could not be opened or broke
    Failed(String),
}

/// Live subscription; closing it stops delivery
pub struct EventSourceHandle {
    receiver: Receiver<SourceMessage>,
    closed: Arc<AtomicBool>,
    url: String,
}

impl EventSourceHandle {
    /// URL being listened to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Take everything received since the last call
    pub fn poll(&self) -> Vec<SourceMessage> {
        if self.is_closed() {
            return Vec::new();
        }
        self.receiver.try_iter().collect()
    }

    /// Wait for the next message
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SourceMessage> {
        if self.is_closed() {
            return None;
        }
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Stop delivery. The reader thread drops the connection within about
    /// a second, even on an idle stream.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Closing event source {}", self.url);
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for EventSourceHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Server-sent events subscriber
pub struct EventSource;

impl EventSource {
    /// Start listening to `url` on a background thread
    pub fn listen(url: impl Into<String>) -> Result<EventSourceHandle, SourceError> {
        let url = url.into();
        let (sender, receiver) = mpsc::channel();
        let closed = Arc::new(AtomicBool::new(false));

        let thread_url = url.clone();
        let thread_closed = closed.clone();
        std::thread::Builder::new()
            .name("event-source".to_string())
            .spawn(move || {
                let outcome = match read_stream(&thread_url, &sender, &thread_closed) {
                    Ok(()) => SourceMessage::Closed,
                    Err(e) => {
                        tracing::warn!("Event stream {} failed: {}", thread_url, e);
                        SourceMessage::Failed(e.to_string())
                    }
                };
                if !thread_closed.load(Ordering::SeqCst) {
                    let _ = sender.send(outcome);
                }
                tracing::debug!("Event source thread for {} exiting", thread_url);
            })?;

        tracing::info!("Listening for events on {}", url);
        Ok(EventSourceHandle { receiver, closed, url })
    }
}

fn read_stream(url: &str, sender: &Sender<SourceMessage>, closed: &AtomicBool) -> Result<(), SourceError> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .timeout_read(CLOSE_POLL_INTERVAL)
        .build();
    let response = agent
        .get(url)
        .set("Accept", "text/event-stream")
        .set("Cache-Control", "no-cache")
        .call()
        .map_err(ApiError::from)?;

    if closed.load(Ordering::SeqCst) || sender.send(SourceMessage::Connected).is_err() {
        return Ok(());
    }

    let mut parser = SseParser::new();
    let mut reader = BufReader::new(response.into_reader());
    // Bytes of a line cut short by a read timeout are kept for the next read
    let mut pending = Vec::new();
    loop {
        if closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        let read = match reader.read_until(b'\n', &mut pending) {
            Ok(read) => read,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => continue,
            Err(e) => return Err(e.into()),
        };
        let at_end = read == 0 || pending.last() != Some(&b'\n');
        if at_end && pending.is_empty() {
            return Ok(());
        }

        let message = {
            let line = String::from_utf8_lossy(&pending);
            parser.feed_line(line.strip_suffix('\n').unwrap_or(&line))
        };
        pending.clear();
        if let Some(message) = message {
            match serde_json::from_str::<StreamEvent>(&message.data) {
                Ok(event) => {
                    if sender.send(SourceMessage::Event(event)).is_err() {
                        return Ok(());
                    }
                }
                Err(e) => tracing::warn!("Ignoring undecodable event payload: {}", e),
            }
        }
        if at_end {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn feed(parser: &mut SseParser, text: &str) -> Vec<SseMessage> {
        text.lines().filter_map(|line| parser.feed_line(line)).collect()
    }

    #[test]
    fn test_data_lines_join_and_blank_line_dispatches() {
        let mut parser = SseParser::new();
        let messages = feed(&mut parser, "event: follow\nid: 7\ndata: one\ndata:two\n\n");

        assert_eq!(messages, vec![SseMessage {
            event: Some("follow".to_string()),
            id: Some("7".to_string()),
            data: "one\ntwo".to_string(),
        }]);
    }

    #[test]
    fn test_comments_and_empty_events_are_skipped() {
        let mut parser = SseParser::new();
        let messages = feed(&mut parser, ": keep-alive\n\nevent: ping\n\ndata: x\r\n\r\n");

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "x");
        assert_eq!(messages[0].event, None);
    }

    #[test]
    fn test_id_persists_across_events() {
        let mut parser = SseParser::new();
        let messages = feed(&mut parser, "id: 3\ndata: a\n\ndata: b\n\n");
        assert_eq!(messages[1].id, Some("3".to_string()));
    }

    #[test]
    fn test_listen_delivers_events_then_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 512];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let body = concat!(
                ": hello\n\n",
                "data: {\"id\": 1, \"type\": 10, \"created_at\": \"2024-03-01T12:00:00Z\"}\n\n",
                "data: not json\n\n",
            );
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n{}",
                body
            )
            .unwrap();
        });

        let handle = EventSource::listen(format!("http://127.0.0.1:{}/users/1/events", port)).unwrap();
        let timeout = Duration::from_secs(5);

        assert_eq!(handle.recv_timeout(timeout), Some(SourceMessage::Connected));
        match handle.recv_timeout(timeout) {
            Some(SourceMessage::Event(event)) => assert_eq!(event.id, "1"),
            other => panic!("expected event, got {:?}", other),
        }
        assert_eq!(handle.recv_timeout(timeout), Some(SourceMessage::Closed));
    }

    #[test]
    fn test_close_releases_idle_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (released_tx, released_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 512];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n: hello\n\n"
            )
            .unwrap();
            stream.flush().unwrap();

            // Stay silent; the client has to hang up on its own
            stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
            let released = match stream.read(&mut buf) {
                Ok(n) => n == 0,
                Err(e) => !matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut),
            };
            released_tx.send(released).unwrap();
        });

        let handle = EventSource::listen(format!("http://127.0.0.1:{}/users/1/events", port)).unwrap();
        assert_eq!(handle.recv_timeout(Duration::from_secs(5)), Some(SourceMessage::Connected));
        drop(handle);

        assert!(released_rx.recv_timeout(Duration::from_secs(15)).unwrap());
    }

    #[test]
    fn test_unreachable_url_reports_failure() {
        let handle = EventSource::listen("http://127.0.0.1:9/events").unwrap();
        let message = handle.recv_timeout(Duration::from_secs(10));
        assert!(matches!(message, Some(SourceMessage::Failed(_))));
    }

    #[test]
    fn test_closed_handle_delivers_nothing() {
        let handle = EventSource::listen("http://127.0.0.1:9/events").unwrap();
        handle.close();
        assert!(handle.is_closed());
        assert!(handle.poll().is_empty());
        assert_eq!(handle.recv_timeout(Duration::from_millis(10)), None);
    }
}
