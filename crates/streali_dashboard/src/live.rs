// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live event service.
//!
//! Fetches the event history on a worker thread, subscribes to the push
//! stream and merges both into one [`EventFeed`]. The UI calls
//! [`LiveEvents::poll`] once per frame.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use streali_events::{
    ApiClient, ApiResult, EventFeed, EventFilter, EventSource, EventSourceHandle, FilterStore,
    SourceMessage, StoreResult, StreamEvent,
};

/// Connection state shown in the events panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No user configured or not started
    Disconnected,
    /// Waiting for the stream to open
    Connecting,
    /// Receiving pushed events
    Live,
    /// The server ended the stream
    Closed,
    /// The stream could not be opened
    Failed(String),
}

impl ConnectionStatus {
    /// Short label
    pub fn label(&self) -> String {
        match self {
            Self::Disconnected => "Disconnected".to_string(),
            Self::Connecting => "Connecting...".to_string(),
            Self::Live => "Live".to_string(),
            Self::Closed => "Stream closed".to_string(),
            Self::Failed(reason) => format!("Failed: {reason}"),
        }
    }
}

/// Something the user should hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveNotice {
    /// History request finished
    HistoryLoaded(usize),
    /// History request failed
    HistoryFailed(String),
    /// Push stream opened
    Connected,
    /// Push stream failed
    StreamFailed(String),
}

/// History merged with pushed events, plus the persisted filter
pub struct LiveEvents {
    store: FilterStore,
    feed: EventFeed,
    status: ConnectionStatus,
    source: Option<EventSourceHandle>,
    history_rx: Option<Receiver<ApiResult<Vec<StreamEvent>>>>,
}

impl LiveEvents {
    /// Create a disconnected service backed by `store`
    pub fn new(store: FilterStore) -> Self {
        Self {
            store,
            feed: EventFeed::new(),
            status: ConnectionStatus::Disconnected,
            source: None,
            history_rx: None,
        }
    }

    /// Current filter
    pub fn filter(&self) -> &EventFilter {
        self.store.filter()
    }

    /// Toggle one event type and persist it
    pub fn set_checked(&mut self, label: &str, value: bool) -> StoreResult<()> {
        self.store.set_checked(label, value)
    }

    /// Check every event type and persist it
    pub fn select_all(&mut self) -> StoreResult<()> {
        self.store.select_all()
    }

    /// Events to show, newest first
    pub fn visible(&self) -> Vec<&StreamEvent> {
        self.feed.visible(self.store.filter())
    }

    /// Total events received, shown or not
    pub fn total(&self) -> usize {
        self.feed.len()
    }

    /// Connection state
    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Whether a history request is still running
    pub fn is_loading(&self) -> bool {
        self.history_rx.is_some()
    }

    /// Drop the current subscription and start a new one for `user_id`
    pub fn connect(&mut self, client: &ApiClient, user_id: &str) {
        self.disconnect();
        self.feed = EventFeed::new();

        let user_id = user_id.trim().to_string();
        if user_id.is_empty() {
            tracing::info!("No user id configured, live events disabled");
            return;
        }

        let (sender, receiver) = mpsc::channel();
        let history_client = client.clone();
        let history_user = user_id.clone();
        let spawned = std::thread::Builder::new()
            .name("event-history".to_string())
            .spawn(move || {
                let _ = sender.send(history_client.user_events(&history_user));
            });
        match spawned {
            Ok(_) => self.history_rx = Some(receiver),
            Err(e) => tracing::error!("Failed to start history request: {}", e),
        }

        match EventSource::listen(client.user_events_url(&user_id)) {
            Ok(handle) => {
                self.source = Some(handle);
                self.status = ConnectionStatus::Connecting;
            }
            Err(e) => {
                tracing::error!("Failed to open event stream: {}", e);
                self.status = ConnectionStatus::Failed(e.to_string());
            }
        }
    }

    /// Close the subscription
    pub fn disconnect(&mut self) {
        if let Some(source) = self.source.take() {
            source.close();
        }
        self.history_rx = None;
        self.status = ConnectionStatus::Disconnected;
    }

    /// Drain the history request and the push stream
    pub fn poll(&mut self) -> Vec<LiveNotice> {
        let mut notices = Vec::new();

        if let Some(receiver) = &self.history_rx {
            match receiver.try_recv() {
                Ok(Ok(history)) => {
                    notices.push(LiveNotice::HistoryLoaded(history.len()));
                    merge_history(&mut self.feed, history);
                    self.history_rx = None;
                }
                Ok(Err(e)) => {
                    tracing::warn!("Failed to load event history: {}", e);
                    notices.push(LiveNotice::HistoryFailed(e.to_string()));
                    self.history_rx = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.history_rx = None,
            }
        }

        let messages = self.source.as_ref().map(EventSourceHandle::poll).unwrap_or_default();
        for message in messages {
            match message {
                SourceMessage::Connected => {
                    self.status = ConnectionStatus::Live;
                    notices.push(LiveNotice::Connected);
                }
                SourceMessage::Event(event) => {
                    tracing::debug!("Received {}", event.summary());
                    self.feed.push(event);
                }
                SourceMessage::Closed => {
                    self.status = ConnectionStatus::Closed;
                    self.source = None;
                }
                SourceMessage::Failed(reason) => {
                    notices.push(LiveNotice::StreamFailed(reason.clone()));
                    self.status = ConnectionStatus::Failed(reason);
                    self.source = None;
                }
            }
        }

        notices
    }
}

/// Replace the feed with `history`, keeping events pushed before it arrived
fn merge_history(feed: &mut EventFeed, history: Vec<StreamEvent>) {
    let pushed = feed.events().to_vec();
    feed.replace_all(history);
    for event in pushed {
        feed.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streali_events::FILTER_FILE_NAME;
    use tempfile::TempDir;

    fn event(id: &str, created_at: &str) -> StreamEvent {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": 10,
            "created_at": created_at,
        }))
        .unwrap()
    }

    #[test]
    fn test_history_keeps_earlier_pushed_events() {
        let mut feed = EventFeed::new();
        feed.push(event("live", "2024-03-01T12:05:00Z"));

        merge_history(&mut feed, vec![event("old", "2024-03-01T12:00:00Z")]);

        let ids: Vec<&str> = feed.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["old", "live"]);
    }

    #[test]
    fn test_connect_without_user_stays_disconnected() {
        let dir = TempDir::new().unwrap();
        let mut live = LiveEvents::new(FilterStore::open(dir.path().join(FILTER_FILE_NAME)));

        live.connect(&ApiClient::new("http://127.0.0.1:9"), "  ");
        assert_eq!(live.status(), &ConnectionStatus::Disconnected);
        assert!(!live.is_loading());
        assert!(live.poll().is_empty());
    }

    #[test]
    fn test_unreachable_backend_reports_failures() {
        let dir = TempDir::new().unwrap();
        let mut live = LiveEvents::new(FilterStore::open(dir.path().join(FILTER_FILE_NAME)));
        live.connect(&ApiClient::new("http://127.0.0.1:9"), "42");
        assert_eq!(live.status(), &ConnectionStatus::Connecting);

        let mut notices = Vec::new();
        for _ in 0..200 {
            notices.extend(live.poll());
            if !live.is_loading() && matches!(live.status(), ConnectionStatus::Failed(_)) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        assert!(notices.iter().any(|n| matches!(n, LiveNotice::HistoryFailed(_))));
        assert!(notices.iter().any(|n| matches!(n, LiveNotice::StreamFailed(_))));
    }

    #[test]
    fn test_filter_changes_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILTER_FILE_NAME);
        let mut live = LiveEvents::new(FilterStore::open(&path));

        live.set_checked("Raid", false).unwrap();
        assert!(!FilterStore::open(&path).filter().allows(40));
    }
}
