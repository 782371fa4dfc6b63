// SPDX-License-Identifier: MIT OR Apache-2.0
//! Merged list of historical and live events.

use crate::event::StreamEvent;
use crate::filter::EventFilter;

/// Events known to the dashboard, in arrival order
#[derive(Debug, Clone, Default)]
pub struct EventFeed {
    events: Vec<StreamEvent>,
}

impl EventFeed {
    /// Create an empty feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a history snapshot
    pub fn replace_all(&mut self, history: Vec<StreamEvent>) {
        self.events = history;
    }

    /// Add a live event; an event with the same id is replaced in place
    pub fn push(&mut self, event: StreamEvent) {
        match self.events.iter_mut().find(|existing| existing.id == event.id) {
            Some(existing) => *existing = event,
            None => self.events.push(event),
        }
    }

    /// All events in arrival order
    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    /// Number of events held
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the feed is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events to display: type checked, not replayed, newest first
    pub fn visible(&self, filter: &EventFilter) -> Vec<&StreamEvent> {
        let mut visible: Vec<&StreamEvent> = self
            .events
            .iter()
            .filter(|event| filter.allows(event.type_code) && !event.replayed)
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::Map;

    fn event(id: &str, type_code: u16, minute: u32, replayed: bool) -> StreamEvent {
        StreamEvent {
            id: id.to_string(),
            type_code,
            replayed,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
            payload: Map::new(),
        }
    }

    fn ids(events: Vec<&StreamEvent>) -> Vec<&str> {
        events.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_visible_sorts_newest_first_and_drops_replays() {
        let mut feed = EventFeed::new();
        feed.replace_all(vec![
            event("a", 10, 1, false),
            event("b", 20, 5, false),
            event("c", 10, 3, true),
        ]);
        feed.push(event("d", 40, 2, false));

        assert_eq!(ids(feed.visible(&EventFilter::default())), vec!["b", "d", "a"]);
    }

    #[test]
    fn test_visible_respects_filter() {
        let mut feed = EventFeed::new();
        feed.replace_all(vec![event("a", 10, 1, false), event("b", 20, 2, false)]);

        let mut filter = EventFilter::default();
        filter.set_checked("Bits", false);
        assert_eq!(ids(feed.visible(&filter)), vec!["a"]);
    }

    #[test]
    fn test_duplicate_push_replaces() {
        let mut feed = EventFeed::new();
        feed.push(event("a", 10, 1, false));
        feed.push(event("a", 10, 1, true));

        assert_eq!(feed.len(), 1);
        assert!(feed.events()[0].replayed);
    }

    #[test]
    fn test_replace_all_discards_previous() {
        let mut feed = EventFeed::new();
        feed.push(event("live", 10, 1, false));
        feed.replace_all(vec![event("h1", 10, 0, false)]);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed.events()[0].id, "h1");
    }
}
