// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stream events as delivered by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Known event categories and their wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// New follower
    Follow,
    /// Bits cheered
    Bits,
    /// New subscription
    Subscribe,
    /// Gifted subscriptions
    SubscriptionGift,
    /// Incoming raid
    Raid,
    /// Hype train started
    HypeTrainBegin,
    /// Hype train ended
    HypeTrainEnd,
    /// Goal started
    GoalBegin,
    /// Goal ended
    GoalEnd,
}

impl EventKind {
    /// Every kind in dashboard order
    pub const ALL: [EventKind; 9] = [
        EventKind::Follow,
        EventKind::Bits,
        EventKind::Subscribe,
        EventKind::SubscriptionGift,
        EventKind::Raid,
        EventKind::HypeTrainBegin,
        EventKind::HypeTrainEnd,
        EventKind::GoalBegin,
        EventKind::GoalEnd,
    ];

    /// Numeric type code used on the wire
    pub fn code(&self) -> u16 {
        match self {
            Self::Follow => 10,
            Self::Bits => 20,
            Self::Subscribe => 30,
            Self::SubscriptionGift => 31,
            Self::Raid => 40,
            Self::HypeTrainBegin => 50,
            Self::HypeTrainEnd => 52,
            Self::GoalBegin => 60,
            Self::GoalEnd => 62,
        }
    }

    /// Look up a kind by its wire code
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Follow => "Follow",
            Self::Bits => "Bits",
            Self::Subscribe => "Subscribe",
            Self::SubscriptionGift => "Subscription Gift",
            Self::Raid => "Raid",
            Self::HypeTrainBegin => "Hype Train Begin",
            Self::HypeTrainEnd => "Hype Train End",
            Self::GoalBegin => "Goal Begin",
            Self::GoalEnd => "Goal End",
        }
    }
}

/// A single stream event.
///
/// Fields the dashboard does not interpret are kept in `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Event id, numeric ids are kept in their decimal form
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Wire type code
    #[serde(rename = "type")]
    pub type_code: u16,
    /// Whether this is a replay of an earlier event
    #[serde(default)]
    pub replayed: bool,
    /// When the event happened
    pub created_at: DateTime<Utc>,
    /// Remaining fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

const NAME_FIELDS: [&str; 4] = ["username", "user_name", "display_name", "from_broadcaster_user_name"];

impl StreamEvent {
    /// Known kind, if the code is recognised
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_code(self.type_code)
    }

    /// Label for the event's kind
    pub fn label(&self) -> String {
        self.kind()
            .map(|kind| kind.label().to_string())
            .unwrap_or_else(|| format!("Event {}", self.type_code))
    }

    /// Viewer the event is about, if the payload names one
    pub fn username(&self) -> Option<&str> {
        let mut sources = std::iter::once(&self.payload)
            .chain(self.payload.get("data").and_then(Value::as_object));
        sources.find_map(|fields| {
            NAME_FIELDS
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str))
        })
    }

    /// One-line description for the feed
    pub fn summary(&self) -> String {
        match self.username() {
            Some(name) => format!("{} \u{2022} {}", self.label(), name),
            None => self.label(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid event id: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(EventKind::from_code(11), None);
        assert_eq!(EventKind::SubscriptionGift.code(), 31);
        assert_eq!(EventKind::HypeTrainEnd.code(), 52);
    }

    #[test]
    fn test_event_keeps_unknown_fields() {
        let json = r#"{
            "id": 42,
            "type": 40,
            "created_at": "2024-03-01T12:00:00Z",
            "data": { "from_broadcaster_user_name": "raider", "viewers": 12 }
        }"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "42");
        assert_eq!(event.kind(), Some(EventKind::Raid));
        assert!(!event.replayed);
        assert_eq!(event.username(), Some("raider"));
        assert_eq!(event.payload["data"]["viewers"], 12);
        assert_eq!(event.summary(), "Raid \u{2022} raider");
    }

    #[test]
    fn test_unknown_code_gets_generic_label() {
        let json = r#"{"id": "a", "type": 99, "created_at": "2024-03-01T12:00:00Z", "replayed": true}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.kind(), None);
        assert_eq!(event.label(), "Event 99");
        assert!(event.replayed);
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        let json = r#"{"id": null, "type": 10, "created_at": "2024-03-01T12:00:00Z"}"#;
        assert!(serde_json::from_str::<StreamEvent>(json).is_err());
    }
}
