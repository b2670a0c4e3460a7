use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::ItemId;

/// Canonical event schema at the ledger boundary.
///
/// Every producer (bulk initial scan, live event stream, periodic
/// reconciliation poll) is adapted into this one shape before it reaches the
/// engine. Producers may deliver the same logical change more than once and
/// in any order; the ledger transition rules absorb that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemEvent {
    ItemArrived {
        identity: ItemId,
        location: String,
        timestamp: DateTime<Utc>,
        read: bool,
    },
    ItemStateChanged {
        identity: ItemId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        read: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        treated: Option<bool>,
    },
    ItemDeleted {
        identity: ItemId,
        timestamp: DateTime<Utc>,
    },
}

impl ItemEvent {
    pub fn identity(&self) -> &ItemId {
        match self {
            ItemEvent::ItemArrived { identity, .. }
            | ItemEvent::ItemStateChanged { identity, .. }
            | ItemEvent::ItemDeleted { identity, .. } => identity,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ItemEvent::ItemArrived { .. } => "ledger.item.arrived",
            ItemEvent::ItemStateChanged { .. } => "ledger.item.state_changed",
            ItemEvent::ItemDeleted { .. } => "ledger.item.deleted",
        }
    }
}

/// Envelope for one inbound event: delivery metadata around the payload.
///
/// `observed_at` is the instant the event was handed to the core; it is used
/// as the treated stamp for implicit transitions (state changes carry no
/// timestamp of their own).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    event_id: Uuid,
    observed_at: DateTime<Utc>,
    payload: ItemEvent,
}

impl EventEnvelope {
    pub fn new(payload: ItemEvent, observed_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            observed_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn payload(&self) -> &ItemEvent {
        &self.payload
    }

    pub fn into_payload(self) -> ItemEvent {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn events_round_trip_through_json() {
        let event = ItemEvent::ItemStateChanged {
            identity: ItemId::from("msg-9"),
            read: Some(true),
            location: None,
            treated: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"item_state_changed\""));
        // Absent optional fields are omitted from the wire form.
        assert!(!json.contains("location"));
        let back: ItemEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn envelope_carries_identity_and_observation_time() {
        let observed = Utc.with_ymd_and_hms(2024, 7, 1, 8, 30, 0).unwrap();
        let envelope = EventEnvelope::new(
            ItemEvent::ItemDeleted {
                identity: ItemId::from("msg-3"),
                timestamp: observed,
            },
            observed,
        );
        assert_eq!(envelope.payload().identity().as_str(), "msg-3");
        assert_eq!(envelope.observed_at(), observed);
        assert_eq!(envelope.payload().event_type(), "ledger.item.deleted");
    }
}
