//! Outbound wire events
//!
//! Every event is a JSON object with a `type` tag and an RFC 3339 UTC
//! `timestamp`; the remaining fields are fixed per variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::StateSnapshot;

pub const HELLO_MESSAGE: &str = "connected";
pub const UNRECOGNIZED_NOTE: &str = "Unrecognized message type";

/// Where a state change or command entered the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Stream,
    ExternalUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Hello {
        message: String,
        timestamp: DateTime<Utc>,
        data_snapshot: StateSnapshot,
    },
    DataUpdate {
        device_id: String,
        value: Value,
        source: Source,
        timestamp: DateTime<Utc>,
    },
    Control {
        target: Option<String>,
        command: Option<String>,
        #[serde(default)]
        args: Map<String, Value>,
        source: Source,
        timestamp: DateTime<Utc>,
    },
    Pong {
        timestamp: DateTime<Utc>,
    },
    Echo {
        received: Value,
        note: String,
        timestamp: DateTime<Utc>,
    },
    /// Reply to a client that broke the protocol
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn hello(data_snapshot: StateSnapshot) -> Self {
        Event::Hello {
            message: HELLO_MESSAGE.to_string(),
            timestamp: Utc::now(),
            data_snapshot,
        }
    }

    pub fn data_update(device_id: impl Into<String>, value: Value, source: Source) -> Self {
        Event::DataUpdate {
            device_id: device_id.into(),
            value,
            source,
            timestamp: Utc::now(),
        }
    }

    pub fn control(
        target: Option<String>,
        command: Option<String>,
        args: Map<String, Value>,
        source: Source,
    ) -> Self {
        Event::Control {
            target,
            command,
            args,
            source,
            timestamp: Utc::now(),
        }
    }

    pub fn pong() -> Self {
        Event::Pong {
            timestamp: Utc::now(),
        }
    }

    pub fn echo(received: Value) -> Self {
        Event::Echo {
            received,
            note: UNRECOGNIZED_NOTE.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// The wire `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Hello { .. } => "hello",
            Event::DataUpdate { .. } => "data_update",
            Event::Control { .. } => "control",
            Event::Pong { .. } => "pong",
            Event::Echo { .. } => "echo",
            Event::Error { .. } => "error",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Hello { timestamp, .. }
            | Event::DataUpdate { timestamp, .. }
            | Event::Control { timestamp, .. }
            | Event::Pong { timestamp }
            | Event::Echo { timestamp, .. }
            | Event::Error { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_update_wire_shape() {
        let event = Event::data_update("t1", json!(23.5), Source::Stream);
        let wire = serde_json::to_value(&event).unwrap();

        assert_eq!(wire["type"], "data_update");
        assert_eq!(wire["device_id"], "t1");
        assert_eq!(wire["value"], json!(23.5));
        assert_eq!(wire["source"], "stream");
        assert!(wire["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_external_source_is_kebab_case() {
        let event = Event::data_update("t2", json!(7), Source::ExternalUpdate);
        let wire = serde_json::to_value(&event).unwrap();
        assert_eq!(wire["source"], "external-update");
    }

    #[test]
    fn test_control_args_default_to_empty_object() {
        let event = Event::control(
            Some("pump".into()),
            Some("start".into()),
            Map::new(),
            Source::ExternalUpdate,
        );
        let wire = serde_json::to_value(&event).unwrap();

        assert_eq!(wire["type"], "control");
        assert_eq!(wire["args"], json!({}));

        let parsed: Event = serde_json::from_value(json!({
            "type": "control",
            "target": "pump",
            "command": "stop",
            "source": "stream",
            "timestamp": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(matches!(parsed, Event::Control { ref args, .. } if args.is_empty()));
    }

    #[test]
    fn test_pong_has_only_type_and_timestamp() {
        let wire = serde_json::to_value(Event::pong()).unwrap();
        let fields = wire.as_object().unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(wire["type"], "pong");
    }

    #[test]
    fn test_hello_carries_snapshot() {
        let wire = serde_json::to_value(Event::hello(StateSnapshot::new())).unwrap();

        assert_eq!(wire["type"], "hello");
        assert_eq!(wire["message"], HELLO_MESSAGE);
        assert_eq!(wire["data_snapshot"], json!({}));
    }

    #[test]
    fn test_kind_matches_tag() {
        let events = [
            Event::hello(StateSnapshot::new()),
            Event::data_update("d", Value::Null, Source::Stream),
            Event::control(None, None, Map::new(), Source::Stream),
            Event::pong(),
            Event::echo(json!({"type": "foo"})),
            Event::error("bad"),
        ];
        for event in events {
            let wire = serde_json::to_value(&event).unwrap();
            assert_eq!(wire["type"], event.kind());
        }
    }
}
