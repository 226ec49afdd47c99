//! Wire protocol between the notification hub and connected clients
//!
//! Server → client frames are either control replies (`pong`, `subscribed`)
//! or domain events. Client → server frames are `ping` and `subscribe`.

use crate::event::DomainEvent;
use serde::{Deserialize, Serialize};

/// Default channel name when a subscribe frame omits one
pub const DEFAULT_CHANNEL: &str = "all";

/// Control replies sent directly to one connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Reply to a client ping; carries no other fields
    Pong,
    /// Acknowledges a subscribe frame
    Subscribed {
        /// Channel subscribed to
        channel: String,
    },
}

/// Any frame the server sends to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Control reply
    Control(ControlMessage),
    /// Domain event broadcast
    Event(DomainEvent),
}

impl ServerMessage {
    /// The event carried by this frame, if any
    pub fn as_event(&self) -> Option<&DomainEvent> {
        match self {
            ServerMessage::Event(event) => Some(event),
            ServerMessage::Control(_) => None,
        }
    }

    /// Whether this frame is a heartbeat reply
    pub fn is_pong(&self) -> bool {
        matches!(self, ServerMessage::Control(ControlMessage::Pong))
    }
}

impl From<DomainEvent> for ServerMessage {
    fn from(event: DomainEvent) -> Self {
        ServerMessage::Event(event)
    }
}

impl From<ControlMessage> for ServerMessage {
    fn from(control: ControlMessage) -> Self {
        ServerMessage::Control(control)
    }
}

/// Any frame a client sends to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat
    Ping {
        /// Client-side send time, informational only
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<serde_json::Value>,
    },
    /// Subscribe to a channel
    Subscribe {
        /// Channel name, `"all"` when omitted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
    },
}

impl ClientMessage {
    /// The reply the server sends for this frame
    pub fn reply(&self) -> ControlMessage {
        match self {
            ClientMessage::Ping { .. } => ControlMessage::Pong,
            ClientMessage::Subscribe { channel } => ControlMessage::Subscribed {
                channel: channel
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use serde_json::json;

    #[test]
    fn test_pong_shape() {
        let pong = ServerMessage::from(ControlMessage::Pong);
        assert_eq!(serde_json::to_value(&pong).unwrap(), json!({"type": "pong"}));
    }

    #[test]
    fn test_ping_reply_is_bare_pong() {
        for raw in [
            r#"{"type":"ping","timestamp":"2026-01-05T10:00:00Z"}"#,
            r#"{"type":"ping","timestamp":1767607200000}"#,
            r#"{"type":"ping"}"#,
        ] {
            let ping: ClientMessage = serde_json::from_str(raw).unwrap();
            assert_eq!(ping.reply(), ControlMessage::Pong);
        }
    }

    #[test]
    fn test_subscribe_defaults_to_all() {
        let sub: ClientMessage = serde_json::from_str(r#"{"type":"subscribe"}"#).unwrap();
        assert_eq!(
            sub.reply(),
            ControlMessage::Subscribed { channel: "all".into() }
        );
    }

    #[test]
    fn test_unknown_client_frame_fails() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn test_server_message_decodes_both_kinds() {
        let pong: ServerMessage = serde_json::from_str(r#"{"type":"pong"}"#).unwrap();
        assert!(pong.is_pong());

        let event = DomainEvent::error("disk full", None);
        let raw = serde_json::to_string(&ServerMessage::from(event.clone())).unwrap();
        let decoded: ServerMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded.as_event().map(|e| e.event_type), Some(EventType::Error));
        assert_eq!(decoded.as_event().map(|e| &e.id), Some(&event.id));
    }
}
