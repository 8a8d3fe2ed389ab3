use serde::{Deserialize, Serialize};

/// A JSON text frame on the socket: `{"event": "...", "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ChatEvent {
    /// Client -> server and server -> every client, payload is opaque text
    #[serde(rename = "chat message")]
    ChatMessage(String),
    /// Server -> single client only
    #[serde(rename = "error")]
    Error { code: String, msg: String },
}

impl ChatEvent {
    pub fn parse_error(e: &serde_json::Error) -> Self {
        Self::Error {
            code: "PARSE_ERROR".to_string(),
            msg: format!("Invalid message format: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_wire_format() {
        let json = serde_json::to_string(&ChatEvent::ChatMessage("hello".to_string())).unwrap();
        assert_eq!(json, r#"{"event":"chat message","data":"hello"}"#);
    }

    #[test]
    fn test_parse_inbound_chat_message() {
        let event: ChatEvent =
            serde_json::from_str(r#"{"event":"chat message","data":"hi there"}"#).unwrap();
        assert_eq!(event, ChatEvent::ChatMessage("hi there".to_string()));
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(serde_json::from_str::<ChatEvent>(r#"{"event":"join","data":"x"}"#).is_err());
        assert!(serde_json::from_str::<ChatEvent>("not json").is_err());
    }

    #[test]
    fn test_error_wire_format() {
        let e = serde_json::from_str::<ChatEvent>("{").unwrap_err();
        let json = serde_json::to_value(ChatEvent::parse_error(&e)).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["code"], "PARSE_ERROR");
    }
}
