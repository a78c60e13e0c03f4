use serde::{Deserialize, Serialize};

use crate::detect::{HintHit, KeywordHit};
use crate::normalize::split_chunks;
use crate::session::Feature;

/// Messages sent to the client over the session channel.
///
/// Transcript-bearing variants carry the full text plus the same text
/// re-flowed into display chunks for small screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "ready")]
    Ready {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    #[serde(rename = "partial")]
    Partial { text: String, chunks: Vec<String> },
    #[serde(rename = "committed")]
    Committed { text: String, chunks: Vec<String> },
    #[serde(rename = "formatted")]
    Formatted { text: String, chunks: Vec<String> },
    #[serde(rename = "keywords")]
    Keywords { keywords: Vec<KeywordHit> },
    #[serde(rename = "hints")]
    Hints { hints: Vec<HintHit> },
    #[serde(rename = "keyword.status")]
    KeywordStatus { enabled: bool },
    #[serde(rename = "hints.status")]
    HintsStatus { enabled: bool },
    #[serde(rename = "error")]
    Error { error: String },
}

impl ServerMessage {
    pub fn partial(text: String) -> Self {
        let chunks = split_chunks(&text);
        ServerMessage::Partial { text, chunks }
    }

    pub fn committed(text: String) -> Self {
        let chunks = split_chunks(&text);
        ServerMessage::Committed { text, chunks }
    }

    pub fn formatted(text: String) -> Self {
        let chunks = split_chunks(&text);
        ServerMessage::Formatted { text, chunks }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ServerMessage::Error {
            error: error.into(),
        }
    }

    pub fn feature_status(feature: Feature, enabled: bool) -> Self {
        match feature {
            Feature::Keywords => ServerMessage::KeywordStatus { enabled },
            Feature::Hints => ServerMessage::HintsStatus { enabled },
        }
    }
}

/// Messages accepted from the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// One PCM frame, base64-encoded.
    Audio { audio: String },
    /// Detection feature toggle.
    Control {
        action: ControlAction,
        data: ToggleState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ControlAction {
    #[serde(rename = "keyword.control")]
    Keywords,
    #[serde(rename = "hints.control")]
    Hints,
}

impl ControlAction {
    pub fn feature(self) -> Feature {
        match self {
            ControlAction::Keywords => Feature::Keywords,
            ControlAction::Hints => Feature::Hints,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    On,
    Off,
}

impl ToggleState {
    pub fn enabled(self) -> bool {
        matches!(self, ToggleState::On)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ready_uses_camel_case_session_id() {
        let message = ServerMessage::Ready {
            session_id: "note-1".into(),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"type": "ready", "sessionId": "note-1"})
        );
    }

    #[test]
    fn committed_carries_text_and_chunks() {
        let message = ServerMessage::committed("Hello world.".into());
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "committed",
                "text": "Hello world.",
                "chunks": ["Hello world."],
            })
        );
    }

    #[test]
    fn status_messages_use_dotted_type_tags() {
        assert_eq!(
            serde_json::to_value(ServerMessage::KeywordStatus { enabled: true }).unwrap(),
            json!({"type": "keyword.status", "enabled": true})
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::HintsStatus { enabled: false }).unwrap(),
            json!({"type": "hints.status", "enabled": false})
        );
    }

    #[test]
    fn hints_payload_uses_camel_case_fields() {
        let message = ServerMessage::Hints {
            hints: vec![crate::detect::HintHit {
                resource_id: "doc-1".into(),
                resource_title: "Runbook".into(),
                hint: "Restart the worker first.".into(),
                source_url: "https://example.com/runbook".into(),
            }],
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["hints"][0]["resourceId"], "doc-1");
        assert_eq!(value["hints"][0]["resourceTitle"], "Runbook");
        assert_eq!(value["hints"][0]["sourceUrl"], "https://example.com/runbook");
    }

    #[test]
    fn audio_message_parses() {
        let message: ClientMessage = serde_json::from_str(r#"{"audio": "AAAA"}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::Audio {
                audio: "AAAA".into()
            }
        );
    }

    #[test]
    fn control_messages_parse() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"action": "keyword.control", "data": "on"}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::Control {
                action: ControlAction::Keywords,
                data: ToggleState::On,
            }
        );

        let message: ClientMessage =
            serde_json::from_str(r#"{"action": "hints.control", "data": "off"}"#).unwrap();
        let ClientMessage::Control { action, data } = message else {
            panic!("expected control message");
        };
        assert_eq!(action.feature(), Feature::Hints);
        assert!(!data.enabled());
    }

    #[test]
    fn unknown_messages_fail_to_parse() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"verb": "dance"}"#).is_err());
        assert!(
            serde_json::from_str::<ClientMessage>(r#"{"action": "volume.control", "data": "on"}"#)
                .is_err()
        );
    }

    #[test]
    fn server_messages_round_trip() {
        let messages = [
            ServerMessage::partial("testing one two".into()),
            ServerMessage::Keywords {
                keywords: vec![crate::detect::KeywordHit {
                    name: "RDS".into(),
                    description: "managed database".into(),
                }],
            },
            ServerMessage::error("bad frame"),
        ];

        for message in messages {
            let encoded = serde_json::to_string(&message).unwrap();
            let decoded: ServerMessage = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, message);
        }
    }
}
