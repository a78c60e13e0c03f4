//! Wire messages for the realtime recognition protocol.

use serde::{Deserialize, Serialize};

/// One audio frame sent up the connection, base64 exactly as received
/// from the client so no re-encoding happens on the hot path.
#[derive(Debug, Serialize)]
pub struct AudioFrame<'a> {
    pub audio_base64: &'a str,
}

/// Messages arriving from the recognizer. Unknown message types decode to
/// [`RealtimeMessage::Unknown`] and are skipped by the driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeMessage {
    PartialTranscript {
        #[serde(default)]
        text: String,
    },
    CommittedTranscript {
        #[serde(default)]
        text: String,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_frame_serializes_base64_verbatim() {
        let frame = AudioFrame {
            audio_base64: "AAAA",
        };
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"audio_base64":"AAAA"}"#
        );
    }

    #[test]
    fn transcript_messages_decode() {
        let partial: RealtimeMessage =
            serde_json::from_str(r#"{"type":"partial_transcript","text":"hel"}"#).unwrap();
        assert_eq!(
            partial,
            RealtimeMessage::PartialTranscript { text: "hel".into() }
        );

        let committed: RealtimeMessage =
            serde_json::from_str(r#"{"type":"committed_transcript","text":"hello"}"#).unwrap();
        assert_eq!(
            committed,
            RealtimeMessage::CommittedTranscript {
                text: "hello".into()
            }
        );

        let error: RealtimeMessage =
            serde_json::from_str(r#"{"type":"error","message":"boom"}"#).unwrap();
        assert_eq!(
            error,
            RealtimeMessage::Error {
                message: "boom".into()
            }
        );
    }

    #[test]
    fn unknown_message_types_are_tolerated() {
        let message: RealtimeMessage =
            serde_json::from_str(r#"{"type":"session_started","session":"x"}"#).unwrap();
        assert_eq!(message, RealtimeMessage::Unknown);
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let message: RealtimeMessage =
            serde_json::from_str(r#"{"type":"partial_transcript"}"#).unwrap();
        assert_eq!(
            message,
            RealtimeMessage::PartialTranscript { text: String::new() }
        );
    }
}
