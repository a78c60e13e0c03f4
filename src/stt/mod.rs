//! Speech-recognition collaborators: the realtime streaming adapter that
//! feeds live sessions and the batch adapter used at finalization.

mod batch;
mod messages;
mod stream;

pub use batch::HttpBatchTranscriber;
pub use messages::RealtimeMessage;
pub use stream::RealtimeTranscriber;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::{Result, ServiceError};

/// One event from a live streaming connection.
#[derive(Debug, Clone, PartialEq)]
pub enum SttEvent {
    /// The connection is established and accepting audio.
    Opened,
    /// An in-progress hypothesis for the current segment.
    Partial { text: String },
    /// A segment closed by the voice-activity commit strategy.
    Committed { text: String },
    /// A recognizer-side failure. The connection may still be usable;
    /// the session decides whether to keep going.
    Error { detail: String },
    /// The connection is gone; no further events follow.
    Closed,
}

/// Per-connection options supplied by the session.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub language_code: String,
}

/// Commands from the session to the connection driver task.
#[derive(Debug)]
pub enum InputCommand {
    /// Forward one audio frame, base64-encoded exactly as received.
    Audio(String),
    Close,
}

/// Write half of a live streaming connection.
#[derive(Debug, Clone)]
pub struct SttInput {
    tx: mpsc::UnboundedSender<InputCommand>,
}

impl SttInput {
    pub fn new(tx: mpsc::UnboundedSender<InputCommand>) -> Self {
        Self { tx }
    }

    /// Queues one frame for the recognizer. Fails only when the driver
    /// task has exited; the caller logs and carries on.
    pub fn send_audio(&self, audio_base64: String) -> Result<()> {
        self.tx
            .send(InputCommand::Audio(audio_base64))
            .map_err(|_| ServiceError::Upstream("streaming connection is closed".to_string()))
    }

    pub fn close(&self) {
        let _ = self.tx.send(InputCommand::Close);
    }
}

/// A live streaming connection: transcript events out, audio frames in.
pub struct SttStream {
    pub events: mpsc::Receiver<SttEvent>,
    pub input: SttInput,
}

/// Opens realtime recognition connections.
#[async_trait]
pub trait StreamingTranscriber: Send + Sync {
    /// Connects and returns the event receiver plus the input handle.
    async fn connect(&self, options: StreamOptions) -> Result<SttStream>;
}

/// A finished batch transcript with word-level speaker attribution.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchTranscript {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<DiarizedWord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiarizedWord {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub speaker_id: Option<String>,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
}

/// Batch recognition over previously uploaded audio.
#[async_trait]
pub trait BatchTranscriber: Send + Sync {
    /// Transcribes the audio behind `audio_url` with diarization enabled.
    async fn transcribe_url(&self, audio_url: &str, language_code: &str)
        -> Result<BatchTranscript>;
}
