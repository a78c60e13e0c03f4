use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Result as AnyResult;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::audio::RecordingBuffer;
use crate::detect::{HintMatcher, KeywordMatcher};
use crate::error::{Result, ServiceError};
use crate::session::events::ServerMessage;
use crate::session::Feature;
use crate::stt::SttInput;
use crate::vocab::VocabularyIndex;

/// Lifecycle of a registered session. A session only appears in the
/// registry between its first channel attach and its removal, so the
/// durable-only phases (created but never attached, finalized,
/// cancelled) have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Recording,
    Paused,
    Stopping,
}

/// In-memory state for one live recording session
pub struct LiveSession {
    /// Durable note id; doubles as the session id
    pub id: String,

    /// User who created the note and may attach, stop, or cancel
    pub owner_id: String,

    /// BCP-47 language code passed to the recognizer
    pub language_code: String,

    /// Vocabulary substitutions built from the session's keyword packs
    pub vocab: VocabularyIndex,

    /// Keyword detector built from the session's keyword packs
    pub keywords: KeywordMatcher,

    /// Hint detector built from the session's reference documents
    pub hints: HintMatcher,

    /// Whether keyword detection runs on committed segments
    keywords_enabled: AtomicBool,

    /// Whether hint detection runs on committed segments
    hints_enabled: AtomicBool,

    /// Current lifecycle state
    state: Mutex<SessionState>,

    /// Raw PCM retained for the final re-transcription upload
    audio: Mutex<RecordingBuffer>,

    /// Committed transcript accumulated across the whole session
    transcript: Mutex<String>,

    /// Outbound event channel for the currently attached client, if any
    sink: Mutex<Option<mpsc::UnboundedSender<ServerMessage>>>,

    /// Write half of the live recognition connection, if any
    stt_input: Mutex<Option<SttInput>>,

    /// Bumped on every sink attach so stale channel closes are ignored
    attach_generation: AtomicU64,
}

impl LiveSession {
    pub fn new(
        id: String,
        owner_id: String,
        language_code: String,
        sample_rate: u32,
        vocab: VocabularyIndex,
        keywords: KeywordMatcher,
        hints: HintMatcher,
    ) -> Self {
        Self {
            id,
            owner_id,
            language_code,
            vocab,
            keywords,
            hints,
            keywords_enabled: AtomicBool::new(true),
            hints_enabled: AtomicBool::new(true),
            state: Mutex::new(SessionState::Recording),
            audio: Mutex::new(RecordingBuffer::new(sample_rate)),
            transcript: Mutex::new(String::new()),
            sink: Mutex::new(None),
            stt_input: Mutex::new(None),
            attach_generation: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    pub async fn set_state(&self, state: SessionState) {
        *self.state.lock().await = state;
    }

    /// Claim the session for finalization. Returns false when another
    /// caller already did, so finalization runs at most once.
    pub async fn begin_stop(&self) -> bool {
        let mut state = self.state.lock().await;
        if *state == SessionState::Stopping {
            return false;
        }
        *state = SessionState::Stopping;
        true
    }

    pub fn feature_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Keywords => self.keywords_enabled.load(Ordering::Relaxed),
            Feature::Hints => self.hints_enabled.load(Ordering::Relaxed),
        }
    }

    pub fn set_feature(&self, feature: Feature, enabled: bool) {
        match feature {
            Feature::Keywords => self.keywords_enabled.store(enabled, Ordering::Relaxed),
            Feature::Hints => self.hints_enabled.store(enabled, Ordering::Relaxed),
        }
    }

    /// Point outbound events at a new channel, superseding any previous
    /// one. Returns the attach generation the channel task must present
    /// when detaching, so a stale close cannot tear down a newer
    /// attachment.
    pub async fn attach_sink(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> u64 {
        *self.sink.lock().await = Some(tx);
        self.attach_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_generation(&self) -> u64 {
        self.attach_generation.load(Ordering::SeqCst)
    }

    pub async fn clear_sink(&self) {
        *self.sink.lock().await = None;
    }

    /// Deliver one event to the attached channel. Events with no channel
    /// to carry them are dropped, not errors.
    pub async fn send(&self, message: ServerMessage) {
        let sink = self.sink.lock().await;
        match sink.as_ref() {
            Some(tx) => {
                if tx.send(message).is_err() {
                    debug!("[{}] Dropping event for closed channel", self.id);
                }
            }
            None => debug!("[{}] Dropping event; no channel attached", self.id),
        }
    }

    pub async fn set_stt_input(&self, input: Option<SttInput>) {
        *self.stt_input.lock().await = input;
    }

    /// Close the recognition connection if one is live.
    pub async fn close_stt(&self) {
        if let Some(input) = self.stt_input.lock().await.take() {
            input.close();
        }
    }

    pub async fn push_audio(&self, frame: &[u8]) {
        self.audio.lock().await.push_frame(frame);
    }

    pub async fn forward_audio(&self, audio_base64: String) -> Result<()> {
        let input = self.stt_input.lock().await;
        match input.as_ref() {
            Some(input) => input.send_audio(audio_base64),
            None => Err(ServiceError::Upstream(
                "no live recognition connection".to_string(),
            )),
        }
    }

    pub async fn append_transcript(&self, text: &str) {
        let mut transcript = self.transcript.lock().await;
        transcript.push_str(text);
        transcript.push(' ');
    }

    /// The committed transcript accumulated so far, trimmed.
    pub async fn transcript(&self) -> String {
        self.transcript.lock().await.trim().to_string()
    }

    pub async fn encode_wav(&self) -> AnyResult<Vec<u8>> {
        self.audio.lock().await.to_wav()
    }

    pub async fn audio_duration_seconds(&self) -> u64 {
        self.audio.lock().await.duration_seconds()
    }
}
