//! Finalization pipeline: turns a stopped session's buffered audio into
//! the durable note record via upload, batch re-transcription with
//! diarization, and the post-processing passes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{Result, ServiceError};
use crate::llm::TextService;
use crate::session::LiveSession;
use crate::storage::ObjectStore;
use crate::store::{MetadataStore, NoteUpdate, RecordingStatus, SpeakerSummary};
use crate::stt::{BatchTranscriber, DiarizedWord};

/// What a successful finalization produced, returned to the stop caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizationResult {
    pub recording_url: String,
    pub duration_seconds: u64,
    pub text: String,
    pub formatted_text: String,
    pub summary: String,
    pub title: String,
    pub speakers: Vec<SpeakerSummary>,
}

pub struct FinalizationPipeline {
    storage: Arc<dyn ObjectStore>,
    batch: Arc<dyn BatchTranscriber>,
    text: Arc<dyn TextService>,
    store: Arc<dyn MetadataStore>,
}

impl FinalizationPipeline {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        batch: Arc<dyn BatchTranscriber>,
        text: Arc<dyn TextService>,
        store: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            storage,
            batch,
            text,
            store,
        }
    }

    /// Run the full pipeline for a stopped session. On failure the note
    /// is marked failed before the error propagates.
    pub async fn run(&self, session: &LiveSession) -> Result<FinalizationResult> {
        match self.finalize(session).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("[{}] Finalization failed: {}", session.id, e);
                let update = NoteUpdate {
                    recording_status: Some(RecordingStatus::Failed),
                    ..Default::default()
                };
                if let Err(update_err) = self.store.update_note(&session.id, update).await {
                    error!("[{}] Failed to mark note as failed: {}", session.id, update_err);
                }
                Err(e)
            }
        }
    }

    async fn finalize(&self, session: &LiveSession) -> Result<FinalizationResult> {
        let wav = session
            .encode_wav()
            .await
            .map_err(|e| ServiceError::Internal(format!("audio encoding failed: {e:#}")))?;
        let duration_seconds = session.audio_duration_seconds().await;
        info!(
            "[{}] Finalizing: {} bytes of audio, {}s",
            session.id,
            wav.len(),
            duration_seconds
        );

        let key = format!("recordings/{}.wav", session.id);
        let recording_url = self.storage.put(&key, wav, "audio/wav").await?;

        let transcript = self
            .batch
            .transcribe_url(&recording_url, &session.language_code)
            .await?;
        let text = transcript.text.trim().to_string();
        let speakers = speaker_roster(&transcript.words);
        info!(
            "[{}] Batch transcript: {} chars, {} speakers",
            session.id,
            text.len(),
            speakers.len()
        );

        // Post-processing is best-effort: a failed pass degrades its own
        // field and nothing else.
        let (formatted_text, summary, title) = if text.is_empty() {
            (String::new(), String::new(), String::new())
        } else {
            let formatted_text = match self.text.correct(&text).await {
                Ok(formatted) => formatted,
                Err(e) => {
                    warn!("[{}] Correction pass failed: {}", session.id, e);
                    text.clone()
                }
            };
            let (summary, title) = tokio::join!(
                self.text.summarize(&formatted_text),
                self.text.title(&formatted_text),
            );
            let summary = summary.unwrap_or_else(|e| {
                warn!("[{}] Summary pass failed: {}", session.id, e);
                String::new()
            });
            let title = title.unwrap_or_else(|e| {
                warn!("[{}] Title pass failed: {}", session.id, e);
                String::new()
            });
            (formatted_text, summary, title)
        };

        self.store
            .update_note(
                &session.id,
                NoteUpdate {
                    ai_title: (!title.is_empty()).then(|| title.clone()),
                    recording_status: Some(RecordingStatus::Completed),
                    content: Some(text.clone()),
                    formatted_content: Some(formatted_text.clone()),
                    summary: Some(summary.clone()),
                    speakers: Some(speakers.clone()),
                    duration_seconds: Some(duration_seconds),
                    recording_url: Some(recording_url.clone()),
                    ..Default::default()
                },
            )
            .await?;
        info!("[{}] Session finalized", session.id);

        Ok(FinalizationResult {
            recording_url,
            duration_seconds,
            text,
            formatted_text,
            summary,
            title,
            speakers,
        })
    }
}

/// Group diarized words into per-speaker summaries. Labels are assigned
/// in sorted raw-id order so reruns produce the same roster.
fn speaker_roster(words: &[DiarizedWord]) -> Vec<SpeakerSummary> {
    let mut by_speaker: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for word in words {
        let Some(speaker_id) = word.speaker_id.as_deref() else {
            continue;
        };
        if word.text.trim().is_empty() {
            continue;
        }
        by_speaker.entry(speaker_id).or_default().push(&word.text);
    }

    by_speaker
        .into_iter()
        .enumerate()
        .map(|(index, (id, words))| SpeakerSummary {
            id: id.to_string(),
            label: format!("Speaker {}", index + 1),
            text: words.join(" "),
            word_count: words.len(),
        })
        .collect()
}
