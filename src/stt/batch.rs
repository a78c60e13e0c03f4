//! Batch transcription with diarization, used once per finalization.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::{BatchTranscriber, BatchTranscript};
use crate::config::SttConfig;
use crate::error::{Result, ServiceError};

/// [`BatchTranscriber`] over the vendor's HTTP speech-to-text endpoint.
///
/// The audio is referenced by its already-uploaded URL rather than
/// re-transferred, and diarization is always requested.
pub struct HttpBatchTranscriber {
    url: String,
    api_key: String,
    model_id: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    model_id: &'a str,
    cloud_storage_url: &'a str,
    language_code: &'a str,
    diarize: bool,
}

impl HttpBatchTranscriber {
    pub fn new(config: &SttConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.batch_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Internal(format!("failed to build STT client: {e}")))?;

        Ok(Self {
            url: config.batch_url.clone(),
            api_key: config.api_key.clone(),
            model_id: config.batch_model_id.clone(),
            http,
        })
    }
}

#[async_trait]
impl BatchTranscriber for HttpBatchTranscriber {
    async fn transcribe_url(
        &self,
        audio_url: &str,
        language_code: &str,
    ) -> Result<BatchTranscript> {
        let request = BatchRequest {
            model_id: &self.model_id,
            cloud_storage_url: audio_url,
            language_code,
            diarize: true,
        };

        let response = self
            .http
            .post(&self.url)
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::upstream("batch transcription request", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream(format!(
                "batch transcription returned {status}: {body}"
            )));
        }

        let transcript: BatchTranscript = response
            .json()
            .await
            .map_err(|e| ServiceError::upstream("batch transcription decode", e))?;

        info!(
            "Batch transcript received ({} chars, {} words)",
            transcript.text.len(),
            transcript.words.len()
        );

        Ok(transcript)
    }
}

impl std::fmt::Debug for HttpBatchTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBatchTranscriber")
            .field("url", &self.url)
            .field("model_id", &self.model_id)
            .field("api_key", &"***")
            .finish()
    }
}
