//! Language-model collaborator: the correction, summary, and title passes
//! share one OpenAI-compatible chat client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Result, ServiceError};
use crate::normalize::{CORRECTION_PROMPT, SUMMARY_PROMPT, TITLE_PROMPT};

/// Text passes backed by a language model.
///
/// All three are best-effort from the caller's point of view: an `Err`
/// means the pass is skipped, never that the transcript is lost.
#[async_trait]
pub trait TextService: Send + Sync {
    /// Correction pass over one committed segment or a full transcript.
    async fn correct(&self, text: &str) -> Result<String>;

    /// Short summary of a full transcript.
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Display title for a full transcript.
    async fn title(&self, text: &str) -> Result<String>;
}

/// [`TextService`] against an OpenAI-compatible `/chat/completions`
/// endpoint. Every request carries the configured timeout; timeouts and
/// non-2xx responses surface as [`ServiceError::Upstream`].
pub struct ChatTextService {
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatTextService {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Internal(format!("failed to build LLM client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            http,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.3,
        };

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::upstream("chat completion request", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream(format!(
                "chat completion returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::upstream("chat completion decode", e))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ServiceError::Upstream(
                "chat completion returned no content".to_string(),
            ));
        }

        Ok(content)
    }
}

#[async_trait]
impl TextService for ChatTextService {
    async fn correct(&self, text: &str) -> Result<String> {
        debug!("Requesting correction pass ({} chars)", text.len());
        self.chat(CORRECTION_PROMPT, text).await
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        debug!("Requesting summary ({} chars)", text.len());
        self.chat(SUMMARY_PROMPT, text).await
    }

    async fn title(&self, text: &str) -> Result<String> {
        debug!("Requesting title ({} chars)", text.len());
        self.chat(TITLE_PROMPT, text).await
    }
}

impl std::fmt::Debug for ChatTextService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTextService")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"***")
            .finish()
    }
}
