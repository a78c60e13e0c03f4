//! Realtime streaming adapter over a WebSocket recognition backend.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::messages::{AudioFrame, RealtimeMessage};
use super::{InputCommand, SttEvent, SttInput, SttStream, StreamOptions, StreamingTranscriber};
use crate::config::SttConfig;
use crate::error::{Result, ServiceError};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// [`StreamingTranscriber`] over the vendor's realtime WebSocket API.
///
/// Each `connect` spawns one driver task that owns the socket for its
/// lifetime: inbound messages become [`SttEvent`]s, audio frames arrive
/// through the [`SttInput`] command channel. Dropping the input handle or
/// sending [`InputCommand::Close`] shuts the connection down.
pub struct RealtimeTranscriber {
    url: String,
    api_key: String,
    model_id: String,
    sample_rate: u32,
    vad_silence_secs: f32,
    vad_threshold: f32,
}

impl RealtimeTranscriber {
    pub fn new(config: &SttConfig) -> Self {
        Self {
            url: config.realtime_url.clone(),
            api_key: config.api_key.clone(),
            model_id: config.model_id.clone(),
            sample_rate: config.sample_rate,
            vad_silence_secs: config.vad_silence_secs,
            vad_threshold: config.vad_threshold,
        }
    }

    /// Connection URL with the model, language, and voice-activity commit
    /// parameters in the query string.
    fn connection_url(&self, language_code: &str) -> String {
        format!(
            "{}?model_id={}&language_code={}&sample_rate={}&commit_strategy=vad\
             &vad_silence_threshold_secs={}&vad_threshold={}",
            self.url,
            self.model_id,
            language_code,
            self.sample_rate,
            self.vad_silence_secs,
            self.vad_threshold
        )
    }
}

#[async_trait]
impl StreamingTranscriber for RealtimeTranscriber {
    async fn connect(&self, options: StreamOptions) -> Result<SttStream> {
        let url = self.connection_url(&options.language_code);

        let mut request = url
            .into_client_request()
            .map_err(|e| ServiceError::upstream("realtime connection request", e))?;
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| ServiceError::Internal(format!("invalid recognition api key: {e}")))?;
        request.headers_mut().insert("xi-api-key", key);

        let (socket, _) = connect_async(request)
            .await
            .map_err(|e| ServiceError::upstream("realtime connection", e))?;

        info!(
            "Realtime recognition connected (model {}, language {}, {}Hz)",
            self.model_id, options.language_code, self.sample_rate
        );

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (input_tx, input_rx) = mpsc::unbounded_channel();

        tokio::spawn(drive_connection(socket, event_tx, input_rx));

        Ok(SttStream {
            events: event_rx,
            input: SttInput::new(input_tx),
        })
    }
}

/// Owns one socket: pumps audio up and transcript events down until either
/// side goes away.
async fn drive_connection(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: mpsc::Sender<SttEvent>,
    mut input: mpsc::UnboundedReceiver<InputCommand>,
) {
    let (mut write, mut read) = socket.split();
    let _ = events.send(SttEvent::Opened).await;

    loop {
        tokio::select! {
            command = input.recv() => match command {
                Some(InputCommand::Audio(audio_base64)) => {
                    let frame = AudioFrame {
                        audio_base64: &audio_base64,
                    };
                    let payload = match serde_json::to_string(&frame) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("Failed to encode audio frame: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = write.send(Message::Text(payload)).await {
                        warn!("Failed to forward audio frame: {}", e);
                        let _ = events
                            .send(SttEvent::Error {
                                detail: format!("audio send failed: {e}"),
                            })
                            .await;
                    }
                }
                Some(InputCommand::Close) | None => {
                    let _ = write.close().await;
                    break;
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<RealtimeMessage>(&text) {
                        Ok(message) => forward(message, &events).await,
                        Err(_) => debug!("Unrecognized recognizer message: {}", text),
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Recognizer closed the connection");
                    break;
                }
                Some(Err(e)) => {
                    let _ = events
                        .send(SttEvent::Error {
                            detail: e.to_string(),
                        })
                        .await;
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = events.send(SttEvent::Closed).await;
}

/// Maps one recognizer message to an event. Empty and whitespace-only
/// transcript payloads are discarded here so no consumer ever sees them;
/// both recognizers are known to emit spurious empty commits.
async fn forward(message: RealtimeMessage, events: &mpsc::Sender<SttEvent>) {
    let event = match message {
        RealtimeMessage::PartialTranscript { text } if !text.trim().is_empty() => {
            SttEvent::Partial { text }
        }
        RealtimeMessage::CommittedTranscript { text } if !text.trim().is_empty() => {
            SttEvent::Committed { text }
        }
        RealtimeMessage::Error { message } => SttEvent::Error { detail: message },
        RealtimeMessage::PartialTranscript { .. } | RealtimeMessage::CommittedTranscript { .. } => {
            debug!("Discarding empty transcript payload");
            return;
        }
        RealtimeMessage::Unknown => return,
    };
    let _ = events.send(event).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcriber() -> RealtimeTranscriber {
        RealtimeTranscriber::new(&SttConfig {
            realtime_url: "wss://stt.example.com/realtime".to_string(),
            api_key: "stt-key".to_string(),
            model_id: "scribe_v2_realtime".to_string(),
            ..SttConfig::default()
        })
    }

    #[test]
    fn connection_url_carries_vad_parameters() {
        let url = transcriber().connection_url("en");
        assert!(url.starts_with("wss://stt.example.com/realtime?"));
        assert!(url.contains("model_id=scribe_v2_realtime"));
        assert!(url.contains("language_code=en"));
        assert!(url.contains("sample_rate=16000"));
        assert!(url.contains("commit_strategy=vad"));
        assert!(url.contains("vad_silence_threshold_secs=1"));
        assert!(url.contains("vad_threshold=0.3"));
    }

    #[tokio::test]
    async fn empty_transcripts_are_discarded() {
        let (tx, mut rx) = mpsc::channel(4);

        forward(
            RealtimeMessage::CommittedTranscript {
                text: "   ".into(),
            },
            &tx,
        )
        .await;
        forward(
            RealtimeMessage::CommittedTranscript {
                text: "hello".into(),
            },
            &tx,
        )
        .await;
        drop(tx);

        assert_eq!(
            rx.recv().await,
            Some(SttEvent::Committed {
                text: "hello".into()
            })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn recognizer_errors_are_forwarded() {
        let (tx, mut rx) = mpsc::channel(4);

        forward(
            RealtimeMessage::Error {
                message: "quota".into(),
            },
            &tx,
        )
        .await;
        drop(tx);

        assert_eq!(
            rx.recv().await,
            Some(SttEvent::Error {
                detail: "quota".into()
            })
        );
    }
}
