use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use serde::Deserialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::auth::TokenVerifier;
use crate::config::SttConfig;
use crate::detect::{HintMatcher, KeywordMatcher};
use crate::error::{Result, ServiceError};
use crate::finalize::{FinalizationPipeline, FinalizationResult};
use crate::llm::TextService;
use crate::session::events::ServerMessage;
use crate::session::session::{LiveSession, SessionState};
use crate::session::Feature;
use crate::store::{KeywordEntry, KeywordPack, MetadataStore, NewNote, ReferenceDocument};
use crate::stt::{StreamOptions, StreamingTranscriber, SttEvent};
use crate::vocab::VocabularyIndex;

/// Title used when a session is created without one.
const DEFAULT_TITLE: &str = "Untitled Recording";

/// Control-plane request to create a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSession {
    pub title: Option<String>,
    pub language_code: Option<String>,
    #[serde(default)]
    pub keyword_pack_ids: Vec<String>,
    #[serde(default)]
    pub reference_doc_ids: Vec<String>,
}

/// What a successful channel attach hands back to the transport layer.
#[derive(Debug)]
pub struct AttachedSession {
    pub session_id: String,
    /// Present this when detaching; a stale close is ignored.
    pub generation: u64,
    pub events: mpsc::UnboundedReceiver<ServerMessage>,
}

/// Registry of live sessions plus the collaborators they orchestrate.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<LiveSession>>>,
    verifier: Arc<dyn TokenVerifier>,
    store: Arc<dyn MetadataStore>,
    streaming: Arc<dyn StreamingTranscriber>,
    text: Arc<dyn TextService>,
    finalizer: FinalizationPipeline,
    default_language: String,
    sample_rate: u32,
}

impl SessionManager {
    pub fn new(
        stt: &SttConfig,
        verifier: Arc<dyn TokenVerifier>,
        store: Arc<dyn MetadataStore>,
        streaming: Arc<dyn StreamingTranscriber>,
        text: Arc<dyn TextService>,
        finalizer: FinalizationPipeline,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            verifier,
            store,
            streaming,
            text,
            finalizer,
            default_language: stt.default_language.clone(),
            sample_rate: stt.sample_rate,
        }
    }

    /// Create the durable note backing a future session and return its id.
    pub async fn create_session(&self, owner_id: &str, request: CreateSession) -> Result<String> {
        let title = match request.title.as_deref() {
            None | Some("") => DEFAULT_TITLE.to_string(),
            Some(provided) => {
                let trimmed = provided.trim();
                if trimmed.is_empty() {
                    return Err(ServiceError::Validation(
                        "title must not be blank".to_string(),
                    ));
                }
                trimmed.to_string()
            }
        };
        let language_code = request
            .language_code
            .unwrap_or_else(|| self.default_language.clone());

        let note = self
            .store
            .create_note(NewNote {
                author_id: owner_id.to_string(),
                title,
                language_code,
                keyword_pack_ids: request.keyword_pack_ids,
                reference_doc_ids: request.reference_doc_ids,
            })
            .await?;
        info!("[{}] Session created for user {}", note.id, owner_id);
        Ok(note.id)
    }

    /// Authenticate a channel and connect it to the session, going live
    /// on first attach and resuming or rejoining on later ones.
    pub async fn attach(self: &Arc<Self>, session_id: &str, token: &str) -> Result<AttachedSession> {
        let user_id = self
            .verifier
            .verify(token)
            .ok_or_else(|| ServiceError::Unauthorized("missing or invalid token".to_string()))?;

        if let Some(session) = self.get_live(session_id).await {
            return self.reattach(session, &user_id).await;
        }

        let note = self
            .store
            .get_note(session_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("session {session_id}")))?;
        if note.author_id != user_id {
            return Err(ServiceError::Forbidden(format!(
                "session {session_id} belongs to another user"
            )));
        }

        let packs = self.load_packs(&note.keyword_pack_ids).await?;
        let docs = self.load_docs(&note.reference_doc_ids).await?;
        let entries: Vec<KeywordEntry> = packs
            .iter()
            .flat_map(|pack| pack.keywords.iter().cloned())
            .collect();
        let keyword_count = entries.len();
        let doc_count = docs.len();

        let vocab = VocabularyIndex::build(&packs);
        let keywords = KeywordMatcher::new(&entries);
        let hints = HintMatcher::new(docs);

        let stream = self
            .streaming
            .connect(StreamOptions {
                language_code: note.language_code.clone(),
            })
            .await?;

        let session = Arc::new(LiveSession::new(
            note.id.clone(),
            note.author_id.clone(),
            note.language_code.clone(),
            self.sample_rate,
            vocab,
            keywords,
            hints,
        ));
        session.set_stt_input(Some(stream.input.clone())).await;

        // Two first attaches can race past the registry check above; the
        // loser hands its fresh connection back and joins the winner.
        let lost_to = {
            let mut sessions = self.sessions.write().await;
            match sessions.get(&note.id) {
                Some(existing) => Some(Arc::clone(existing)),
                None => {
                    sessions.insert(note.id.clone(), Arc::clone(&session));
                    None
                }
            }
        };
        if let Some(existing) = lost_to {
            stream.input.close();
            return self.reattach(existing, &user_id).await;
        }

        // The pump starts only once the channel is wired up, so ready is
        // always the first event a client sees.
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = session.attach_sink(tx).await;
        session
            .send(ServerMessage::Ready {
                session_id: note.id.clone(),
            })
            .await;
        self.spawn_event_pump(Arc::clone(&session), stream.events);
        info!(
            "[{}] Session started for user {} ({} keywords, {} documents)",
            note.id, user_id, keyword_count, doc_count
        );

        Ok(AttachedSession {
            session_id: note.id,
            generation,
            events: rx,
        })
    }

    async fn reattach(
        self: &Arc<Self>,
        session: Arc<LiveSession>,
        user_id: &str,
    ) -> Result<AttachedSession> {
        if session.owner_id != user_id {
            return Err(ServiceError::Forbidden(format!(
                "session {} belongs to another user",
                session.id
            )));
        }

        // A paused session needs a fresh recognition connection; a live
        // one keeps the connection it has.
        let mut resumed_events = None;
        if session.state().await == SessionState::Paused {
            let stream = self
                .streaming
                .connect(StreamOptions {
                    language_code: session.language_code.clone(),
                })
                .await?;
            session.set_stt_input(Some(stream.input.clone())).await;
            session.set_state(SessionState::Recording).await;
            resumed_events = Some(stream.events);
            info!("[{}] Session resumed", session.id);
        } else {
            info!("[{}] Client reattached to live session", session.id);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let generation = session.attach_sink(tx).await;
        session
            .send(ServerMessage::Ready {
                session_id: session.id.clone(),
            })
            .await;
        if let Some(events) = resumed_events {
            self.spawn_event_pump(Arc::clone(&session), events);
        }

        Ok(AttachedSession {
            session_id: session.id.clone(),
            generation,
            events: rx,
        })
    }

    /// Buffer one audio frame and forward it to the recognizer. Forward
    /// failures are logged, not fatal; the buffered copy is what the
    /// final transcript is built from.
    pub async fn ingest_audio(&self, session_id: &str, audio_base64: &str) -> Result<()> {
        let session = self
            .get_live(session_id)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("session {session_id}")))?;

        let frame = base64::engine::general_purpose::STANDARD
            .decode(audio_base64)
            .map_err(|e| ServiceError::Validation(format!("audio frame is not valid base64: {e}")))?;
        session.push_audio(&frame).await;

        if let Err(e) = session.forward_audio(audio_base64.to_string()).await {
            warn!("[{}] Audio forward failed: {}", session_id, e);
        }
        Ok(())
    }

    /// Toggle a detection feature and acknowledge over the channel.
    pub async fn set_feature(&self, session_id: &str, feature: Feature, enabled: bool) -> Result<()> {
        let session = self
            .get_live(session_id)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("session {session_id}")))?;
        session.set_feature(feature, enabled);
        session.send(ServerMessage::feature_status(feature, enabled)).await;
        info!(
            "[{}] {:?} detection {}",
            session_id,
            feature,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Stop a live session and run finalization. Exactly one caller wins;
    /// a stop that arrives during or after finalization sees not-found.
    pub async fn stop(&self, session_id: &str, caller_id: &str) -> Result<FinalizationResult> {
        let session = self
            .get_live(session_id)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("session {session_id}")))?;
        if session.owner_id != caller_id {
            return Err(ServiceError::Forbidden(format!(
                "session {session_id} belongs to another user"
            )));
        }
        if !session.begin_stop().await {
            return Err(ServiceError::NotFound(format!(
                "session {session_id} is already stopping"
            )));
        }

        session.close_stt().await;
        let result = self.finalizer.run(&session).await;

        // The registry entry goes away whether finalization succeeded or
        // not; the note carries the durable outcome either way.
        self.sessions.write().await.remove(session_id);
        session.clear_sink().await;

        result
    }

    /// Discard a session and its note. Works whether or not a live
    /// session exists, as long as the note does and the caller owns it.
    pub async fn cancel(&self, session_id: &str, caller_id: &str) -> Result<()> {
        let note = self
            .store
            .get_note(session_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("session {session_id}")))?;
        if note.author_id != caller_id {
            return Err(ServiceError::Forbidden(format!(
                "session {session_id} belongs to another user"
            )));
        }

        let live = self.sessions.write().await.remove(session_id);
        if let Some(session) = live {
            session.close_stt().await;
            session.clear_sink().await;
            info!("[{}] Live session discarded", session_id);
        }

        self.store.delete_note(session_id).await?;
        info!("[{}] Session cancelled", session_id);
        Ok(())
    }

    /// React to a channel going away: pause the session so audio capture
    /// can resume later. Closes from superseded channels are ignored.
    pub async fn detach(&self, session_id: &str, generation: u64) {
        let Some(session) = self.get_live(session_id).await else {
            return;
        };
        if session.current_generation() != generation {
            debug!("[{}] Ignoring close from superseded channel", session_id);
            return;
        }
        if session.state().await == SessionState::Recording {
            session.set_state(SessionState::Paused).await;
            session.close_stt().await;
            session.clear_sink().await;
            info!("[{}] Channel closed; session paused", session_id);
        }
    }

    pub async fn get_live(&self, session_id: &str) -> Option<Arc<LiveSession>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn load_packs(&self, ids: &[String]) -> Result<Vec<KeywordPack>> {
        let mut packs = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get_keyword_pack(id).await? {
                Some(pack) => packs.push(pack),
                None => warn!("Keyword pack {} is gone; continuing without it", id),
            }
        }
        Ok(packs)
    }

    async fn load_docs(&self, ids: &[String]) -> Result<Vec<ReferenceDocument>> {
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get_reference_doc(id).await? {
                Some(doc) => docs.push(doc),
                None => warn!("Reference document {} is gone; continuing without it", id),
            }
        }
        Ok(docs)
    }

    /// Drive recognition events into session state and client events.
    fn spawn_event_pump(
        self: &Arc<Self>,
        session: Arc<LiveSession>,
        mut events: mpsc::Receiver<SttEvent>,
    ) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    SttEvent::Opened => {
                        debug!("[{}] Recognition connection ready", session.id);
                    }
                    SttEvent::Partial { text } => {
                        session.send(ServerMessage::partial(text)).await;
                    }
                    SttEvent::Committed { text } => {
                        manager.handle_committed(&session, text).await;
                    }
                    SttEvent::Error { detail } => {
                        warn!("[{}] Recognition error: {}", session.id, detail);
                        session.send(ServerMessage::error(detail)).await;
                    }
                    SttEvent::Closed => {
                        debug!("[{}] Recognition connection closed", session.id);
                    }
                }
            }
        });
    }

    /// A committed segment: substitute vocabulary, record it, emit it,
    /// run detection, and kick off the async correction pass.
    async fn handle_committed(self: &Arc<Self>, session: &Arc<LiveSession>, raw: String) {
        let text = session.vocab.apply(&raw);
        session.append_transcript(&text).await;
        session.send(ServerMessage::committed(text.clone())).await;

        if session.feature_enabled(Feature::Keywords) && !session.keywords.is_empty() {
            let keywords = session.keywords.scan(&text);
            if !keywords.is_empty() {
                session.send(ServerMessage::Keywords { keywords }).await;
            }
        }
        if session.feature_enabled(Feature::Hints) && !session.hints.is_empty() {
            let hints = session.hints.scan(&text);
            if !hints.is_empty() {
                session.send(ServerMessage::Hints { hints }).await;
            }
        }

        // The correction pass runs off the hot path. Its result is only
        // delivered if the session is still registered when it lands.
        let manager = Arc::clone(self);
        let session_id = session.id.clone();
        tokio::spawn(async move {
            match manager.text.correct(&text).await {
                Ok(formatted) => match manager.get_live(&session_id).await {
                    Some(session) => session.send(ServerMessage::formatted(formatted)).await,
                    None => {
                        debug!("[{}] Dropping correction for retired session", session_id);
                    }
                },
                Err(e) => warn!("[{}] Correction pass failed: {}", session_id, e),
            }
        });
    }
}
