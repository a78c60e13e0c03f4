// Shared test doubles for the session and finalization integration tests.
//
// Each collaborator trait gets a controllable fake: recognition events
// are pushed by the test through a StreamHandle, and upstream failures
// are armed with atomic flags.

// Not every test binary touches every helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scribe_live::auth::HmacTokenVerifier;
use scribe_live::config::SttConfig;
use scribe_live::error::{Result, ServiceError};
use scribe_live::finalize::FinalizationPipeline;
use scribe_live::llm::TextService;
use scribe_live::session::SessionManager;
use scribe_live::storage::ObjectStore;
use scribe_live::store::MemoryStore;
use scribe_live::stt::{
    BatchTranscript, BatchTranscriber, DiarizedWord, InputCommand, StreamOptions,
    StreamingTranscriber, SttEvent, SttInput, SttStream,
};
use tokio::sync::mpsc;

/// One scripted recognition connection, driven by the test.
pub struct StreamHandle {
    /// Push recognizer events into the session's pump.
    pub events: mpsc::Sender<SttEvent>,
    /// Commands the session sent over this connection.
    pub commands: mpsc::UnboundedReceiver<InputCommand>,
}

/// StreamingTranscriber double: every connect hands the test a handle.
#[derive(Default)]
pub struct FakeStreaming {
    handles: Mutex<VecDeque<StreamHandle>>,
    pub connects: AtomicUsize,
    fail_next: AtomicBool,
}

impl FakeStreaming {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_connect(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Handle for the oldest connection not yet claimed by the test.
    pub fn take_handle(&self) -> StreamHandle {
        self.handles
            .lock()
            .unwrap()
            .pop_front()
            .expect("no recognition connection was opened")
    }
}

#[async_trait]
impl StreamingTranscriber for FakeStreaming {
    async fn connect(&self, _options: StreamOptions) -> Result<SttStream> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Upstream("connect refused".to_string()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);

        let (event_tx, event_rx) = mpsc::channel(100);
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        self.handles.lock().unwrap().push_back(StreamHandle {
            events: event_tx,
            commands: input_rx,
        });
        Ok(SttStream {
            events: event_rx,
            input: SttInput::new(input_tx),
        })
    }
}

/// TextService double with per-pass failure switches.
#[derive(Default)]
pub struct FakeText {
    pub fail_correct: AtomicBool,
    pub fail_summary: AtomicBool,
    pub fail_title: AtomicBool,
}

impl FakeText {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl TextService for FakeText {
    async fn correct(&self, text: &str) -> Result<String> {
        if self.fail_correct.load(Ordering::SeqCst) {
            return Err(ServiceError::Upstream("correction offline".to_string()));
        }
        Ok(format!("{text} (corrected)"))
    }

    async fn summarize(&self, _text: &str) -> Result<String> {
        if self.fail_summary.load(Ordering::SeqCst) {
            return Err(ServiceError::Upstream("summary offline".to_string()));
        }
        Ok("A short summary.".to_string())
    }

    async fn title(&self, _text: &str) -> Result<String> {
        if self.fail_title.load(Ordering::SeqCst) {
            return Err(ServiceError::Upstream("title offline".to_string()));
        }
        Ok("Weekly Sync".to_string())
    }
}

/// BatchTranscriber double returning a canned transcript.
pub struct FakeBatch {
    pub transcript: Mutex<BatchTranscript>,
    pub fail: AtomicBool,
    /// (audio_url, language_code) per call.
    pub requests: Mutex<Vec<(String, String)>>,
}

impl FakeBatch {
    pub fn returning(text: &str, words: Vec<DiarizedWord>) -> Arc<Self> {
        Arc::new(Self {
            transcript: Mutex::new(BatchTranscript {
                text: text.to_string(),
                words,
            }),
            fail: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl BatchTranscriber for FakeBatch {
    async fn transcribe_url(
        &self,
        audio_url: &str,
        language_code: &str,
    ) -> Result<BatchTranscript> {
        self.requests
            .lock()
            .unwrap()
            .push((audio_url.to_string(), language_code.to_string()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Upstream("batch offline".to_string()));
        }
        Ok(self.transcript.lock().unwrap().clone())
    }
}

/// ObjectStore double recording every upload.
#[derive(Default)]
pub struct FakeStorage {
    /// (key, byte length, content type) per upload.
    pub puts: Mutex<Vec<(String, usize, String)>>,
    pub fail: AtomicBool,
}

impl FakeStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ObjectStore for FakeStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Upstream("storage offline".to_string()));
        }
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), bytes.len(), content_type.to_string()));
        Ok(format!("https://cdn.test/{key}"))
    }
}

/// A fully wired SessionManager over in-memory fakes.
pub struct TestHarness {
    pub manager: Arc<SessionManager>,
    pub store: Arc<MemoryStore>,
    pub verifier: Arc<HmacTokenVerifier>,
    pub streaming: Arc<FakeStreaming>,
    pub text: Arc<FakeText>,
    pub batch: Arc<FakeBatch>,
    pub storage: Arc<FakeStorage>,
}

pub fn harness() -> TestHarness {
    let store = Arc::new(MemoryStore::new());
    let verifier = Arc::new(HmacTokenVerifier::new("test-secret"));
    let streaming = FakeStreaming::new();
    let text = FakeText::new();
    let batch = FakeBatch::returning("the batch transcript", Vec::new());
    let storage = FakeStorage::new();

    let finalizer = FinalizationPipeline::new(
        storage.clone(),
        batch.clone(),
        text.clone(),
        store.clone(),
    );
    let manager = Arc::new(SessionManager::new(
        &SttConfig::default(),
        verifier.clone(),
        store.clone(),
        streaming.clone(),
        text.clone(),
        finalizer,
    ));

    TestHarness {
        manager,
        store,
        verifier,
        streaming,
        text,
        batch,
        storage,
    }
}

pub fn token(harness: &TestHarness, user_id: &str) -> String {
    harness
        .verifier
        .issue(user_id, 3600)
        .expect("token issuance")
}
