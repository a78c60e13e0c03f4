use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable recording state for a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    Recording,
    Completed,
    Failed,
}

/// A note record: one per recording session, durable across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub author_id: String,
    /// User-supplied title; never overwritten by AI output.
    pub title: String,
    /// Title generated from the transcript during finalization.
    pub ai_title: Option<String>,
    pub recording_status: RecordingStatus,
    pub language_code: String,
    pub keyword_pack_ids: Vec<String>,
    pub reference_doc_ids: Vec<String>,
    /// Full committed transcript (batch output after finalization).
    pub content: String,
    /// LLM-corrected rendition of `content`.
    pub formatted_content: String,
    pub summary: String,
    pub speakers: Vec<SpeakerSummary>,
    pub duration_seconds: u64,
    pub recording_url: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-speaker slice of a diarized transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerSummary {
    /// Raw diarization identifier from the transcription backend.
    pub id: String,
    /// Display name assigned in roster order ("Speaker 1", ...).
    pub label: String,
    pub text: String,
    pub word_count: usize,
}

/// Fields required to create a note; the store fills in the rest.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub author_id: String,
    pub title: String,
    pub language_code: String,
    pub keyword_pack_ids: Vec<String>,
    pub reference_doc_ids: Vec<String>,
}

/// Partial note update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub ai_title: Option<String>,
    pub recording_status: Option<RecordingStatus>,
    pub content: Option<String>,
    pub formatted_content: Option<String>,
    pub summary: Option<String>,
    pub speakers: Option<Vec<SpeakerSummary>>,
    pub duration_seconds: Option<u64>,
    pub recording_url: Option<String>,
    pub is_public: Option<bool>,
}

/// A vocabulary term a user wants recognized and canonicalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// How the term tends to be rendered phonetically ("ay-pee-eye").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic_pronunciation: Option<String>,
    /// Alternative names and spelled-out forms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

impl KeywordEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            phonetic_pronunciation: None,
            synonyms: Vec::new(),
        }
    }
}

/// A named collection of keyword entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordPack {
    pub id: String,
    pub author_id: String,
    pub name: String,
    pub keywords: Vec<KeywordEntry>,
}

/// Scraped reference material hints are matched against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub display_url: String,
    /// Plain-text scrape of the source page.
    pub content: String,
}
