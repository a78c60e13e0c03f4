use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::types::{
    KeywordEntry, KeywordPack, NewNote, Note, NoteUpdate, RecordingStatus, ReferenceDocument,
};
use super::MetadataStore;
use crate::error::{Result, ServiceError};

/// In-memory metadata store (note id → record, etc.).
#[derive(Default)]
pub struct MemoryStore {
    notes: RwLock<HashMap<String, Note>>,
    packs: RwLock<HashMap<String, KeywordPack>>,
    docs: RwLock<HashMap<String, ReferenceDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn create_note(&self, new: NewNote) -> Result<Note> {
        let now = Utc::now();
        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            author_id: new.author_id,
            title: new.title,
            ai_title: None,
            recording_status: RecordingStatus::Recording,
            language_code: new.language_code,
            keyword_pack_ids: new.keyword_pack_ids,
            reference_doc_ids: new.reference_doc_ids,
            content: String::new(),
            formatted_content: String::new(),
            summary: String::new(),
            speakers: Vec::new(),
            duration_seconds: 0,
            recording_url: None,
            is_public: false,
            created_at: now,
            updated_at: now,
        };

        let mut notes = self.notes.write().await;
        notes.insert(note.id.clone(), note.clone());
        Ok(note)
    }

    async fn get_note(&self, id: &str) -> Result<Option<Note>> {
        let notes = self.notes.read().await;
        Ok(notes.get(id).cloned())
    }

    async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<Note> {
        let mut notes = self.notes.write().await;
        let note = notes
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(format!("note {id}")))?;

        if let Some(ai_title) = update.ai_title {
            note.ai_title = Some(ai_title);
        }
        if let Some(status) = update.recording_status {
            note.recording_status = status;
        }
        if let Some(content) = update.content {
            note.content = content;
        }
        if let Some(formatted) = update.formatted_content {
            note.formatted_content = formatted;
        }
        if let Some(summary) = update.summary {
            note.summary = summary;
        }
        if let Some(speakers) = update.speakers {
            note.speakers = speakers;
        }
        if let Some(duration) = update.duration_seconds {
            note.duration_seconds = duration;
        }
        if let Some(url) = update.recording_url {
            note.recording_url = Some(url);
        }
        if let Some(is_public) = update.is_public {
            note.is_public = is_public;
        }
        note.updated_at = Utc::now();

        Ok(note.clone())
    }

    async fn delete_note(&self, id: &str) -> Result<()> {
        let mut notes = self.notes.write().await;
        notes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("note {id}")))
    }

    async fn create_keyword_pack(
        &self,
        author_id: &str,
        name: &str,
        keywords: Vec<KeywordEntry>,
    ) -> Result<KeywordPack> {
        let pack = KeywordPack {
            id: uuid::Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            name: name.to_string(),
            keywords,
        };

        let mut packs = self.packs.write().await;
        packs.insert(pack.id.clone(), pack.clone());
        Ok(pack)
    }

    async fn get_keyword_pack(&self, id: &str) -> Result<Option<KeywordPack>> {
        let packs = self.packs.read().await;
        Ok(packs.get(id).cloned())
    }

    async fn delete_keyword_pack(&self, id: &str) -> Result<()> {
        let mut packs = self.packs.write().await;
        packs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("keyword pack {id}")))
    }

    async fn create_reference_doc(
        &self,
        author_id: &str,
        title: &str,
        display_url: &str,
        content: &str,
    ) -> Result<ReferenceDocument> {
        let doc = ReferenceDocument {
            id: uuid::Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            title: title.to_string(),
            display_url: display_url.to_string(),
            content: content.to_string(),
        };

        let mut docs = self.docs.write().await;
        docs.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn get_reference_doc(&self, id: &str) -> Result<Option<ReferenceDocument>> {
        let docs = self.docs.read().await;
        Ok(docs.get(id).cloned())
    }

    async fn delete_reference_doc(&self, id: &str) -> Result<()> {
        let mut docs = self.docs.write().await;
        docs.remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("reference document {id}")))
    }
}
