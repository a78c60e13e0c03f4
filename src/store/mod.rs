//! Durable metadata storage boundary.
//!
//! Notes, keyword packs, and reference documents live in an external
//! store; this module defines the interface the session engine consumes
//! and an in-memory implementation suitable for a single instance and
//! for tests. A database-backed store slots in behind the same trait.

mod memory;
mod types;

pub use memory::MemoryStore;
pub use types::{
    KeywordEntry, KeywordPack, NewNote, Note, NoteUpdate, RecordingStatus, ReferenceDocument,
    SpeakerSummary,
};

use crate::error::Result;
use async_trait::async_trait;

/// Typed access to the durable metadata records.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn create_note(&self, new: NewNote) -> Result<Note>;
    async fn get_note(&self, id: &str) -> Result<Option<Note>>;
    /// Apply a partial update; fails with `NotFound` if the note is gone.
    async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<Note>;
    async fn delete_note(&self, id: &str) -> Result<()>;

    async fn create_keyword_pack(
        &self,
        author_id: &str,
        name: &str,
        keywords: Vec<KeywordEntry>,
    ) -> Result<KeywordPack>;
    async fn get_keyword_pack(&self, id: &str) -> Result<Option<KeywordPack>>;
    async fn delete_keyword_pack(&self, id: &str) -> Result<()>;

    async fn create_reference_doc(
        &self,
        author_id: &str,
        title: &str,
        display_url: &str,
        content: &str,
    ) -> Result<ReferenceDocument>;
    async fn get_reference_doc(&self, id: &str) -> Result<Option<ReferenceDocument>>;
    async fn delete_reference_doc(&self, id: &str) -> Result<()>;
}
