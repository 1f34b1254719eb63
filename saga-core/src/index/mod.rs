//! Vector index abstraction for story memory.
//!
//! One index entry per knowledge item or recorded segment, scoped to a
//! story namespace. Implementations live behind the [`VectorIndex`]
//! trait so the engine can run against Pinecone or the in-memory test
//! index interchangeably.

pub mod pinecone;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::story::StoryId;

/// Errors from vector index backends.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),

    /// API error from the backend
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Kinds of records held in the index.
///
/// Serialized under the metadata `type` field. Records written before a
/// kind was recorded read back as [`EntryKind::Memory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryKind {
    /// A piece of world lore.
    Lore,
    /// A character profile.
    Character,
    /// A recorded story segment.
    #[default]
    Memory,
}

impl EntryKind {
    /// Get the display name for this entry kind.
    pub fn name(&self) -> &'static str {
        match self {
            EntryKind::Lore => "Lore",
            EntryKind::Character => "Character",
            EntryKind::Memory => "Memory",
        }
    }
}

/// Metadata stored alongside each vector.
///
/// Writes always fill `text`, `kind`, and `timestamp`; reads tolerate
/// records with fields missing so older or hand-written entries still
/// retrieve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// The raw text this entry represents, rendered into retrieval
    /// digests.
    #[serde(default)]
    pub text: String,
    /// What kind of record this is.
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    /// Lore title, when the entry is lore.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
    /// Lore tags, when the entry is lore.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    /// Character name, when the entry is a character profile.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Character traits, when the entry is a character profile.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub traits: Vec<String>,
    /// The user prompt that produced the segment, when the entry is a
    /// memory.
    #[serde(
        rename = "userPrompt",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub user_prompt: Option<String>,
    /// When the entry was written.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl EntryMetadata {
    /// Metadata for a lore entry.
    pub fn lore(
        text: impl Into<String>,
        title: impl Into<String>,
        tags: Vec<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            kind: EntryKind::Lore,
            title: Some(title.into()),
            tags,
            name: None,
            traits: Vec::new(),
            user_prompt: None,
            timestamp: Some(timestamp),
        }
    }

    /// Metadata for a character profile entry.
    pub fn character(
        text: impl Into<String>,
        name: impl Into<String>,
        traits: Vec<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            kind: EntryKind::Character,
            title: None,
            tags: Vec::new(),
            name: Some(name.into()),
            traits,
            user_prompt: None,
            timestamp: Some(timestamp),
        }
    }

    /// Metadata for a recorded story segment.
    pub fn memory(
        text: impl Into<String>,
        user_prompt: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            kind: EntryKind::Memory,
            title: None,
            tags: Vec::new(),
            name: None,
            traits: Vec::new(),
            user_prompt: Some(user_prompt.into()),
            timestamp: Some(timestamp),
        }
    }
}

/// A vector plus its metadata, keyed by a stable entry ID.
///
/// Upserting the same `(story, id)` pair replaces the previous entry.
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: EntryMetadata,
}

impl IndexedEntry {
    pub fn new(id: impl Into<String>, vector: Vec<f32>, metadata: EntryMetadata) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
        }
    }
}

/// A single similarity match, in descending score order.
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<EntryMetadata>,
}

/// A namespaced vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace one entry in the story's namespace.
    async fn upsert(&self, story: &StoryId, entry: IndexedEntry) -> Result<(), IndexError>;

    /// Return the `top_k` nearest neighbors of `vector` within the
    /// story's namespace, best first.
    async fn query(
        &self,
        story: &StoryId,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, IndexError>;
}
