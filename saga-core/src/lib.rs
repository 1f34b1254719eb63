//! Retrieval-augmented story engine.
//!
//! This crate provides:
//! - A turn pipeline: entity extraction, context retrieval, prompt
//!   composition, structured narrative generation, persistence
//! - Per-story knowledge indexing for lore and character profiles
//! - Pluggable generation, embedding, index, and storage backends
//! - Deterministic in-memory backends for testing
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use gemini::Gemini;
//! use pinecone::Pinecone;
//! use saga_core::{
//!     JsonSegmentStore, KnowledgeItem, LoreItem, StoryEngine, StoryId, StoryTurnContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gemini = Arc::new(Gemini::from_env()?);
//!     let index = Arc::new(Pinecone::from_env()?);
//!     let store = Arc::new(JsonSegmentStore::new("./stories"));
//!
//!     let engine = StoryEngine::new(gemini.clone(), gemini, index, store);
//!
//!     let story = StoryId::new("demo");
//!     let lore = LoreItem::new("gate", "The east gate has been sealed for a century.")
//!         .with_title("The East Gate");
//!     engine.index_knowledge(&story, &KnowledgeItem::from(lore)).await?;
//!
//!     let response = engine
//!         .process_turn(&story, "I approach the east gate.", &StoryTurnContext::default())
//!         .await?;
//!     println!("{}", response.text);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod knowledge;
pub mod llm;
pub mod persist;
pub mod prompt;
pub mod retrieve;
pub mod segment;
pub mod store;
pub mod story;
pub mod testing;

// Primary public API
pub use engine::{EngineConfig, StoryEngine, TurnResponse};
pub use error::{Error, Result};
pub use knowledge::{CharacterItem, KnowledgeItem, LoreItem};
pub use segment::{NewSegment, RelationshipChange, Segment, SegmentId, StateUpdate};
pub use story::{CharacterState, StoryId, StoryTurnContext};

// Backend seams
pub use index::{EntryKind, EntryMetadata, IndexError, IndexMatch, IndexedEntry, VectorIndex};
pub use llm::{GenerationRequest, LlmError, TextEmbedder, TextGenerator};
pub use store::{JsonSegmentStore, SegmentStore, StoreError};

// Pipeline components, for callers wiring their own flow
pub use extract::EntityExtractor;
pub use generate::{GeneratedSegment, NarrativeGenerator};
pub use persist::SegmentPersister;
pub use retrieve::ContextRetriever;
