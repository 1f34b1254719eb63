//! The story engine: wiring and orchestration.
//!
//! `StoryEngine` owns the pipeline components and exposes the two public
//! operations: indexing knowledge items and processing story turns. Each
//! operation is a single linear pipeline; the components decide which
//! failures are fatal and which degrade to a neutral default.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::error::{Error, Result};
use crate::extract::EntityExtractor;
use crate::generate::NarrativeGenerator;
use crate::index::{IndexedEntry, VectorIndex};
use crate::knowledge::KnowledgeItem;
use crate::llm::{TextEmbedder, TextGenerator};
use crate::persist::SegmentPersister;
use crate::prompt;
use crate::retrieve::{self, ContextRetriever};
use crate::segment::{NewSegment, SegmentId, StateUpdate};
use crate::store::SegmentStore;
use crate::story::{StoryId, StoryTurnContext};

// ============================================================================
// Configuration
// ============================================================================

/// Tuning knobs for the engine. `Default` matches the stock pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many index matches feed the context digest.
    pub retrieval_top_k: usize,
    /// Model override for entity extraction.
    pub extraction_model: Option<String>,
    /// Model override for narrative generation.
    pub narrative_model: Option<String>,
    /// Sampling temperature for narrative generation.
    pub temperature: Option<f32>,
    /// Output-token ceiling for narrative generation.
    pub max_output_tokens: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retrieval_top_k: retrieve::DEFAULT_TOP_K,
            extraction_model: None,
            narrative_model: None,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retrieval_top_k(mut self, top_k: usize) -> Self {
        self.retrieval_top_k = top_k;
        self
    }

    pub fn with_extraction_model(mut self, model: impl Into<String>) -> Self {
        self.extraction_model = Some(model.into());
        self
    }

    pub fn with_narrative_model(mut self, model: impl Into<String>) -> Self {
        self.narrative_model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: usize) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

// ============================================================================
// Turn response
// ============================================================================

/// The outcome of one processed story turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    /// Durable id of the stored segment.
    pub segment_id: SegmentId,
    /// The generated narrative text.
    pub text: String,
    /// The structured state delta, passed through uninterpreted.
    pub state_updates: StateUpdate,
}

// ============================================================================
// Engine
// ============================================================================

/// Orchestrates knowledge indexing and story turns over shared backends.
pub struct StoryEngine {
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
    extractor: EntityExtractor,
    retriever: ContextRetriever,
    generator: NarrativeGenerator,
    persister: SegmentPersister,
}

impl StoryEngine {
    /// Create an engine with the default configuration.
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        generator: Arc<dyn TextGenerator>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn SegmentStore>,
    ) -> Self {
        Self::with_config(embedder, generator, index, store, EngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(
        embedder: Arc<dyn TextEmbedder>,
        generator: Arc<dyn TextGenerator>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn SegmentStore>,
        config: EngineConfig,
    ) -> Self {
        let mut extractor = EntityExtractor::new(Arc::clone(&generator));
        if let Some(model) = config.extraction_model {
            extractor = extractor.with_model(model);
        }

        let retriever = ContextRetriever::new(Arc::clone(&embedder), Arc::clone(&index))
            .with_top_k(config.retrieval_top_k);

        let mut narrative = NarrativeGenerator::new(generator);
        if let Some(model) = config.narrative_model {
            narrative = narrative.with_model(model);
        }
        if let Some(temperature) = config.temperature {
            narrative = narrative.with_temperature(temperature);
        }
        if let Some(max_output_tokens) = config.max_output_tokens {
            narrative = narrative.with_max_output_tokens(max_output_tokens);
        }

        let persister =
            SegmentPersister::new(Arc::clone(&embedder), Arc::clone(&index), store);

        Self {
            embedder,
            index,
            extractor,
            retriever,
            generator: narrative,
            persister,
        }
    }

    /// Embed and index a knowledge item under the story's namespace.
    ///
    /// Re-indexing an item with the same id overwrites the previous entry
    /// in place. Inputs are validated before anything leaves the process.
    #[instrument(skip_all, fields(story = %story))]
    pub async fn index_knowledge(&self, story: &StoryId, item: &KnowledgeItem) -> Result<()> {
        if story.as_str().trim().is_empty() {
            return Err(Error::Validation("storyId"));
        }
        item.validate()?;

        let key = item.index_key();

        let vector = self
            .embedder
            .embed(&item.canonical_text())
            .await
            .map_err(|e| {
                error!(item = %key, error = %e, "knowledge embedding failed");
                Error::Indexing(e.to_string())
            })?;

        let entry = IndexedEntry::new(key.clone(), vector, item.metadata(Utc::now()));
        self.index.upsert(story, entry).await.map_err(|e| {
            error!(item = %key, error = %e, "knowledge upsert failed");
            Error::Indexing(e.to_string())
        })?;

        info!(item = %key, kind = item.kind().name(), "knowledge item indexed");
        Ok(())
    }

    /// Run one full story turn: extract entities from the prompt, retrieve
    /// related context, generate the narrative, and persist the result.
    ///
    /// Extraction and retrieval degrade to neutral defaults on failure;
    /// generation and the durable write are fatal.
    #[instrument(skip_all, fields(story = %story))]
    pub async fn process_turn(
        &self,
        story: &StoryId,
        user_prompt: &str,
        context: &StoryTurnContext,
    ) -> Result<TurnResponse> {
        if story.as_str().trim().is_empty() {
            return Err(Error::Validation("storyId"));
        }
        if user_prompt.trim().is_empty() {
            return Err(Error::Validation("userPrompt"));
        }

        let entities = self.extractor.extract(user_prompt).await;

        let query = if entities.is_empty() {
            user_prompt.to_string()
        } else {
            format!("{} Entities: {}", user_prompt, entities.join(", "))
        };
        let digest = self.retriever.retrieve(story, &query).await;

        let system = prompt::compose(context, &digest);
        let generated = self.generator.generate(&system, user_prompt).await?;

        let new = NewSegment::new(generated.text, user_prompt)
            .with_state_updates(generated.state_updates)
            .with_entities(entities);
        let segment = self.persister.persist(story, new).await?;

        info!(segment = %segment.id, "story turn processed");
        Ok(TurnResponse {
            segment_id: segment.id,
            text: segment.text,
            state_updates: segment.state_updates,
        })
    }
}
