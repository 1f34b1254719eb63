//! Segment persistence and reindexing.
//!
//! The durable write is the turn's commit point. Embedding happens
//! first so an embedding outage aborts before anything is written;
//! reindexing happens after and is best-effort, since the segment is
//! already safe in the store.

use std::sync::Arc;

use tracing::{error, warn};

use crate::error::{Error, Result};
use crate::index::{EntryMetadata, IndexedEntry, VectorIndex};
use crate::llm::TextEmbedder;
use crate::segment::{NewSegment, Segment};
use crate::store::SegmentStore;
use crate::story::StoryId;

/// Records generated segments durably and in the vector index.
pub struct SegmentPersister {
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn SegmentStore>,
}

impl SegmentPersister {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn SegmentStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
        }
    }

    /// Record one generated segment.
    ///
    /// Embeds the narrative text (fatal on failure), appends the
    /// segment to the durable store (fatal), then indexes it as a
    /// memory entry keyed by the assigned segment ID (best-effort).
    pub async fn persist(&self, story: &StoryId, new: NewSegment) -> Result<Segment> {
        let vector = self.embedder.embed(&new.text).await.map_err(|e| {
            error!(error = %e, "embedding failed for generated segment");
            Error::Embedding(e.to_string())
        })?;

        let segment = self.store.append(story, new).await.map_err(|e| {
            error!(error = %e, "durable write failed for generated segment");
            Error::Persistence(e.to_string())
        })?;

        // The index entry reuses the store-assigned creation time so
        // the two records of this segment never disagree.
        let metadata =
            EntryMetadata::memory(&segment.text, &segment.user_prompt, segment.created_at);
        let entry = IndexedEntry::new(segment.id.to_string(), vector, metadata);
        if let Err(e) = self.index.upsert(story, entry).await {
            warn!(
                segment = %segment.id,
                error = %e,
                "segment stored but not indexed; it will not surface in retrieval"
            );
        }

        Ok(segment)
    }
}
