//! Context retrieval over the story's vector index.
//!
//! Embeds the retrieval query, asks the index for the nearest prior
//! entries, and renders them into a plain-text digest for the prompt.
//! Retrieval is strictly best-effort: a turn must never fail because
//! this step did.

use std::sync::Arc;

use tracing::warn;

use crate::index::{IndexMatch, VectorIndex};
use crate::llm::TextEmbedder;
use crate::story::StoryId;

/// Default number of neighbors to retrieve per turn.
pub(crate) const DEFAULT_TOP_K: usize = 5;

/// Separator between digest entries.
const DIGEST_SEPARATOR: &str = "\n\n---\n\n";

/// Retrieves relevant prior context for a turn.
pub struct ContextRetriever {
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl ContextRetriever {
    /// Create a retriever over the given embedder and index.
    pub fn new(embedder: Arc<dyn TextEmbedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set how many neighbors to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retrieve a digest of the entries most relevant to `query`.
    ///
    /// Returns entries in descending similarity order, each rendered as
    /// `[Kind]: text` and joined with a separator line. Any failure is
    /// logged and yields an empty digest so the turn can continue
    /// without retrieved context.
    pub async fn retrieve(&self, story: &StoryId, query: &str) -> String {
        let vector = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "retrieval query embedding failed, continuing without context");
                return String::new();
            }
        };

        let matches = match self.index.query(story, &vector, self.top_k).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "index query failed, continuing without context");
                return String::new();
            }
        };

        render_digest(&matches)
    }
}

/// Render matches into the digest format. Matches without metadata have
/// nothing to quote and are skipped.
fn render_digest(matches: &[IndexMatch]) -> String {
    matches
        .iter()
        .filter_map(|m| m.metadata.as_ref())
        .map(|metadata| format!("[{}]: {}", metadata.kind.name(), metadata.text))
        .collect::<Vec<_>>()
        .join(DIGEST_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{EntryKind, EntryMetadata};
    use crate::testing::{MemoryVectorIndex, StubEmbedder};
    use chrono::Utc;

    fn match_for(kind: EntryKind, text: &str, score: f32) -> IndexMatch {
        let mut metadata = EntryMetadata::memory(text, "prompt", Utc::now());
        metadata.kind = kind;
        IndexMatch {
            id: format!("{}-{}", kind.name(), score),
            score,
            metadata: Some(metadata),
        }
    }

    #[test]
    fn test_render_digest_format() {
        let matches = vec![
            match_for(EntryKind::Lore, "The tower predates the kingdom.", 0.9),
            match_for(EntryKind::Memory, "You arrived at dusk.", 0.8),
        ];

        assert_eq!(
            render_digest(&matches),
            "[Lore]: The tower predates the kingdom.\n\n---\n\n[Memory]: You arrived at dusk."
        );
    }

    #[test]
    fn test_render_digest_skips_matches_without_metadata() {
        let matches = vec![
            IndexMatch {
                id: "bare".to_string(),
                score: 0.9,
                metadata: None,
            },
            match_for(EntryKind::Memory, "You arrived at dusk.", 0.8),
        ];

        assert_eq!(render_digest(&matches), "[Memory]: You arrived at dusk.");
    }

    #[test]
    fn test_render_digest_empty() {
        assert_eq!(render_digest(&[]), "");
    }

    #[tokio::test]
    async fn test_retrieve_never_fails_on_embed_error() {
        let retriever = ContextRetriever::new(
            Arc::new(StubEmbedder::failing()),
            Arc::new(MemoryVectorIndex::new()),
        );

        let digest = retriever
            .retrieve(&StoryId::new("story-1"), "the gate")
            .await;
        assert_eq!(digest, "");
    }

    #[tokio::test]
    async fn test_retrieve_never_fails_on_query_error() {
        let index = MemoryVectorIndex::new();
        index.fail_queries(true);
        let retriever =
            ContextRetriever::new(Arc::new(StubEmbedder::new()), Arc::new(index));

        let digest = retriever
            .retrieve(&StoryId::new("story-1"), "the gate")
            .await;
        assert_eq!(digest, "");
    }
}
