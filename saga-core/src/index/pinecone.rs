//! Pinecone-backed vector index.
//!
//! Pinecone metadata is arbitrary JSON; entries written by this engine
//! always hold an [`EntryMetadata`](super::EntryMetadata) document.
//! Reads tolerate foreign records by dropping metadata that does not
//! decode.

use async_trait::async_trait;
use pinecone::{Pinecone, QueryRequest, Vector};
use tracing::warn;

use super::{IndexError, IndexMatch, IndexedEntry, VectorIndex};
use crate::story::StoryId;

impl From<pinecone::Error> for IndexError {
    fn from(error: pinecone::Error) -> Self {
        match error {
            pinecone::Error::NoApiKey => {
                IndexError::Backend("API key not configured".to_string())
            }
            pinecone::Error::NoHost => {
                IndexError::Backend("index host not configured".to_string())
            }
            pinecone::Error::Network(message) => IndexError::Network(message),
            pinecone::Error::Api { status, message } => IndexError::Api { status, message },
            pinecone::Error::Parse(message) => IndexError::Parse(message),
            pinecone::Error::Config(message) => IndexError::Backend(message),
        }
    }
}

#[async_trait]
impl VectorIndex for Pinecone {
    async fn upsert(&self, story: &StoryId, entry: IndexedEntry) -> Result<(), IndexError> {
        let metadata = serde_json::to_value(&entry.metadata)
            .map_err(|e| IndexError::Parse(e.to_string()))?;
        let vector = Vector::new(entry.id, entry.vector).with_metadata(metadata);

        Pinecone::upsert(self, story.as_str(), vec![vector]).await?;
        Ok(())
    }

    async fn query(
        &self,
        story: &StoryId,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, IndexError> {
        let request = QueryRequest::new(vector.to_vec())
            .with_top_k(top_k)
            .with_metadata();
        let matches = Pinecone::query(self, story.as_str(), request).await?;

        Ok(matches
            .into_iter()
            .map(|m| {
                let metadata = m.metadata.and_then(|value| {
                    serde_json::from_value(value)
                        .map_err(|e| {
                            warn!(id = %m.id, error = %e, "dropping undecodable index metadata")
                        })
                        .ok()
                });
                IndexMatch {
                    id: m.id,
                    score: m.score,
                    metadata,
                }
            })
            .collect())
    }
}
