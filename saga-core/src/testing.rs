//! Testing utilities for the story engine.
//!
//! This module provides deterministic in-process backends:
//! - `StubGenerator` returns scripted responses without API calls
//! - `StubEmbedder` produces stable bag-of-words vectors
//! - `MemoryVectorIndex` and `MemorySegmentStore` hold data in memory
//!   and can be told to fail on demand
//!
//! All four are usable wherever the real backends are, so a full
//! engine can run end to end inside a test.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::index::{IndexError, IndexMatch, IndexedEntry, VectorIndex};
use crate::llm::{GenerationRequest, LlmError, TextEmbedder, TextGenerator};
use crate::segment::{NewSegment, Segment};
use crate::store::{SegmentStore, StoreError};
use crate::story::StoryId;

// ============================================================================
// StubGenerator
// ============================================================================

/// A generator that returns scripted responses in order.
///
/// Responses are consumed one per call, across whatever the engine uses
/// the generator for (entity extraction first, then narrative, within
/// one turn). An empty queue fails the call loudly, so a test that
/// under-scripts shows up as a generation error rather than a silent
/// wrong answer.
pub struct StubGenerator {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<GenerationRequest>>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubGenerator {
    /// Create a stub with an empty script.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a stub that fails every call.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Queue a raw response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(response.into());
        self
    }

    /// Queue a well-formed narrative JSON response with the given text
    /// and no state updates.
    pub fn with_narrative(self, text: &str) -> Self {
        self.with_response(
            serde_json::json!({ "text": text, "state_updates": {} }).to_string(),
        )
    }

    /// How many times the generator was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any call was made.
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if self.fail {
            return Err(LlmError::Network("scripted failure".to_string()));
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Api {
                status: 599,
                message: "no scripted response left".to_string(),
            })
    }
}

// ============================================================================
// StubEmbedder
// ============================================================================

/// Default dimension of stub vectors.
const STUB_EMBEDDING_DIM: usize = 32;

/// A deterministic embedder: hashed bag-of-words, L2-normalized.
///
/// Texts sharing words get similar vectors, so retrieval ordering in
/// tests tracks word overlap.
pub struct StubEmbedder {
    fail: bool,
    dim: usize,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self {
            fail: false,
            dim: STUB_EMBEDDING_DIM,
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        }
    }

    /// Create an embedder that fails every call.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    /// How many times the embedder was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text passed to `embed`, in call order.
    pub fn embedded_texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextEmbedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(LlmError::Network("scripted failure".to_string()));
        }
        Ok(bag_of_words(text, self.dim))
    }
}

fn bag_of_words(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dim];
    for token in text.to_lowercase().split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric());
        if token.is_empty() {
            continue;
        }
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let bucket = (hasher.finish() as usize) % dim;
        vector[bucket] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

// ============================================================================
// MemoryVectorIndex
// ============================================================================

/// In-memory vector index with per-story namespaces and cosine ranking.
pub struct MemoryVectorIndex {
    namespaces: DashMap<String, Vec<IndexedEntry>>,
    fail_upserts: AtomicBool,
    fail_queries: AtomicBool,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            namespaces: DashMap::new(),
            fail_upserts: AtomicBool::new(false),
            fail_queries: AtomicBool::new(false),
        }
    }

    /// Make subsequent upserts fail.
    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent queries fail.
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of entries in a story's namespace.
    pub fn entry_count(&self, story: &StoryId) -> usize {
        self.namespaces
            .get(story.as_str())
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Look up one entry by its key.
    pub fn entry(&self, story: &StoryId, id: &str) -> Option<IndexedEntry> {
        self.namespaces
            .get(story.as_str())
            .and_then(|entries| entries.iter().find(|e| e.id == id).cloned())
    }
}

impl Default for MemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, story: &StoryId, entry: IndexedEntry) -> Result<(), IndexError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(IndexError::Backend("scripted failure".to_string()));
        }

        let mut entries = self
            .namespaces
            .entry(story.as_str().to_string())
            .or_default();
        if let Some(existing) = entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry;
        } else {
            entries.push(entry);
        }
        Ok(())
    }

    async fn query(
        &self,
        story: &StoryId,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, IndexError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(IndexError::Backend("scripted failure".to_string()));
        }

        let Some(entries) = self.namespaces.get(story.as_str()) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<IndexMatch> = entries
            .iter()
            .map(|entry| IndexMatch {
                id: entry.id.clone(),
                score: cosine(vector, &entry.vector),
                metadata: Some(entry.metadata.clone()),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }
}

// ============================================================================
// MemorySegmentStore
// ============================================================================

/// In-memory segment store with per-story collections.
pub struct MemorySegmentStore {
    segments: DashMap<String, Vec<Segment>>,
    fail_appends: AtomicBool,
}

impl MemorySegmentStore {
    pub fn new() -> Self {
        Self {
            segments: DashMap::new(),
            fail_appends: AtomicBool::new(false),
        }
    }

    /// Make subsequent appends fail.
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of segments recorded for a story.
    pub fn segment_count(&self, story: &StoryId) -> usize {
        self.segments
            .get(story.as_str())
            .map(|segments| segments.len())
            .unwrap_or(0)
    }
}

impl Default for MemorySegmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SegmentStore for MemorySegmentStore {
    async fn append(&self, story: &StoryId, new: NewSegment) -> Result<Segment, StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("scripted failure".to_string()));
        }

        let segment = Segment::record(story.clone(), new);
        self.segments
            .entry(story.as_str().to_string())
            .or_default()
            .push(segment.clone());
        Ok(segment)
    }

    async fn list(&self, story: &StoryId) -> Result<Vec<Segment>, StoreError> {
        let mut segments = self
            .segments
            .get(story.as_str())
            .map(|segments| segments.clone())
            .unwrap_or_default();
        segments.sort_by_key(|segment| segment.created_at);
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::EntryMetadata;
    use chrono::Utc;

    #[test]
    fn test_bag_of_words_is_deterministic_and_normalized() {
        let a = bag_of_words("the old tower", STUB_EMBEDDING_DIM);
        let b = bag_of_words("the old tower", STUB_EMBEDDING_DIM);
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_word_overlap_scores_higher() {
        let tower = bag_of_words("the old tower on the hill", STUB_EMBEDDING_DIM);
        let query = bag_of_words("what is the old tower", STUB_EMBEDDING_DIM);
        let unrelated = bag_of_words("fish market prices", STUB_EMBEDDING_DIM);

        assert!(cosine(&query, &tower) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_memory_index_upsert_replaces() {
        let index = MemoryVectorIndex::new();
        let story = StoryId::new("story-1");
        let metadata = EntryMetadata::memory("first", "p", Utc::now());
        index
            .upsert(
                &story,
                IndexedEntry::new("k", vec![1.0, 0.0], metadata.clone()),
            )
            .await
            .unwrap();

        let metadata = EntryMetadata::memory("second", "p", Utc::now());
        index
            .upsert(&story, IndexedEntry::new("k", vec![0.0, 1.0], metadata))
            .await
            .unwrap();

        assert_eq!(index.entry_count(&story), 1);
        assert_eq!(index.entry(&story, "k").unwrap().metadata.text, "second");
    }

    #[tokio::test]
    async fn test_memory_index_ranks_by_similarity() {
        let index = MemoryVectorIndex::new();
        let story = StoryId::new("story-1");
        let now = Utc::now();
        index
            .upsert(
                &story,
                IndexedEntry::new("near", vec![1.0, 0.0], EntryMetadata::memory("near", "p", now)),
            )
            .await
            .unwrap();
        index
            .upsert(
                &story,
                IndexedEntry::new("far", vec![0.0, 1.0], EntryMetadata::memory("far", "p", now)),
            )
            .await
            .unwrap();

        let matches = index.query(&story, &[1.0, 0.1], 2).await.unwrap();
        assert_eq!(matches[0].id, "near");
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn test_memory_index_namespaces_are_isolated() {
        let index = MemoryVectorIndex::new();
        let now = Utc::now();
        index
            .upsert(
                &StoryId::new("a"),
                IndexedEntry::new("k", vec![1.0], EntryMetadata::memory("a-text", "p", now)),
            )
            .await
            .unwrap();

        let matches = index.query(&StoryId::new("b"), &[1.0], 5).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_stub_generator_scripts_in_order() {
        let generator = StubGenerator::new()
            .with_response("first")
            .with_response("second");

        let first = generator
            .generate(GenerationRequest::new("a"))
            .await
            .unwrap();
        let second = generator
            .generate(GenerationRequest::new("b"))
            .await
            .unwrap();
        assert_eq!(first, "first");
        assert_eq!(second, "second");
        assert_eq!(generator.calls(), 2);

        let err = generator.generate(GenerationRequest::new("c")).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_append_and_list() {
        let store = MemorySegmentStore::new();
        let story = StoryId::new("story-1");

        store
            .append(&story, NewSegment::new("one", "p1"))
            .await
            .unwrap();
        store
            .append(&story, NewSegment::new("two", "p2"))
            .await
            .unwrap();

        let segments = store.list(&story).await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "one");
        assert_eq!(segments[1].text, "two");
    }
}
