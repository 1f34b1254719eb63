//! Durable segment storage.
//!
//! The engine records every generated segment through the
//! [`SegmentStore`] trait. The provided [`JsonSegmentStore`] keeps one
//! append-only JSON-lines file per story under a data directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::segment::{NewSegment, Segment};
use crate::story::StoryId;

/// Errors from segment stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Append-only durable record of story segments.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Durably record one segment, assigning its ID and creation time.
    async fn append(&self, story: &StoryId, new: NewSegment) -> Result<Segment, StoreError>;

    /// All recorded segments for a story, oldest first.
    async fn list(&self, story: &StoryId) -> Result<Vec<Segment>, StoreError>;
}

/// File-backed segment store: one JSON-lines file per story.
///
/// Each append writes one whole line with `O_APPEND`, so concurrent
/// appends to the same story do not interleave within a record.
pub struct JsonSegmentStore {
    dir: PathBuf,
}

impl JsonSegmentStore {
    /// Create a store rooted at the given data directory. The directory
    /// is created on first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn story_path(&self, story: &StoryId) -> PathBuf {
        self.dir.join(format!("{}.jsonl", encode_story_key(story)))
    }
}

/// Encode a story ID into a filename stem.
///
/// Alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`. The encoding is injective, so distinct story IDs never share
/// a file.
fn encode_story_key(story: &StoryId) -> String {
    let mut encoded = String::with_capacity(story.as_str().len());
    for byte in story.as_str().bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[async_trait]
impl SegmentStore for JsonSegmentStore {
    async fn append(&self, story: &StoryId, new: NewSegment) -> Result<Segment, StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let segment = Segment::record(story.clone(), new);
        let mut line = serde_json::to_string(&segment)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.story_path(story))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(segment)
    }

    async fn list(&self, story: &StoryId) -> Result<Vec<Segment>, StoreError> {
        let content = match fs::read_to_string(self.story_path(story)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut segments = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            segments.push(serde_json::from_str(line)?);
        }
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_story_key_is_injective() {
        assert_eq!(encode_story_key(&StoryId::new("story-1")), "story-1");
        assert_eq!(encode_story_key(&StoryId::new("a/b")), "a%2Fb");
        assert_ne!(
            encode_story_key(&StoryId::new("a/b")),
            encode_story_key(&StoryId::new("a_b"))
        );
        assert_ne!(
            encode_story_key(&StoryId::new("../x")),
            encode_story_key(&StoryId::new("__x"))
        );
    }

    #[tokio::test]
    async fn test_append_assigns_identity_and_lists_in_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonSegmentStore::new(temp_dir.path());
        let story = StoryId::new("story-1");

        let first = store
            .append(&story, NewSegment::new("You wake.", "wake up"))
            .await
            .unwrap();
        let second = store
            .append(&story, NewSegment::new("You stand.", "stand up"))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);

        let segments = store.list(&story).await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, first.id);
        assert_eq!(segments[1].id, second.id);
        assert!(segments[0].created_at <= segments[1].created_at);
    }

    #[tokio::test]
    async fn test_list_unknown_story_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonSegmentStore::new(temp_dir.path());

        let segments = store.list(&StoryId::new("nobody")).await.unwrap();
        assert!(segments.is_empty());
    }

    #[tokio::test]
    async fn test_segments_survive_store_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let story = StoryId::new("story-1");

        let written = {
            let store = JsonSegmentStore::new(temp_dir.path());
            store
                .append(&story, NewSegment::new("You wake.", "wake up"))
                .await
                .unwrap()
        };

        let reopened = JsonSegmentStore::new(temp_dir.path());
        let segments = reopened.list(&story).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].id, written.id);
        assert_eq!(segments[0].text, "You wake.");
    }

    #[tokio::test]
    async fn test_stories_are_isolated() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonSegmentStore::new(temp_dir.path());

        store
            .append(&StoryId::new("story-a"), NewSegment::new("A.", "a"))
            .await
            .unwrap();
        store
            .append(&StoryId::new("story-b"), NewSegment::new("B.", "b"))
            .await
            .unwrap();

        let a = store.list(&StoryId::new("story-a")).await.unwrap();
        let b = store.list(&StoryId::new("story-b")).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a[0].text, "A.");
        assert_eq!(b[0].text, "B.");
    }
}
