//! QA tests for knowledge indexing using in-memory backends.
//!
//! These tests verify that lore entries and character profiles:
//! - Land under the story's namespace with the expected key and metadata
//! - Are embedded from their canonical text layout
//! - Overwrite in place on re-index
//! - Are validated before anything leaves the process
//!
//! Run with: `cargo test -p saga-core --test qa_knowledge_indexing`

use std::sync::Arc;

use saga_core::testing::{MemorySegmentStore, MemoryVectorIndex, StubEmbedder, StubGenerator};
use saga_core::{
    CharacterItem, EntryKind, Error, KnowledgeItem, LoreItem, StoryEngine, StoryId,
};

fn engine(embedder: &Arc<StubEmbedder>, index: &Arc<MemoryVectorIndex>) -> StoryEngine {
    StoryEngine::new(
        embedder.clone(),
        Arc::new(StubGenerator::new()),
        index.clone(),
        Arc::new(MemorySegmentStore::new()),
    )
}

// =============================================================================
// LORE ENTRIES
// =============================================================================

#[tokio::test]
async fn test_lore_entry_lands_under_story_namespace() {
    let embedder = Arc::new(StubEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let engine = engine(&embedder, &index);

    let story = StoryId::new("story-1");
    let lore = LoreItem::new("gate", "The east gate has been sealed for a century.")
        .with_title("The East Gate")
        .with_tags(["gates", "defenses"]);
    engine
        .index_knowledge(&story, &KnowledgeItem::from(lore))
        .await
        .expect("indexing should succeed");

    // The embedder saw the canonical layout, not the raw body.
    assert_eq!(
        embedder.embedded_texts()[0],
        "Lore: The East Gate\nTags: gates, defenses\nThe east gate has been sealed for a century."
    );

    // The stored metadata keeps the raw body for digest rendering.
    let entry = index.entry(&story, "lore_gate").expect("entry should exist");
    assert_eq!(entry.metadata.kind, EntryKind::Lore);
    assert_eq!(entry.metadata.text, "The east gate has been sealed for a century.");
    assert_eq!(entry.metadata.title.as_deref(), Some("The East Gate"));
    assert_eq!(entry.metadata.tags, vec!["gates", "defenses"]);
}

// =============================================================================
// CHARACTER PROFILES
// =============================================================================

#[tokio::test]
async fn test_character_profile_lands_under_story_namespace() {
    let embedder = Arc::new(StubEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let engine = engine(&embedder, &index);

    let story = StoryId::new("story-1");
    let character = CharacterItem::new("mira", "A scout who distrusts the guild.")
        .with_name("Mira")
        .with_traits(["sharp-eyed", "cautious"]);
    engine
        .index_knowledge(&story, &KnowledgeItem::from(character))
        .await
        .expect("indexing should succeed");

    assert_eq!(
        embedder.embedded_texts()[0],
        "Character: Mira\nTraits: sharp-eyed, cautious\nA scout who distrusts the guild."
    );

    let entry = index
        .entry(&story, "character_mira")
        .expect("entry should exist");
    assert_eq!(entry.metadata.kind, EntryKind::Character);
    assert_eq!(entry.metadata.text, "A scout who distrusts the guild.");
    assert_eq!(entry.metadata.name.as_deref(), Some("Mira"));
    assert_eq!(entry.metadata.traits, vec!["sharp-eyed", "cautious"]);
}

// =============================================================================
// OVERWRITE AND ISOLATION
// =============================================================================

#[tokio::test]
async fn test_reindexing_overwrites_in_place() {
    let embedder = Arc::new(StubEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let engine = engine(&embedder, &index);

    let story = StoryId::new("story-1");
    let first = LoreItem::new("gate", "The gate is sealed.");
    engine
        .index_knowledge(&story, &KnowledgeItem::from(first))
        .await
        .unwrap();

    let second = LoreItem::new("gate", "The gate was breached last night.");
    engine
        .index_knowledge(&story, &KnowledgeItem::from(second))
        .await
        .unwrap();

    assert_eq!(index.entry_count(&story), 1);
    let entry = index.entry(&story, "lore_gate").unwrap();
    assert_eq!(entry.metadata.text, "The gate was breached last night.");
}

#[tokio::test]
async fn test_stories_are_isolated() {
    let embedder = Arc::new(StubEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let engine = engine(&embedder, &index);

    let lore = |text: &str| KnowledgeItem::from(LoreItem::new("gate", text));
    engine
        .index_knowledge(&StoryId::new("story-a"), &lore("Gate lore for story A."))
        .await
        .unwrap();
    engine
        .index_knowledge(&StoryId::new("story-b"), &lore("Gate lore for story B."))
        .await
        .unwrap();

    let a = index.entry(&StoryId::new("story-a"), "lore_gate").unwrap();
    let b = index.entry(&StoryId::new("story-b"), "lore_gate").unwrap();
    assert_eq!(a.metadata.text, "Gate lore for story A.");
    assert_eq!(b.metadata.text, "Gate lore for story B.");
    assert_eq!(index.entry_count(&StoryId::new("story-a")), 1);
    assert_eq!(index.entry_count(&StoryId::new("story-b")), 1);
}

// =============================================================================
// VALIDATION AND FAILURES
// =============================================================================

#[tokio::test]
async fn test_missing_fields_rejected_before_any_call() {
    let embedder = Arc::new(StubEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let engine = engine(&embedder, &index);
    let story = StoryId::new("story-1");

    let err = engine
        .index_knowledge(&story, &KnowledgeItem::from(LoreItem::new("", "Some lore.")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation("loreId")));

    let err = engine
        .index_knowledge(&story, &KnowledgeItem::from(LoreItem::new("gate", "  ")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation("text")));

    let err = engine
        .index_knowledge(&story, &KnowledgeItem::from(CharacterItem::new("", "A scout.")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation("characterId")));

    let err = engine
        .index_knowledge(&story, &KnowledgeItem::from(CharacterItem::new("mira", "")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation("profileText")));

    assert_eq!(embedder.calls(), 0);
    assert_eq!(index.entry_count(&story), 0);
}

#[tokio::test]
async fn test_upsert_failure_reported_as_indexing() {
    let embedder = Arc::new(StubEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    index.fail_upserts(true);
    let engine = engine(&embedder, &index);

    let err = engine
        .index_knowledge(
            &StoryId::new("story-1"),
            &KnowledgeItem::from(LoreItem::new("gate", "Some lore.")),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Indexing(_)));
    assert_eq!(err.to_string(), "failed to index knowledge item");
}
