//! End-to-end story engine walkthrough on in-memory backends.
//!
//! Runs without any API keys: generation is scripted and the index and
//! store live in memory. Swap in `Gemini` and `Pinecone` clients for the
//! real thing.

use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use saga_core::testing::{MemorySegmentStore, MemoryVectorIndex, StubEmbedder, StubGenerator};
use saga_core::{
    CharacterItem, CharacterState, KnowledgeItem, LoreItem, SegmentStore, StoryEngine, StoryId,
    StoryTurnContext,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    println!("=== Story Engine Demo ===\n");

    // Script: one extraction + one narrative response per turn.
    let generator = Arc::new(
        StubGenerator::new()
            .with_response("the east gate, Veldharrow")
            .with_response(
                serde_json::json!({
                    "text": "The east gate towers over you, its iron bands rusted into \
                             the stone. Through a gap near the hinge you catch torchlight \
                             moving on the far side.",
                    "state_updates": { "mood_change": "uneasy", "location_change": "East Gate" }
                })
                .to_string(),
            )
            .with_response("the gap, torchlight")
            .with_response(
                serde_json::json!({
                    "text": "You press your eye to the gap. A patrol passes within arm's \
                             reach, close enough to smell the pitch on their torches.",
                    "state_updates": { "health_change": 0.0, "skill_usage": ["stealth"] }
                })
                .to_string(),
            ),
    );
    let embedder = Arc::new(StubEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let store = Arc::new(MemorySegmentStore::new());

    let engine = StoryEngine::new(
        embedder.clone(),
        generator.clone(),
        index.clone(),
        store.clone(),
    );

    let story = StoryId::new("demo-story");

    // 1. Seed the story's knowledge base
    println!("1. Indexing world knowledge...");
    let lore = LoreItem::new(
        "east-gate",
        "The east gate of Veldharrow has been sealed since the siege a century ago.",
    )
    .with_title("The East Gate")
    .with_tags(["gates", "veldharrow"]);
    engine.index_knowledge(&story, &KnowledgeItem::from(lore)).await?;

    let scout = CharacterItem::new("mira", "A scout who distrusts the guild.")
        .with_name("Mira")
        .with_traits(["sharp-eyed", "cautious"]);
    engine.index_knowledge(&story, &KnowledgeItem::from(scout)).await?;
    println!("   {} entries indexed", index.entry_count(&story));

    // 2. First turn
    println!("\n2. Processing first turn...");
    let context = StoryTurnContext::new()
        .with_world_notes("The walled city of Veldharrow, a century after the siege.")
        .with_character(
            CharacterState::new("Mira")
                .with_health(0.8)
                .with_mood("Wary")
                .with_location("Outside the east gate"),
        );

    let response = engine
        .process_turn(&story, "I approach the east gate with Mira.", &context)
        .await?;
    println!("   Narrative: {}", response.text);
    println!("   Segment: {}", response.segment_id);
    println!("   State updates: {:?}", response.state_updates);

    // 3. Second turn; the first is now retrievable memory
    println!("\n3. Processing second turn...");
    let response = engine
        .process_turn(&story, "I look through the gap by the hinge.", &context)
        .await?;
    println!("   Narrative: {}", response.text);
    println!("   State updates: {:?}", response.state_updates);

    // 4. Inspect the durable record
    println!("\n4. Stored segments:");
    for segment in store.list(&story).await? {
        println!("   [{}] {}: {}", segment.created_at, segment.id, segment.user_prompt);
    }
    println!("   Index entries: {}", index.entry_count(&story));

    println!("\n=== Demo complete ===");
    Ok(())
}
