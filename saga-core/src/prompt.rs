//! System instruction composition.
//!
//! Pure and total: every caller-omitted piece of context has a
//! documented default, so composition always yields a usable
//! instruction.

use crate::story::{CharacterState, StoryTurnContext};

/// Default narration style when the caller supplies none.
pub const DEFAULT_NARRATION: &str =
    "Standard third-person narrative, descriptive and engaging.";

/// Default world notes when the caller supplies none.
pub const DEFAULT_WORLD_NOTES: &str = "A generic fantasy world.";

/// Default user persona when the caller supplies none.
pub const DEFAULT_PERSONA: &str = "An adventurer seeking glory.";

/// Placeholder when no character states are supplied.
pub const NO_ACTIVE_CHARACTERS: &str = "No active characters.";

/// Placeholder when retrieval produced an empty digest.
pub const NO_RELEVANT_LORE: &str = "No relevant lore found.";

/// Compose the system instruction for one turn.
pub fn compose(context: &StoryTurnContext, digest: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(include_str!("prompts/storyteller_base.txt").trim_end());

    prompt.push_str("\n\nNARRATION STYLE:\n");
    prompt.push_str(or_default(&context.narration, DEFAULT_NARRATION));

    prompt.push_str("\n\nWORLD NOTES:\n");
    prompt.push_str(or_default(&context.world_notes, DEFAULT_WORLD_NOTES));

    prompt.push_str("\n\nUSER PERSONA:\n");
    prompt.push_str(or_default(&context.user_persona, DEFAULT_PERSONA));

    prompt.push_str("\n\nCURRENT CHARACTER STATES:\n");
    let states = render_character_states(&context.character_states);
    if states.is_empty() {
        prompt.push_str(NO_ACTIVE_CHARACTERS);
    } else {
        prompt.push_str(&states);
    }

    prompt.push_str("\n\nRELEVANT LORE & MEMORIES:\n");
    if digest.trim().is_empty() {
        prompt.push_str(NO_RELEVANT_LORE);
    } else {
        prompt.push_str(digest);
    }

    prompt.push_str("\n\n");
    prompt.push_str(include_str!("prompts/output_contract.txt").trim_end());

    prompt
}

/// Render the per-character state blocks.
pub fn render_character_states(states: &[CharacterState]) -> String {
    states
        .iter()
        .map(render_character)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_character(state: &CharacterState) -> String {
    // Only a missing health defaults to full; an explicit 0.0 renders
    // as 0%.
    let health_pct = (state.health.unwrap_or(1.0) * 100.0).round() as i64;
    format!(
        "- Name: {}\n- Health: {}%\n- Mood: {}\n- Location: {}\n- Skills: {}\n- Relationships: {}",
        state.name,
        health_pct,
        or_default(&state.mood, "Neutral"),
        or_default(&state.location, "Unknown"),
        or_default(&state.skills_summary, "None"),
        or_default(&state.relationships_summary, "None"),
    )
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => v,
        _ => default,
    }
}
