//! Story identity and per-turn caller context.

use serde::{Deserialize, Serialize};

/// Identifier for one story.
///
/// Caller-supplied and opaque to the engine. It scopes every read and
/// write: the vector index namespace and the durable segment collection
/// are both keyed by it, and no operation ever crosses story boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    /// Create a story ID from a caller-supplied key.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StoryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Snapshot of one active character, supplied by the caller each turn.
///
/// The engine renders this into the prompt; it never stores or mutates
/// character state itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterState {
    /// Character name as it should appear in the prompt.
    pub name: String,
    /// Health in the range 0.0 to 1.0. Missing means full health.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub health: Option<f32>,
    /// Current mood, e.g. "Wary".
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mood: Option<String>,
    /// Current location name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<String>,
    /// Short summary of notable skills.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub skills_summary: Option<String>,
    /// Short summary of relationships to other characters.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relationships_summary: Option<String>,
}

impl CharacterState {
    /// Create a character snapshot with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health: None,
            mood: None,
            location: None,
            skills_summary: None,
            relationships_summary: None,
        }
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_skills_summary(mut self, skills: impl Into<String>) -> Self {
        self.skills_summary = Some(skills.into());
        self
    }

    pub fn with_relationships_summary(mut self, relationships: impl Into<String>) -> Self {
        self.relationships_summary = Some(relationships.into());
        self
    }
}

/// Caller-supplied context for one turn.
///
/// Everything here is optional; the prompt composer substitutes a
/// documented default for each missing piece.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryTurnContext {
    /// Narration style directive.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub narration: Option<String>,
    /// World or setting notes.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub world_notes: Option<String>,
    /// Description of the user's persona in the story.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_persona: Option<String>,
    /// Active characters to render into the prompt.
    #[serde(default)]
    pub character_states: Vec<CharacterState>,
}

impl StoryTurnContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }

    pub fn with_world_notes(mut self, world_notes: impl Into<String>) -> Self {
        self.world_notes = Some(world_notes.into());
        self
    }

    pub fn with_user_persona(mut self, persona: impl Into<String>) -> Self {
        self.user_persona = Some(persona.into());
        self
    }

    pub fn with_character(mut self, character: CharacterState) -> Self {
        self.character_states.push(character);
        self
    }
}
