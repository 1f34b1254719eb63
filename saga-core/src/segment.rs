//! Durable story segments and the state deltas they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::story::StoryId;

/// Unique identifier for a recorded segment, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(Uuid);

impl SegmentId {
    /// Create a new unique segment ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Deserialize a field, folding an explicit JSON `null` to the type's
/// default. Generation models asked for "null or empty" deltas emit
/// both freely.
pub(crate) fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// A change in one character's affinity toward another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipChange {
    /// Who the affinity change is toward.
    pub target_id: String,
    /// Signed affinity delta.
    #[serde(default, deserialize_with = "null_to_default")]
    pub affinity_delta: f32,
}

/// Game-state delta proposed by the model for one turn.
///
/// The engine records and returns this uninterpreted; applying it to
/// actual game state is the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Signed health delta, e.g. -0.1 for damage.
    #[serde(default, deserialize_with = "null_to_default")]
    pub health_change: f32,
    /// New mood, if it changed.
    #[serde(default)]
    pub mood_change: Option<String>,
    /// New location name, if it changed.
    #[serde(default)]
    pub location_change: Option<String>,
    /// Names of skills used this turn.
    #[serde(default, deserialize_with = "null_to_default")]
    pub skill_usage: Vec<String>,
    /// Affinity change toward another character, if any.
    #[serde(default)]
    pub relationship_change: Option<RelationshipChange>,
}

/// The caller-visible parts of a segment, before the store assigns
/// identity and time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSegment {
    /// The generated narrative text.
    pub text: String,
    /// The user input that produced it.
    pub user_prompt: String,
    /// The model's proposed state delta.
    #[serde(default)]
    pub state_updates: StateUpdate,
    /// Entities extracted from the user input this turn.
    #[serde(default)]
    pub entities: Vec<String>,
}

impl NewSegment {
    pub fn new(text: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_prompt: user_prompt.into(),
            state_updates: StateUpdate::default(),
            entities: Vec::new(),
        }
    }

    pub fn with_state_updates(mut self, state_updates: StateUpdate) -> Self {
        self.state_updates = state_updates;
        self
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }
}

/// One durably recorded story segment.
///
/// Immutable once written. `id` and `created_at` are assigned by the
/// store at append time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub story_id: StoryId,
    pub text: String,
    pub user_prompt: String,
    pub state_updates: StateUpdate,
    pub entities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Segment {
    /// Materialize a new segment with a fresh ID and the current time.
    pub fn record(story_id: StoryId, new: NewSegment) -> Self {
        Self {
            id: SegmentId::new(),
            story_id,
            text: new.text,
            user_prompt: new.user_prompt,
            state_updates: new.state_updates,
            entities: new.entities,
            created_at: Utc::now(),
        }
    }
}
