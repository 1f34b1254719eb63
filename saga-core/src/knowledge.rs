//! World knowledge items and their canonical index representation.
//!
//! Lore and character profiles are indexed up front so later turns can
//! retrieve them. Each item has one canonical text layout that feeds the
//! embedder and one metadata record that rides along in the index; the
//! metadata carries the raw body text, not the embedding layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::{EntryKind, EntryMetadata};

/// A piece of world lore to make retrievable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoreItem {
    /// Caller-supplied stable identifier.
    pub id: String,
    /// Short title. Optional; renders as empty when not set.
    #[serde(default)]
    pub title: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// The lore text itself.
    pub text: String,
}

impl LoreItem {
    /// Create a lore item from its identifier and body text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            tags: Vec::new(),
            text: text.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A character profile to make retrievable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterItem {
    /// Caller-supplied stable identifier.
    pub id: String,
    /// Character name. Optional; renders as empty when not set.
    #[serde(default)]
    pub name: String,
    /// Personality or capability traits.
    #[serde(default)]
    pub traits: Vec<String>,
    /// The profile text itself.
    pub profile: String,
}

impl CharacterItem {
    /// Create a character item from its identifier and profile text.
    pub fn new(id: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            traits: Vec::new(),
            profile: profile.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_trait(mut self, character_trait: impl Into<String>) -> Self {
        self.traits.push(character_trait.into());
        self
    }

    pub fn with_traits(mut self, traits: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.traits = traits.into_iter().map(Into::into).collect();
        self
    }
}

/// A unit of world knowledge the engine can index for retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KnowledgeItem {
    Lore(LoreItem),
    Character(CharacterItem),
}

impl KnowledgeItem {
    /// The kind of index entry this item produces.
    pub fn kind(&self) -> EntryKind {
        match self {
            KnowledgeItem::Lore(_) => EntryKind::Lore,
            KnowledgeItem::Character(_) => EntryKind::Character,
        }
    }

    /// The caller-supplied identifier.
    pub fn id(&self) -> &str {
        match self {
            KnowledgeItem::Lore(lore) => &lore.id,
            KnowledgeItem::Character(character) => &character.id,
        }
    }

    /// The index entry key: `lore_{id}` or `character_{id}`.
    ///
    /// Re-indexing an item therefore replaces its previous entry rather
    /// than adding a duplicate.
    pub fn index_key(&self) -> String {
        match self {
            KnowledgeItem::Lore(lore) => format!("lore_{}", lore.id),
            KnowledgeItem::Character(character) => format!("character_{}", character.id),
        }
    }

    /// The canonical text layout fed to the embedder.
    pub fn canonical_text(&self) -> String {
        match self {
            KnowledgeItem::Lore(lore) => format!(
                "Lore: {}\nTags: {}\n{}",
                lore.title,
                lore.tags.join(", "),
                lore.text
            ),
            KnowledgeItem::Character(character) => format!(
                "Character: {}\nTraits: {}\n{}",
                character.name,
                character.traits.join(", "),
                character.profile
            ),
        }
    }

    /// The metadata record stored with the vector. Carries the raw body
    /// text so retrieval digests quote the item as written.
    pub fn metadata(&self, timestamp: DateTime<Utc>) -> EntryMetadata {
        match self {
            KnowledgeItem::Lore(lore) => {
                EntryMetadata::lore(&lore.text, &lore.title, lore.tags.clone(), timestamp)
            }
            KnowledgeItem::Character(character) => EntryMetadata::character(
                &character.profile,
                &character.name,
                character.traits.clone(),
                timestamp,
            ),
        }
    }

    /// Check that the identifier and body text are present and non-blank.
    pub fn validate(&self) -> Result<()> {
        match self {
            KnowledgeItem::Lore(lore) => {
                if lore.id.trim().is_empty() {
                    return Err(Error::Validation("loreId"));
                }
                if lore.text.trim().is_empty() {
                    return Err(Error::Validation("text"));
                }
            }
            KnowledgeItem::Character(character) => {
                if character.id.trim().is_empty() {
                    return Err(Error::Validation("characterId"));
                }
                if character.profile.trim().is_empty() {
                    return Err(Error::Validation("profileText"));
                }
            }
        }
        Ok(())
    }
}

impl From<LoreItem> for KnowledgeItem {
    fn from(lore: LoreItem) -> Self {
        KnowledgeItem::Lore(lore)
    }
}

impl From<CharacterItem> for KnowledgeItem {
    fn from(character: CharacterItem) -> Self {
        KnowledgeItem::Character(character)
    }
}
