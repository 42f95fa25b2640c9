//! Content repository vocabulary.
//!
//! Content (ability blocks, spells, languages, traits, items...) is authored
//! outside the engine and only ever read by it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::ids::{ContentId, ContentSourceId};
use crate::operations::Operation;

/// Trait name that marks an archetype's dedication feat.
pub const DEDICATION_TRAIT: &str = "Dedication";

/// Content category a repository query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Ancestry,
    Background,
    Class,
    AbilityBlock,
    Item,
    Language,
    Spell,
    Trait,
    ContentSource,
    Archetype,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Ancestry => "ancestry",
            ContentType::Background => "background",
            ContentType::Class => "class",
            ContentType::AbilityBlock => "ability-block",
            ContentType::Item => "item",
            ContentType::Language => "language",
            ContentType::Spell => "spell",
            ContentType::Trait => "trait",
            ContentType::ContentSource => "content-source",
            ContentType::Archetype => "archetype",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "ancestry" => Ok(ContentType::Ancestry),
            "background" => Ok(ContentType::Background),
            "class" => Ok(ContentType::Class),
            "ability-block" => Ok(ContentType::AbilityBlock),
            "item" => Ok(ContentType::Item),
            "language" => Ok(ContentType::Language),
            "spell" => Ok(ContentType::Spell),
            "trait" => Ok(ContentType::Trait),
            "content-source" => Ok(ContentType::ContentSource),
            "archetype" => Ok(ContentType::Archetype),
            other => Err(DomainError::parse(format!("Unknown content type: {}", other))),
        }
    }
}

/// Sub-type of an ability block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbilityBlockType {
    Action,
    #[default]
    Feat,
    PhysicalFeature,
    Sense,
    ClassFeature,
    Heritage,
    Mode,
    #[serde(other)]
    Other,
}

/// Boolean tags carried in an entity's `meta_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetaData {
    #[serde(default)]
    pub unselectable: bool,
    #[serde(default)]
    pub creature_trait: bool,
    #[serde(default)]
    pub ancestry_trait: bool,
    #[serde(default)]
    pub versatile_heritage_trait: bool,
    #[serde(default)]
    pub class_trait: bool,
    #[serde(default)]
    pub archetype_trait: bool,
    /// Tags the engine does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Category-specific columns, tagged by `content_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "content_type", rename_all = "kebab-case")]
pub enum ContentDetails {
    Ancestry,
    Background,
    Class,
    AbilityBlock {
        #[serde(rename = "type", default)]
        block_type: AbilityBlockType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<i32>,
    },
    Item {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<i32>,
    },
    Language {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rarity: Option<String>,
    },
    Spell {
        #[serde(default)]
        rank: i32,
        #[serde(default)]
        traditions: Vec<String>,
    },
    Trait,
    ContentSource,
    Archetype {
        trait_id: ContentId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dedication_feat_id: Option<ContentId>,
    },
}

impl ContentDetails {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentDetails::Ancestry => ContentType::Ancestry,
            ContentDetails::Background => ContentType::Background,
            ContentDetails::Class => ContentType::Class,
            ContentDetails::AbilityBlock { .. } => ContentType::AbilityBlock,
            ContentDetails::Item { .. } => ContentType::Item,
            ContentDetails::Language { .. } => ContentType::Language,
            ContentDetails::Spell { .. } => ContentType::Spell,
            ContentDetails::Trait => ContentType::Trait,
            ContentDetails::ContentSource => ContentType::ContentSource,
            ContentDetails::Archetype { .. } => ContentType::Archetype,
        }
    }
}

/// A content row as the engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity {
    pub id: ContentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_source_id: Option<ContentSourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<Vec<ContentId>>,
    #[serde(default)]
    pub meta_data: ContentMetaData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<Operation>>,
    #[serde(flatten)]
    pub details: ContentDetails,
}

impl ContentEntity {
    pub fn new(id: ContentId, name: impl Into<String>, details: ContentDetails) -> Self {
        Self {
            id,
            name: name.into(),
            content_source_id: None,
            traits: None,
            meta_data: ContentMetaData::default(),
            operations: None,
            details,
        }
    }

    pub fn with_source(mut self, source: ContentSourceId) -> Self {
        self.content_source_id = Some(source);
        self
    }

    pub fn with_traits(mut self, traits: Vec<ContentId>) -> Self {
        self.traits = Some(traits);
        self
    }

    pub fn with_operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations = Some(operations);
        self
    }

    pub fn content_type(&self) -> ContentType {
        self.details.content_type()
    }

    pub fn trait_ids(&self) -> &[ContentId] {
        self.traits.as_deref().unwrap_or(&[])
    }

    pub fn operations(&self) -> &[Operation] {
        self.operations.as_deref().unwrap_or(&[])
    }

    pub fn is_unselectable(&self) -> bool {
        self.meta_data.unselectable
    }

    /// Level for ability blocks and items, rank for spells.
    pub fn level(&self) -> Option<i32> {
        match &self.details {
            ContentDetails::AbilityBlock { level, .. } | ContentDetails::Item { level, .. } => *level,
            ContentDetails::Spell { rank, .. } => Some(*rank),
            _ => None,
        }
    }

    pub fn ability_block_type(&self) -> Option<AbilityBlockType> {
        match &self.details {
            ContentDetails::AbilityBlock { block_type, .. } => Some(*block_type),
            _ => None,
        }
    }

    pub fn traditions(&self) -> &[String] {
        match &self.details {
            ContentDetails::Spell { traditions, .. } => traditions,
            _ => &[],
        }
    }
}
