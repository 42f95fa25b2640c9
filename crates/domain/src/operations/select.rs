//! `select` operations: an open user choice.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Operation;
use crate::content::AbilityBlockType;
use crate::ids::{ContentId, OperationId, SelectOptionId};
use crate::variables::VariableValue;

/// Recorded user choices: select operation id -> chosen selection key.
pub type SelectionChoices = HashMap<OperationId, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectModeType {
    #[default]
    Predefined,
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectOptionType {
    #[default]
    AbilityBlock,
    Spell,
    Language,
    Trait,
    AdjValue,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Select {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub mode_type: SelectModeType,
    #[serde(default)]
    pub option_type: SelectOptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_predefined: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_filters: Option<SelectFilters>,
}

impl Select {
    pub fn predefined(&self) -> &[SelectOption] {
        self.options_predefined.as_deref().unwrap_or(&[])
    }
}

/// A predefined option wrapping a single operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOption {
    pub id: SelectOptionId,
    pub operation: Operation,
}

/// A free-form option carrying its own operation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomOption {
    pub id: SelectOptionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectOption {
    AbilityBlock(OperationOption),
    Spell(OperationOption),
    Language(OperationOption),
    AdjValue(OperationOption),
    Custom(CustomOption),
}

impl SelectOption {
    pub fn id(&self) -> SelectOptionId {
        match self {
            SelectOption::AbilityBlock(o)
            | SelectOption::Spell(o)
            | SelectOption::Language(o)
            | SelectOption::AdjValue(o) => o.id,
            SelectOption::Custom(c) => c.id,
        }
    }

    /// Operations applied when this option is chosen.
    pub fn operations(&self) -> &[Operation] {
        match self {
            SelectOption::AbilityBlock(o)
            | SelectOption::Spell(o)
            | SelectOption::Language(o)
            | SelectOption::AdjValue(o) => std::slice::from_ref(&o.operation),
            SelectOption::Custom(c) => &c.operations,
        }
    }

    pub(crate) fn operations_mut(&mut self) -> &mut [Operation] {
        match self {
            SelectOption::AbilityBlock(o)
            | SelectOption::Spell(o)
            | SelectOption::Language(o)
            | SelectOption::AdjValue(o) => std::slice::from_mut(&mut o.operation),
            SelectOption::Custom(c) => &mut c.operations,
        }
    }

    /// Key a recorded choice refers to. Value options are keyed by their
    /// inner operation id, every other option by its own id.
    pub fn selection_key(&self) -> String {
        match self {
            SelectOption::AdjValue(o) => o.operation.id.to_string(),
            other => other.id().to_string(),
        }
    }
}

/// Inclusive level bounds; an absent bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

impl LevelRange {
    pub fn between(min: i32, max: i32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// A bounded range never contains an entity without a level.
    pub fn contains(&self, level: Option<i32>) -> bool {
        match (self.min, self.max, level) {
            (None, None, _) => true,
            (_, _, None) => false,
            (min, max, Some(level)) => {
                min.map_or(true, |min| level >= min) && max.map_or(true, |max| level <= max)
            }
        }
    }
}

/// Required trait, by id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitFilterRef {
    Id(ContentId),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityBlockFilters {
    #[serde(default)]
    pub level: LevelRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<Vec<TraitFilterRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability_block_type: Option<AbilityBlockType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_from_ancestry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_from_class: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_from_archetype: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellFilters {
    #[serde(default)]
    pub level: LevelRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<Vec<TraitFilterRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traditions: Option<Vec<String>>,
    /// Passed through to candidates untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LanguageFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_creature: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ancestry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_class: Option<bool>,
}

/// Variable group an ADJ_VALUE selection draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum AdjValueGroup {
    Skill,
    AddLore,
    Attribute,
    WeaponGroup,
    ArmorGroup,
    Weapon,
    Armor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjValueFilters {
    pub group: AdjValueGroup,
    pub value: VariableValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectFilters {
    AbilityBlock(AbilityBlockFilters),
    Spell(SpellFilters),
    Language(LanguageFilters),
    Trait(TraitFilters),
    AdjValue(AdjValueFilters),
}

impl SelectFilters {
    pub fn option_type(&self) -> SelectOptionType {
        match self {
            SelectFilters::AbilityBlock(_) => SelectOptionType::AbilityBlock,
            SelectFilters::Spell(_) => SelectOptionType::Spell,
            SelectFilters::Language(_) => SelectOptionType::Language,
            SelectFilters::Trait(_) => SelectOptionType::Trait,
            SelectFilters::AdjValue(_) => SelectOptionType::AdjValue,
        }
    }
}
