//! Per-type operation payloads (the persisted `data` object).

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::Operation;
use crate::content::AbilityBlockType;
use crate::ids::ContentId;
use crate::variables::{VariableType, VariableValue};

/// `adjValue` / `setValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueWrite {
    pub variable: String,
    pub value: VariableValue,
}

/// `createValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateValue {
    pub variable: String,
    pub value: VariableValue,
    #[serde(rename = "type")]
    pub value_type: VariableType,
}

/// `addBonusToValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusGrant {
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bonus_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// `giveAbilityBlock` / `removeAbilityBlock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityBlockRef {
    #[serde(rename = "type", default)]
    pub block_type: AbilityBlockType,
    pub ability_block_id: ContentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpellGrantType {
    #[default]
    Normal,
    Innate,
    Focus,
}

/// `giveSpell`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellGrant {
    pub spell_id: ContentId,
    #[serde(rename = "type", default)]
    pub grant_type: SpellGrantType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub casting_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tradition: Option<String>,
}

/// `removeSpell`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellRef {
    pub spell_id: ContentId,
}

/// `giveLanguage` / `removeLanguage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageRef {
    pub language_id: ContentId,
}

/// `giveItem`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub item_id: ContentId,
}

/// `giveTrait`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitGrant {
    pub trait_id: ContentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlot {
    pub lvl: i32,
    pub rank: i32,
    pub amt: i32,
}

/// `giveSpellSlot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellSlotGrant {
    pub casting_source: String,
    #[serde(default)]
    pub slots: Vec<SpellSlot>,
}

/// `defineCastingSource`. The value is an opaque `:::`-separated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastingSourceDefinition {
    pub variable: String,
    pub value: String,
}

/// `conditional`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_operations: Option<Vec<Operation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_operations: Option<Vec<Operation>>,
}

impl Conditional {
    pub fn branch(&self, taken: bool) -> &[Operation] {
        let ops = if taken {
            &self.true_operations
        } else {
            &self.false_operations
        };
        ops.as_deref().unwrap_or(&[])
    }
}
