//! Operations: declarative instructions that read or write variables and
//! grant content.
//!
//! Persisted as `{id, type, data}`. The `type` tag selects one
//! [`OperationKind`] variant; a tag this build does not know (or a payload
//! that does not parse) is kept verbatim as [`OperationKind::Unknown`] so
//! the list still round-trips and the evaluator can report it.

mod condition;
mod list;
mod payloads;
mod select;

pub use condition::{all_hold, Condition, ConditionOperator};
pub use list::{ensure_unique_ids, find_by_id, remove_by_id, replace_by_id};
pub use payloads::{
    AbilityBlockRef, BonusGrant, CastingSourceDefinition, Conditional, CreateValue, ItemRef,
    LanguageRef, SpellGrant, SpellGrantType, SpellRef, SpellSlot, SpellSlotGrant, TraitGrant,
    ValueWrite,
};
pub use select::{
    AbilityBlockFilters, AdjValueFilters, AdjValueGroup, CustomOption, LanguageFilters,
    LevelRange, OperationOption, Select, SelectFilters, SelectModeType, SelectOption,
    SelectOptionType, SelectionChoices, SpellFilters, TraitFilterRef, TraitFilters,
};

use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::content::AbilityBlockType;
use crate::error::DomainError;
use crate::ids::{ContentId, OperationId};
use crate::variables::{VariableType, VariableValue};

/// Default `defineCastingSource` target and record.
pub const CASTING_SOURCES: &str = "CASTING_SOURCES";
const DEFAULT_CASTING_SOURCE: &str = ":::-:::ARCANE:::ATTRIBUTE_STR";

/// The closed set of known operation type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    AdjValue,
    SetValue,
    CreateValue,
    AddBonusToValue,
    GiveAbilityBlock,
    RemoveAbilityBlock,
    GiveSpell,
    RemoveSpell,
    GiveSpellSlot,
    DefineCastingSource,
    GiveLanguage,
    RemoveLanguage,
    GiveItem,
    GiveTrait,
    Conditional,
    Select,
}

impl OperationType {
    pub const ALL: [OperationType; 16] = [
        OperationType::AdjValue,
        OperationType::SetValue,
        OperationType::CreateValue,
        OperationType::AddBonusToValue,
        OperationType::GiveAbilityBlock,
        OperationType::RemoveAbilityBlock,
        OperationType::GiveSpell,
        OperationType::RemoveSpell,
        OperationType::GiveSpellSlot,
        OperationType::DefineCastingSource,
        OperationType::GiveLanguage,
        OperationType::RemoveLanguage,
        OperationType::GiveItem,
        OperationType::GiveTrait,
        OperationType::Conditional,
        OperationType::Select,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::AdjValue => "adjValue",
            OperationType::SetValue => "setValue",
            OperationType::CreateValue => "createValue",
            OperationType::AddBonusToValue => "addBonusToValue",
            OperationType::GiveAbilityBlock => "giveAbilityBlock",
            OperationType::RemoveAbilityBlock => "removeAbilityBlock",
            OperationType::GiveSpell => "giveSpell",
            OperationType::RemoveSpell => "removeSpell",
            OperationType::GiveSpellSlot => "giveSpellSlot",
            OperationType::DefineCastingSource => "defineCastingSource",
            OperationType::GiveLanguage => "giveLanguage",
            OperationType::RemoveLanguage => "removeLanguage",
            OperationType::GiveItem => "giveItem",
            OperationType::GiveTrait => "giveTrait",
            OperationType::Conditional => "conditional",
            OperationType::Select => "select",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::parse(format!("Unknown operation type: {}", s)))
    }
}

/// Operation payload, one variant per type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    AdjValue(ValueWrite),
    SetValue(ValueWrite),
    CreateValue(CreateValue),
    AddBonusToValue(BonusGrant),
    GiveAbilityBlock(AbilityBlockRef),
    RemoveAbilityBlock(AbilityBlockRef),
    GiveSpell(SpellGrant),
    RemoveSpell(SpellRef),
    GiveSpellSlot(SpellSlotGrant),
    DefineCastingSource(CastingSourceDefinition),
    GiveLanguage(LanguageRef),
    RemoveLanguage(LanguageRef),
    GiveItem(ItemRef),
    GiveTrait(TraitGrant),
    Conditional(Conditional),
    Select(Select),
    /// Unrecognised tag or unparseable payload, kept for round-tripping.
    Unknown {
        type_name: String,
        data: serde_json::Value,
    },
}

impl OperationKind {
    pub fn operation_type(&self) -> Option<OperationType> {
        Some(match self {
            OperationKind::AdjValue(_) => OperationType::AdjValue,
            OperationKind::SetValue(_) => OperationType::SetValue,
            OperationKind::CreateValue(_) => OperationType::CreateValue,
            OperationKind::AddBonusToValue(_) => OperationType::AddBonusToValue,
            OperationKind::GiveAbilityBlock(_) => OperationType::GiveAbilityBlock,
            OperationKind::RemoveAbilityBlock(_) => OperationType::RemoveAbilityBlock,
            OperationKind::GiveSpell(_) => OperationType::GiveSpell,
            OperationKind::RemoveSpell(_) => OperationType::RemoveSpell,
            OperationKind::GiveSpellSlot(_) => OperationType::GiveSpellSlot,
            OperationKind::DefineCastingSource(_) => OperationType::DefineCastingSource,
            OperationKind::GiveLanguage(_) => OperationType::GiveLanguage,
            OperationKind::RemoveLanguage(_) => OperationType::RemoveLanguage,
            OperationKind::GiveItem(_) => OperationType::GiveItem,
            OperationKind::GiveTrait(_) => OperationType::GiveTrait,
            OperationKind::Conditional(_) => OperationType::Conditional,
            OperationKind::Select(_) => OperationType::Select,
            OperationKind::Unknown { .. } => return None,
        })
    }

    /// The persisted `type` tag.
    pub fn type_name(&self) -> &str {
        match self {
            OperationKind::Unknown { type_name, .. } => type_name,
            known => known.operation_type().map(|t| t.as_str()).unwrap_or_default(),
        }
    }

    fn from_raw(type_name: String, data: serde_json::Value) -> Self {
        fn parse<T: DeserializeOwned>(data: &serde_json::Value) -> Option<T> {
            serde_json::from_value(data.clone()).ok()
        }

        let parsed = match type_name.parse::<OperationType>() {
            Ok(OperationType::AdjValue) => parse(&data).map(OperationKind::AdjValue),
            Ok(OperationType::SetValue) => parse(&data).map(OperationKind::SetValue),
            Ok(OperationType::CreateValue) => parse(&data).map(OperationKind::CreateValue),
            Ok(OperationType::AddBonusToValue) => parse(&data).map(OperationKind::AddBonusToValue),
            Ok(OperationType::GiveAbilityBlock) => parse(&data).map(OperationKind::GiveAbilityBlock),
            Ok(OperationType::RemoveAbilityBlock) => {
                parse(&data).map(OperationKind::RemoveAbilityBlock)
            }
            Ok(OperationType::GiveSpell) => parse(&data).map(OperationKind::GiveSpell),
            Ok(OperationType::RemoveSpell) => parse(&data).map(OperationKind::RemoveSpell),
            Ok(OperationType::GiveSpellSlot) => parse(&data).map(OperationKind::GiveSpellSlot),
            Ok(OperationType::DefineCastingSource) => {
                parse(&data).map(OperationKind::DefineCastingSource)
            }
            Ok(OperationType::GiveLanguage) => parse(&data).map(OperationKind::GiveLanguage),
            Ok(OperationType::RemoveLanguage) => parse(&data).map(OperationKind::RemoveLanguage),
            Ok(OperationType::GiveItem) => parse(&data).map(OperationKind::GiveItem),
            Ok(OperationType::GiveTrait) => parse(&data).map(OperationKind::GiveTrait),
            Ok(OperationType::Conditional) => parse(&data).map(OperationKind::Conditional),
            Ok(OperationType::Select) => parse(&data).map(OperationKind::Select),
            Err(_) => None,
        };
        parsed.unwrap_or(OperationKind::Unknown { type_name, data })
    }
}

/// One operation with its stable id.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: OperationId,
    pub kind: OperationKind,
}

impl Operation {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            id: OperationId::new(),
            kind,
        }
    }

    pub fn with_id(id: OperationId, kind: OperationKind) -> Self {
        Self { id, kind }
    }

    pub fn adj_value(variable: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::new(OperationKind::AdjValue(ValueWrite {
            variable: variable.into(),
            value: value.into(),
        }))
    }

    pub fn set_value(variable: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::new(OperationKind::SetValue(ValueWrite {
            variable: variable.into(),
            value: value.into(),
        }))
    }

    pub fn create_value(
        variable: impl Into<String>,
        value_type: VariableType,
        value: impl Into<VariableValue>,
    ) -> Self {
        Self::new(OperationKind::CreateValue(CreateValue {
            variable: variable.into(),
            value: value.into(),
            value_type,
        }))
    }

    pub fn give_trait(trait_id: ContentId) -> Self {
        Self::new(OperationKind::GiveTrait(TraitGrant { trait_id }))
    }

    /// A fresh operation of the given type with a new id and zero payload.
    pub fn new_default(operation_type: OperationType) -> Self {
        let kind = match operation_type {
            OperationType::AdjValue => OperationKind::AdjValue(ValueWrite {
                variable: String::new(),
                value: VariableValue::Num(0),
            }),
            OperationType::SetValue => OperationKind::SetValue(ValueWrite {
                variable: String::new(),
                value: VariableValue::Bool(false),
            }),
            OperationType::CreateValue => OperationKind::CreateValue(CreateValue {
                variable: String::new(),
                value: VariableValue::Str(String::new()),
                value_type: VariableType::Str,
            }),
            OperationType::AddBonusToValue => OperationKind::AddBonusToValue(BonusGrant {
                variable: String::new(),
                value: None,
                bonus_type: None,
                text: Some(String::new()),
            }),
            OperationType::GiveAbilityBlock => OperationKind::GiveAbilityBlock(AbilityBlockRef {
                block_type: AbilityBlockType::Feat,
                ability_block_id: ContentId::UNSET,
            }),
            OperationType::RemoveAbilityBlock => {
                OperationKind::RemoveAbilityBlock(AbilityBlockRef {
                    block_type: AbilityBlockType::Feat,
                    ability_block_id: ContentId::UNSET,
                })
            }
            OperationType::GiveSpell => OperationKind::GiveSpell(SpellGrant {
                spell_id: ContentId::UNSET,
                grant_type: SpellGrantType::Normal,
                casting_source: None,
                rank: None,
                tradition: None,
            }),
            OperationType::RemoveSpell => OperationKind::RemoveSpell(SpellRef {
                spell_id: ContentId::UNSET,
            }),
            OperationType::GiveSpellSlot => OperationKind::GiveSpellSlot(SpellSlotGrant {
                casting_source: String::new(),
                slots: Vec::new(),
            }),
            OperationType::DefineCastingSource => {
                OperationKind::DefineCastingSource(CastingSourceDefinition {
                    variable: CASTING_SOURCES.to_string(),
                    value: DEFAULT_CASTING_SOURCE.to_string(),
                })
            }
            OperationType::GiveLanguage => OperationKind::GiveLanguage(LanguageRef {
                language_id: ContentId::UNSET,
            }),
            OperationType::RemoveLanguage => OperationKind::RemoveLanguage(LanguageRef {
                language_id: ContentId::UNSET,
            }),
            OperationType::GiveItem => OperationKind::GiveItem(ItemRef {
                item_id: ContentId::UNSET,
            }),
            OperationType::GiveTrait => OperationKind::GiveTrait(TraitGrant {
                trait_id: ContentId::UNSET,
            }),
            OperationType::Conditional => OperationKind::Conditional(Conditional::default()),
            OperationType::Select => OperationKind::Select(Select {
                title: Some(String::new()),
                description: Some(String::new()),
                mode_type: SelectModeType::Predefined,
                option_type: SelectOptionType::AbilityBlock,
                options_predefined: Some(Vec::new()),
                options_filters: None,
            }),
        };
        Self::new(kind)
    }

    /// Operations nested directly inside this one (conditional branches and
    /// select options).
    pub fn children(&self) -> Vec<&Operation> {
        match &self.kind {
            OperationKind::Conditional(c) => c.branch(true).iter().chain(c.branch(false)).collect(),
            OperationKind::Select(s) => s.predefined().iter().flat_map(|o| o.operations()).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Operation> {
        match &mut self.kind {
            OperationKind::Conditional(c) => c
                .true_operations
                .iter_mut()
                .chain(c.false_operations.iter_mut())
                .flat_map(|ops| ops.iter_mut())
                .collect(),
            OperationKind::Select(s) => s
                .options_predefined
                .iter_mut()
                .flat_map(|opts| opts.iter_mut())
                .flat_map(|o| o.operations_mut())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Structural checks an editor runs before saving. Recurses into nested
    /// operations.
    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.kind {
            OperationKind::AdjValue(w) | OperationKind::SetValue(w) => {
                require_variable(self, &w.variable)?;
            }
            OperationKind::CreateValue(c) => {
                require_variable(self, &c.variable)?;
                let got = c.value.clone().normalized().variable_type();
                if got != c.value_type {
                    return Err(DomainError::validation(format!(
                        "createValue {} declares {} but its value is {}",
                        c.variable, c.value_type, got
                    )));
                }
            }
            OperationKind::AddBonusToValue(b) => {
                require_variable(self, &b.variable)?;
            }
            OperationKind::DefineCastingSource(d) => {
                require_variable(self, &d.variable)?;
            }
            OperationKind::GiveAbilityBlock(r) | OperationKind::RemoveAbilityBlock(r) => {
                require_content(self, r.ability_block_id)?;
            }
            OperationKind::GiveSpell(s) => require_content(self, s.spell_id)?,
            OperationKind::RemoveSpell(s) => require_content(self, s.spell_id)?,
            OperationKind::GiveLanguage(l) | OperationKind::RemoveLanguage(l) => {
                require_content(self, l.language_id)?;
            }
            OperationKind::GiveItem(i) => require_content(self, i.item_id)?,
            OperationKind::GiveTrait(t) => require_content(self, t.trait_id)?,
            OperationKind::GiveSpellSlot(_) | OperationKind::Conditional(_) => {}
            OperationKind::Select(s) => validate_select(self.id, s)?,
            OperationKind::Unknown { type_name, .. } => {
                return Err(DomainError::validation(format!(
                    "Operation {} has unknown type {}",
                    self.id, type_name
                )));
            }
        }
        self.children().into_iter().try_for_each(Operation::validate)
    }
}

fn require_variable(op: &Operation, variable: &str) -> Result<(), DomainError> {
    if variable.trim().is_empty() {
        return Err(DomainError::validation(format!(
            "{} operation {} has no target variable",
            op.kind.type_name(),
            op.id
        )));
    }
    Ok(())
}

fn require_content(op: &Operation, id: ContentId) -> Result<(), DomainError> {
    if !id.is_set() {
        return Err(DomainError::validation(format!(
            "{} operation {} references no content",
            op.kind.type_name(),
            op.id
        )));
    }
    Ok(())
}

fn validate_select(id: OperationId, select: &Select) -> Result<(), DomainError> {
    match select.mode_type {
        SelectModeType::Predefined => {
            if select.options_predefined.is_none() {
                return Err(DomainError::validation(format!(
                    "Predefined select {} has no option list",
                    id
                )));
            }
        }
        SelectModeType::Filtered => {
            let Some(filters) = &select.options_filters else {
                return Err(DomainError::validation(format!(
                    "Filtered select {} has no filters",
                    id
                )));
            };
            if filters.option_type() != select.option_type {
                return Err(DomainError::validation(format!(
                    "Select {} filters {:?} options but declares {:?}",
                    id,
                    filters.option_type(),
                    select.option_type
                )));
            }
        }
    }
    Ok(())
}

struct KindData<'a>(&'a OperationKind);

impl Serialize for KindData<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            OperationKind::AdjValue(d) | OperationKind::SetValue(d) => d.serialize(serializer),
            OperationKind::CreateValue(d) => d.serialize(serializer),
            OperationKind::AddBonusToValue(d) => d.serialize(serializer),
            OperationKind::GiveAbilityBlock(d) | OperationKind::RemoveAbilityBlock(d) => {
                d.serialize(serializer)
            }
            OperationKind::GiveSpell(d) => d.serialize(serializer),
            OperationKind::RemoveSpell(d) => d.serialize(serializer),
            OperationKind::GiveSpellSlot(d) => d.serialize(serializer),
            OperationKind::DefineCastingSource(d) => d.serialize(serializer),
            OperationKind::GiveLanguage(d) | OperationKind::RemoveLanguage(d) => {
                d.serialize(serializer)
            }
            OperationKind::GiveItem(d) => d.serialize(serializer),
            OperationKind::GiveTrait(d) => d.serialize(serializer),
            OperationKind::Conditional(d) => d.serialize(serializer),
            OperationKind::Select(d) => d.serialize(serializer),
            OperationKind::Unknown { data, .. } => data.serialize(serializer),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Operation", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", self.kind.type_name())?;
        state.serialize_field("data", &KindData(&self.kind))?;
        state.end()
    }
}

#[derive(Deserialize)]
struct RawOperation {
    id: OperationId,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawOperation::deserialize(deserializer)?;
        Ok(Operation {
            id: raw.id,
            kind: OperationKind::from_raw(raw.type_name, raw.data),
        })
    }
}
