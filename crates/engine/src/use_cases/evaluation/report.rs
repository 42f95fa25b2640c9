//! Evaluation input and output.

use std::collections::BTreeMap;

use charbuild_domain::operations::{SelectModeType, SelectOptionType, SelectionChoices, SpellSlot};
use charbuild_domain::{CharacterId, ContentId, ContentType, Operation, OperationId, Variable};
use serde::{Deserialize, Serialize};

use super::error::Diagnostic;
use crate::stores::BonusBreakdown;

/// Source stamped on bonuses and grants from top-level operations.
pub const CHARACTER_SOURCE: &str = "Character";

/// A character to evaluate: its baseline variables, its operation list and
/// the choices recorded so far.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EvaluationRequest {
    pub scope: CharacterId,
    pub baseline: Vec<Variable>,
    pub operations: Vec<Operation>,
    pub choices: SelectionChoices,
}

impl EvaluationRequest {
    pub fn new(scope: CharacterId, baseline: Vec<Variable>, operations: Vec<Operation>) -> Self {
        Self {
            scope,
            baseline,
            operations,
            choices: SelectionChoices::new(),
        }
    }

    pub fn with_choice(mut self, select: OperationId, key: impl Into<String>) -> Self {
        self.choices.insert(select, key.into());
        self
    }
}

/// Content granted to the character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentGrant {
    pub content_type: ContentType,
    pub content_id: ContentId,
    pub name: String,
    pub operation_id: OperationId,
    /// Content that carried the granting operation, or `Character`.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpellSlotRecord {
    pub casting_source: String,
    pub slot: SpellSlot,
    pub operation_id: OperationId,
}

/// A select still waiting on the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingSelection {
    pub operation_id: OperationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub mode_type: SelectModeType,
    pub option_type: SelectOptionType,
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub scope: CharacterId,
    /// Passes run, the main pass included.
    pub passes: u32,
    pub variables: Vec<Variable>,
    pub bonuses: BTreeMap<String, BonusBreakdown>,
    pub grants: Vec<ContentGrant>,
    pub spell_slots: Vec<SpellSlotRecord>,
    pub pending_selections: Vec<PendingSelection>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EvaluationReport {
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn granted(&self, content_type: ContentType, id: ContentId) -> bool {
        self.grants
            .iter()
            .any(|g| g.content_type == content_type && g.content_id == id)
    }
}
