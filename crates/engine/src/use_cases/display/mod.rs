//! Stat display: best attainable values, their UI text, and proficiency
//! breakdowns.
//!
//! Read-only over the variable store and bonus ledger. Callers read after
//! an evaluation pass for the scope has finished.

mod best_value;
mod proficiency;

pub use best_value::BestValue;
pub use proficiency::ProficiencyParts;

use std::collections::HashSet;
use std::sync::Arc;

use charbuild_domain::operations::SelectionChoices;
use charbuild_domain::{
    variable_label, CharacterId, Operation, OperationKind, ProficiencyRank, VariableType,
    VariableValue,
};

use crate::stores::{BonusLedger, VariableStore};

/// Character level variable.
pub const LEVEL: &str = "LEVEL";

/// Join labels for prose: `A`, `A or B`, `A, B, or C`.
pub fn list_to_label(items: &[String], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} {} {}", first, conjunction, second),
        [rest @ .., last] => format!("{}, {} {}", rest.join(", "), conjunction, last),
    }
}

pub struct StatDisplay {
    store: Arc<VariableStore>,
    ledger: Arc<BonusLedger>,
}

impl StatDisplay {
    pub fn new(store: Arc<VariableStore>, ledger: Arc<BonusLedger>) -> Self {
        Self { store, ledger }
    }

    /// Best value `name` can reach from `operations`. `None` when the
    /// variable does not exist in the scope.
    pub fn best_value(
        &self,
        scope: CharacterId,
        name: &str,
        operations: &[Operation],
        choices: &SelectionChoices,
    ) -> Option<BestValue> {
        best_value::resolve(&self.store, scope, name, operations, choices)
    }

    /// UI text for a best value, e.g. `Expert in Fortitude` or
    /// `Trained in your choice of Athletics or Acrobatics`.
    pub fn describe(&self, scope: CharacterId, best: &BestValue) -> Option<String> {
        let name = best.variable.name();
        match best.value.as_ref()? {
            VariableValue::Attr(_) => Some(match &best.pending_select {
                Some(select) => list_to_label(&self.choice_labels(scope, select, VariableType::Attr), "or"),
                None => variable_label(name),
            }),
            VariableValue::Prof(prof) => {
                let rank = prof.value.rank()?;
                Some(match &best.pending_select {
                    Some(select) => format!(
                        "{} in your choice of {}",
                        rank.label(),
                        list_to_label(&self.choice_labels(scope, select, VariableType::Prof), "or")
                    ),
                    None => format!("{} in {}", rank.label(), variable_label(name)),
                })
            }
            VariableValue::Num(n) if best.pending_select.is_none() => Some(n.to_string()),
            _ => None,
        }
    }

    /// Display text for several variables, deduplicated by text and in
    /// input order.
    pub fn resolve_many(
        &self,
        scope: CharacterId,
        names: &[&str],
        operations: &[Operation],
        choices: &SelectionChoices,
    ) -> Vec<String> {
        let mut seen = HashSet::new();
        names
            .iter()
            .filter_map(|name| self.best_value(scope, name, operations, choices))
            .filter_map(|best| self.describe(scope, &best))
            .filter(|text| seen.insert(text.clone()))
            .collect()
    }

    /// Labels of the variables of `variable_type` an open select can write.
    fn choice_labels(&self, scope: CharacterId, select: &Operation, variable_type: VariableType) -> Vec<String> {
        let OperationKind::Select(select) = &select.kind else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        select
            .predefined()
            .iter()
            .flat_map(|option| option.operations())
            .filter_map(|op| match &op.kind {
                OperationKind::AdjValue(w) | OperationKind::SetValue(w) => Some(w.variable.as_str()),
                _ => None,
            })
            .filter(|name| {
                self.store
                    .get(scope, name)
                    .is_some_and(|v| v.variable_type() == variable_type)
            })
            .filter(|name| seen.insert(name.to_string()))
            .map(variable_label)
            .collect()
    }

    /// Breakdown of a proficiency variable. `None` unless `name` is a
    /// proficiency in the scope.
    pub fn proficiency_parts(&self, scope: CharacterId, name: &str) -> Option<ProficiencyParts> {
        let variable = self.store.get(scope, name)?;
        let prof = variable.value().as_prof()?;
        let rank = prof.rank();

        let level = if rank == ProficiencyRank::Untrained {
            0
        } else {
            self.store
                .get(scope, LEVEL)
                .and_then(|v| v.value().as_num())
                .unwrap_or(0)
        };
        let attribute_mod = prof
            .attribute
            .as_deref()
            .and_then(|attr| self.store.get(scope, attr))
            .and_then(|v| v.value().as_attr().map(|a| a.value));
        let breakdown = self.ledger.breakdown(scope, name);

        Some(ProficiencyParts {
            level,
            prof_value: rank.rank_bonus(),
            attribute_mod,
            total_bonus_value: breakdown.total(),
            has_conditionals: breakdown.has_conditionals(),
            breakdown,
        })
    }
}
