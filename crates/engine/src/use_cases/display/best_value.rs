//! Best value a variable can reach from an operation list.
//!
//! Direct `adjValue`/`setValue` writes are folded with the display
//! comparator. Value and custom selects contribute through their options:
//! an answered select folds only the chosen option, an open one folds every
//! option and, when one of them wins, marks the select as pending.
//! Conditionals contribute the branch their conditions currently pick.

use charbuild_domain::operations::{all_hold, SelectOptionType, SelectionChoices, ValueWrite};
use charbuild_domain::{CharacterId, Operation, OperationKind, Variable, VariableType, VariableValue};

use crate::stores::VariableStore;

#[derive(Debug, Clone, PartialEq)]
pub struct BestValue {
    pub variable: Variable,
    pub value: Option<VariableValue>,
    /// The open select the winning value came from, if any.
    pub pending_select: Option<Operation>,
}

struct Tracker {
    variable_type: VariableType,
    value: Option<VariableValue>,
    pending_select: Option<Operation>,
}

impl Tracker {
    fn offer(&mut self, candidate: &VariableValue, from: Option<&Operation>) {
        if candidate.variable_type() != self.variable_type {
            return;
        }
        let wins = match &self.value {
            None => true,
            Some(best) => candidate.beats(best),
        };
        if wins {
            self.value = Some(candidate.clone());
            self.pending_select = from.cloned();
        }
    }
}

fn writes_to<'a>(operations: &'a [Operation], name: &'a str) -> impl Iterator<Item = &'a ValueWrite> + 'a {
    operations.iter().filter_map(move |op| match &op.kind {
        OperationKind::AdjValue(w) | OperationKind::SetValue(w) if w.variable == name => Some(w),
        _ => None,
    })
}

pub(super) fn resolve(
    store: &VariableStore,
    scope: CharacterId,
    name: &str,
    operations: &[Operation],
    choices: &SelectionChoices,
) -> Option<BestValue> {
    let variable = store.get(scope, name)?;
    let mut tracker = Tracker {
        variable_type: variable.variable_type(),
        value: None,
        pending_select: None,
    };
    walk(store, scope, name, operations, choices, &mut tracker);
    Some(BestValue {
        variable,
        value: tracker.value,
        pending_select: tracker.pending_select,
    })
}

fn walk(
    store: &VariableStore,
    scope: CharacterId,
    name: &str,
    operations: &[Operation],
    choices: &SelectionChoices,
    tracker: &mut Tracker,
) {
    for op in operations {
        match &op.kind {
            OperationKind::AdjValue(w) | OperationKind::SetValue(w) if w.variable == name => {
                tracker.offer(&w.value, None);
            }
            OperationKind::Select(select)
                if matches!(select.option_type, SelectOptionType::AdjValue | SelectOptionType::Custom) =>
            {
                match choices.get(&op.id) {
                    Some(key) => {
                        let chosen = select.predefined().iter().find(|o| o.selection_key() == *key);
                        for w in chosen.into_iter().flat_map(|o| writes_to(o.operations(), name)) {
                            tracker.offer(&w.value, None);
                        }
                    }
                    None => {
                        for option in select.predefined() {
                            for w in writes_to(option.operations(), name) {
                                tracker.offer(&w.value, Some(op));
                            }
                        }
                    }
                }
            }
            OperationKind::Conditional(c) => {
                let taken = all_hold(&c.conditions, |n| store.get(scope, n));
                walk(store, scope, name, c.branch(taken), choices, tracker);
            }
            _ => {}
        }
    }
}
