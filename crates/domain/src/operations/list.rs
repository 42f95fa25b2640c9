//! Editing operation lists by id.
//!
//! Operations are addressed by their stable id, never by position, and the
//! lookups descend into conditional branches and select options.

use std::collections::HashSet;

use super::Operation;
use crate::error::DomainError;
use crate::ids::OperationId;

pub fn find_by_id(operations: &[Operation], id: OperationId) -> Option<&Operation> {
    for op in operations {
        if op.id == id {
            return Some(op);
        }
        let nested = op
            .children()
            .into_iter()
            .find_map(|child| find_by_id(std::slice::from_ref(child), id));
        if nested.is_some() {
            return nested;
        }
    }
    None
}

/// Replace the operation carrying `replacement.id`. Returns whether one was found.
pub fn replace_by_id(operations: &mut [Operation], replacement: Operation) -> bool {
    replace_in(operations.iter_mut(), replacement).is_none()
}

fn replace_in<'a>(
    operations: impl Iterator<Item = &'a mut Operation>,
    replacement: Operation,
) -> Option<Operation> {
    let mut replacement = Some(replacement);
    for op in operations {
        let Some(candidate) = replacement.take() else {
            break;
        };
        if op.id == candidate.id {
            *op = candidate;
            return None;
        }
        replacement = replace_in(op.children_mut().into_iter(), candidate);
    }
    replacement
}

/// Remove the operation with `id` from whichever list holds it.
///
/// Operations nested as the single payload of a predefined select option
/// cannot be detached on their own; remove the option's select instead.
pub fn remove_by_id(operations: &mut Vec<Operation>, id: OperationId) -> Option<Operation> {
    if let Some(pos) = operations.iter().position(|op| op.id == id) {
        return Some(operations.remove(pos));
    }
    operations.iter_mut().find_map(|op| remove_nested(op, id))
}

fn remove_nested(op: &mut Operation, id: OperationId) -> Option<Operation> {
    use super::{OperationKind, SelectOption};

    match &mut op.kind {
        OperationKind::Conditional(c) => c
            .true_operations
            .iter_mut()
            .chain(c.false_operations.iter_mut())
            .find_map(|branch| remove_by_id(branch, id)),
        OperationKind::Select(s) => s
            .options_predefined
            .iter_mut()
            .flat_map(|opts| opts.iter_mut())
            .find_map(|option| match option {
                SelectOption::Custom(custom) => remove_by_id(&mut custom.operations, id),
                SelectOption::AbilityBlock(o)
                | SelectOption::Spell(o)
                | SelectOption::Language(o)
                | SelectOption::AdjValue(o) => remove_nested(&mut o.operation, id),
            }),
        _ => None,
    }
}

/// Fail on the first id used twice anywhere in the tree.
pub fn ensure_unique_ids(operations: &[Operation]) -> Result<(), DomainError> {
    fn walk(op: &Operation, seen: &mut HashSet<OperationId>) -> Result<(), DomainError> {
        if !seen.insert(op.id) {
            return Err(DomainError::constraint(format!(
                "Operation id {} is used more than once",
                op.id
            )));
        }
        op.children().into_iter().try_for_each(|child| walk(child, seen))
    }

    let mut seen = HashSet::new();
    operations.iter().try_for_each(|op| walk(op, &mut seen))
}
