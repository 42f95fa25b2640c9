//! Conditions guarding a `conditional` operation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::variables::{ProficiencyRank, Variable, VariableValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    AtLeast,
    AtMost,
    Includes,
}

/// `{name, operator, value}`: compare the named variable against `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub operator: ConditionOperator,
    pub value: VariableValue,
}

impl Condition {
    pub fn new(name: impl Into<String>, operator: ConditionOperator, value: impl Into<VariableValue>) -> Self {
        Self {
            name: name.into(),
            operator,
            value: value.into(),
        }
    }

    /// Evaluate against the variable's current state.
    ///
    /// A missing variable or a shape that cannot be compared is false.
    pub fn holds(&self, variable: Option<&Variable>) -> bool {
        let Some(variable) = variable else {
            return false;
        };
        let current = variable.value();

        if self.operator == ConditionOperator::Includes {
            return match (current, &self.value) {
                (VariableValue::ListStr(list), VariableValue::Str(needle)) => {
                    list.iter().any(|item| item.eq_ignore_ascii_case(needle))
                }
                (VariableValue::Str(haystack), VariableValue::Str(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            };
        }

        // Lists have no order; only equality is meaningful.
        if let (VariableValue::ListStr(a), VariableValue::ListStr(b)) = (current, &self.value) {
            return match self.operator {
                ConditionOperator::Equals => a == b,
                ConditionOperator::NotEquals => a != b,
                _ => false,
            };
        }

        let Some(ordering) = compare(current, &self.value) else {
            return false;
        };
        match self.operator {
            ConditionOperator::Equals => ordering == Ordering::Equal,
            ConditionOperator::NotEquals => ordering != Ordering::Equal,
            ConditionOperator::GreaterThan => ordering == Ordering::Greater,
            ConditionOperator::LessThan => ordering == Ordering::Less,
            ConditionOperator::AtLeast => ordering != Ordering::Less,
            ConditionOperator::AtMost => ordering != Ordering::Greater,
            ConditionOperator::Includes => false,
        }
    }
}

/// All conditions hold. An empty list holds.
pub fn all_hold<F>(conditions: &[Condition], lookup: F) -> bool
where
    F: Fn(&str) -> Option<Variable>,
{
    conditions.iter().all(|c| c.holds(lookup(&c.name).as_ref()))
}

fn compare(current: &VariableValue, expected: &VariableValue) -> Option<Ordering> {
    match (current, expected) {
        (VariableValue::Num(a), VariableValue::Num(b)) => Some(a.cmp(b)),
        (VariableValue::Attr(a), VariableValue::Num(b)) => Some(a.value.cmp(b)),
        (VariableValue::Attr(a), VariableValue::Attr(b)) => Some(a.value.cmp(&b.value)),
        (VariableValue::Bool(a), VariableValue::Bool(b)) => Some(a.cmp(b)),
        (VariableValue::Str(a), VariableValue::Str(b)) => Some(a.to_lowercase().cmp(&b.to_lowercase())),
        (VariableValue::Prof(a), VariableValue::Prof(b)) => Some(a.rank().cmp(&b.rank())),
        (VariableValue::Prof(a), VariableValue::Str(b)) => {
            b.parse::<ProficiencyRank>().ok().map(|rank| a.rank().cmp(&rank))
        }
        _ => None,
    }
}
