//! Typed variable values and their type-specific write rules.
//!
//! Three rule sets live here:
//! - `accumulate` - committed `adjust` semantics
//! - `overwrite` - committed `set` semantics
//! - `beats` - the "better than current" comparator used for display

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::proficiency::{ProficiencyLevel, ProficiencyRank, ProficiencyValue};
use crate::error::DomainError;

/// The declared type of a variable. Fixed once the variable exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    #[serde(rename = "num")]
    Num,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "prof")]
    Prof,
    #[serde(rename = "attr")]
    Attr,
    #[serde(rename = "list-str")]
    ListStr,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Num => "num",
            VariableType::Str => "str",
            VariableType::Bool => "bool",
            VariableType::Prof => "prof",
            VariableType::Attr => "attr",
            VariableType::ListStr => "list-str",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "num" => Ok(VariableType::Num),
            "str" => Ok(VariableType::Str),
            "bool" => Ok(VariableType::Bool),
            "prof" => Ok(VariableType::Prof),
            "attr" => Ok(VariableType::Attr),
            "list-str" | "list_str" => Ok(VariableType::ListStr),
            other => Err(DomainError::parse(format!("Unknown variable type: {}", other))),
        }
    }
}

/// Attribute modifier. A partial boost beats a full one at the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeValue {
    pub value: i32,
    #[serde(default)]
    pub partial: bool,
}

impl AttributeValue {
    pub fn new(value: i32, partial: bool) -> Self {
        Self { value, partial }
    }

    /// Strictly better: higher value, or same value and partial over full.
    pub fn is_better_than(&self, other: &AttributeValue) -> bool {
        self.value > other.value || (self.value == other.value && self.partial && !other.partial)
    }
}

/// A variable value. The variant is the value's shape.
///
/// Serialized untagged so the persisted operation format (`"value": 2`,
/// `"value": {"value": "T"}`, ...) round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    Num(i32),
    Str(String),
    ListStr(Vec<String>),
    Attr(AttributeValue),
    Prof(ProficiencyValue),
}

impl VariableValue {
    /// The type this shape belongs to.
    pub fn variable_type(&self) -> VariableType {
        match self {
            VariableValue::Bool(_) => VariableType::Bool,
            VariableValue::Num(_) => VariableType::Num,
            VariableValue::Str(_) => VariableType::Str,
            VariableValue::ListStr(_) => VariableType::ListStr,
            VariableValue::Attr(_) => VariableType::Attr,
            VariableValue::Prof(_) => VariableType::Prof,
        }
    }

    /// Zero value for a type (used when creating variables implicitly).
    pub fn zero(variable_type: VariableType) -> Self {
        match variable_type {
            VariableType::Num => VariableValue::Num(0),
            VariableType::Str => VariableValue::Str(String::new()),
            VariableType::Bool => VariableValue::Bool(false),
            VariableType::Prof => VariableValue::Prof(ProficiencyValue::new(ProficiencyRank::Untrained)),
            VariableType::Attr => VariableValue::Attr(AttributeValue::default()),
            VariableType::ListStr => VariableValue::ListStr(Vec::new()),
        }
    }

    /// Replace relative proficiency steps by the rank they resolve to from untrained.
    pub fn normalized(self) -> Self {
        match self {
            VariableValue::Prof(prof) => {
                let rank = prof.value.apply_to(ProficiencyRank::Untrained);
                VariableValue::Prof(ProficiencyValue {
                    value: ProficiencyLevel::Rank(rank),
                    attribute: prof.attribute,
                })
            }
            other => other,
        }
    }

    /// Committed `adjust`: type-specific accumulation.
    ///
    /// Returns `None` when `delta` has a different shape than `self`.
    pub fn accumulate(&self, delta: &VariableValue) -> Option<VariableValue> {
        match (self, delta) {
            (VariableValue::Num(current), VariableValue::Num(delta)) => {
                Some(VariableValue::Num(current.saturating_add(*delta)))
            }
            (VariableValue::Str(_), VariableValue::Str(value)) => Some(VariableValue::Str(value.clone())),
            (VariableValue::Bool(current), VariableValue::Bool(value)) => {
                Some(VariableValue::Bool(*current || *value))
            }
            (VariableValue::Prof(current), VariableValue::Prof(write)) => {
                Some(VariableValue::Prof(merge_proficiency(current, write)))
            }
            (VariableValue::Attr(current), VariableValue::Attr(value)) => {
                let best = if value.is_better_than(current) { *value } else { *current };
                Some(VariableValue::Attr(best))
            }
            (VariableValue::ListStr(_), VariableValue::ListStr(value)) => {
                Some(VariableValue::ListStr(value.clone()))
            }
            _ => None,
        }
    }

    /// Committed `set`: plain overwrite for num/str/list-str, best value wins
    /// for the ordered types (bool/prof/attr).
    pub fn overwrite(&self, value: &VariableValue) -> Option<VariableValue> {
        match (self, value) {
            (VariableValue::Num(_), VariableValue::Num(value)) => Some(VariableValue::Num(*value)),
            (VariableValue::Str(_), VariableValue::Str(value)) => Some(VariableValue::Str(value.clone())),
            (VariableValue::ListStr(_), VariableValue::ListStr(value)) => {
                Some(VariableValue::ListStr(value.clone()))
            }
            (VariableValue::Bool(_), VariableValue::Bool(_))
            | (VariableValue::Prof(_), VariableValue::Prof(_))
            | (VariableValue::Attr(_), VariableValue::Attr(_)) => self.accumulate(value),
            _ => None,
        }
    }

    /// Display comparator: does `self` replace `best` as the running best value?
    ///
    /// Strict for ordered types, so the first maximum seen is kept. `str` and
    /// `list-str` always replace (last write wins). Shape mismatches and
    /// relative proficiency steps never win.
    pub fn beats(&self, best: &VariableValue) -> bool {
        match (self, best) {
            (VariableValue::Num(value), VariableValue::Num(best)) => value > best,
            (VariableValue::Str(_), VariableValue::Str(_)) => true,
            (VariableValue::ListStr(_), VariableValue::ListStr(_)) => true,
            (VariableValue::Bool(value), VariableValue::Bool(best)) => *value && !*best,
            (VariableValue::Prof(value), VariableValue::Prof(best)) => {
                match (value.value.rank(), best.value.rank()) {
                    (Some(value), Some(best)) => value > best,
                    (Some(_), None) => true,
                    _ => false,
                }
            }
            (VariableValue::Attr(value), VariableValue::Attr(best)) => value.is_better_than(best),
            _ => false,
        }
    }

    pub fn as_num(&self) -> Option<i32> {
        match self {
            VariableValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            VariableValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_prof(&self) -> Option<&ProficiencyValue> {
        match self {
            VariableValue::Prof(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_attr(&self) -> Option<&AttributeValue> {
        match self {
            VariableValue::Attr(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            VariableValue::ListStr(list) => Some(list),
            _ => None,
        }
    }
}

fn merge_proficiency(current: &ProficiencyValue, write: &ProficiencyValue) -> ProficiencyValue {
    let rank = write.value.apply_to(current.rank());
    ProficiencyValue {
        value: ProficiencyLevel::Rank(rank),
        attribute: write.attribute.clone().or_else(|| current.attribute.clone()),
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Bool(b) => write!(f, "{}", b),
            VariableValue::Num(n) => write!(f, "{}", n),
            VariableValue::Str(s) => write!(f, "{}", s),
            VariableValue::ListStr(list) => write!(f, "[{}]", list.join(", ")),
            VariableValue::Attr(attr) => {
                write!(f, "{}{}", attr.value, if attr.partial { " (partial)" } else { "" })
            }
            VariableValue::Prof(prof) => write!(f, "{}", String::from(prof.value)),
        }
    }
}

impl From<i32> for VariableValue {
    fn from(value: i32) -> Self {
        VariableValue::Num(value)
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        VariableValue::Bool(value)
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Str(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Str(value)
    }
}

impl From<Vec<String>> for VariableValue {
    fn from(value: Vec<String>) -> Self {
        VariableValue::ListStr(value)
    }
}

impl From<ProficiencyRank> for VariableValue {
    fn from(rank: ProficiencyRank) -> Self {
        VariableValue::Prof(ProficiencyValue::new(rank))
    }
}

impl From<ProficiencyValue> for VariableValue {
    fn from(value: ProficiencyValue) -> Self {
        VariableValue::Prof(value)
    }
}

impl From<AttributeValue> for VariableValue {
    fn from(value: AttributeValue) -> Self {
        VariableValue::Attr(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prof(rank: ProficiencyRank) -> VariableValue {
        VariableValue::from(rank)
    }

    #[test]
    fn untagged_shapes_deserialize() {
        let cases = [
            ("true", VariableType::Bool),
            ("3", VariableType::Num),
            ("\"Common\"", VariableType::Str),
            ("[\"a\",\"b\"]", VariableType::ListStr),
            ("{\"value\":2,\"partial\":true}", VariableType::Attr),
            ("{\"value\":1}", VariableType::Attr),
            ("{\"value\":\"T\",\"attribute\":\"ATTRIBUTE_DEX\"}", VariableType::Prof),
        ];
        for (json, expected) in cases {
            let value: VariableValue = serde_json::from_str(json).unwrap();
            assert_eq!(value.variable_type(), expected, "{}", json);
        }
    }

    #[test]
    fn num_adjust_sums() {
        let value = VariableValue::Num(10)
            .accumulate(&VariableValue::Num(2))
            .and_then(|v| v.accumulate(&VariableValue::Num(-1)))
            .unwrap();
        assert_eq!(value, VariableValue::Num(11));
    }

    #[test]
    fn adjust_rejects_other_shapes() {
        assert!(VariableValue::Num(1).accumulate(&"x".into()).is_none());
        assert!(prof(ProficiencyRank::Trained).overwrite(&VariableValue::Num(1)).is_none());
    }

    #[test]
    fn prof_adjust_takes_maximum() {
        let mut value = prof(ProficiencyRank::Untrained);
        for rank in [
            ProficiencyRank::Trained,
            ProficiencyRank::Untrained,
            ProficiencyRank::Expert,
            ProficiencyRank::Trained,
        ] {
            value = value.accumulate(&prof(rank)).unwrap();
        }
        assert_eq!(value, prof(ProficiencyRank::Expert));
    }

    #[test]
    fn prof_adjust_keeps_attribute() {
        let current = VariableValue::Prof(
            ProficiencyValue::new(ProficiencyRank::Trained).with_attribute("ATTRIBUTE_DEX"),
        );
        let next = current.accumulate(&prof(ProficiencyRank::Expert)).unwrap();
        assert_eq!(
            next.as_prof().and_then(|p| p.attribute.as_deref()),
            Some("ATTRIBUTE_DEX")
        );
    }

    #[test]
    fn bool_true_dominates() {
        assert_eq!(
            VariableValue::Bool(true).overwrite(&VariableValue::Bool(false)),
            Some(VariableValue::Bool(true))
        );
        assert_eq!(
            VariableValue::Bool(false).accumulate(&VariableValue::Bool(true)),
            Some(VariableValue::Bool(true))
        );
    }

    #[test]
    fn num_set_overwrites() {
        assert_eq!(
            VariableValue::Num(10).overwrite(&VariableValue::Num(4)),
            Some(VariableValue::Num(4))
        );
    }

    #[test]
    fn list_write_replaces() {
        let current = VariableValue::ListStr(vec!["a".into()]);
        let next = current
            .accumulate(&VariableValue::ListStr(vec!["b".into()]))
            .unwrap();
        assert_eq!(next, VariableValue::ListStr(vec!["b".into()]));
    }

    #[test]
    fn attr_partial_wins_ties() {
        let full = AttributeValue::new(2, false);
        let partial = AttributeValue::new(2, true);
        assert!(partial.is_better_than(&full));
        assert!(!full.is_better_than(&partial));
        assert!(AttributeValue::new(3, false).is_better_than(&partial));
    }

    #[test]
    fn beats_is_strict_for_ordered_types() {
        assert!(!prof(ProficiencyRank::Expert).beats(&prof(ProficiencyRank::Expert)));
        assert!(prof(ProficiencyRank::Master).beats(&prof(ProficiencyRank::Expert)));
        assert!(!VariableValue::Num(2).beats(&VariableValue::Num(2)));
        assert!(!VariableValue::Bool(true).beats(&VariableValue::Bool(true)));
        assert!(VariableValue::Str("b".into()).beats(&VariableValue::Str("a".into())));
    }

    #[test]
    fn steps_never_win_display_comparison() {
        let step = VariableValue::Prof(ProficiencyValue {
            value: ProficiencyLevel::Raise,
            attribute: None,
        });
        assert!(!step.beats(&prof(ProficiencyRank::Untrained)));
        assert!(prof(ProficiencyRank::Untrained).beats(&step));
    }

    #[test]
    fn normalized_resolves_steps() {
        let step = VariableValue::Prof(ProficiencyValue {
            value: ProficiencyLevel::Raise,
            attribute: None,
        });
        assert_eq!(step.normalized(), prof(ProficiencyRank::Trained));
    }

    #[test]
    fn variable_type_parses() {
        assert_eq!("list-str".parse::<VariableType>().unwrap(), VariableType::ListStr);
        assert!("float".parse::<VariableType>().is_err());
    }
}
