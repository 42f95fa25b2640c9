//! Components of a proficiency total.

use serde::Serialize;

use crate::stores::BonusBreakdown;

/// Level, rank bonus, attribute modifier and stacked bonuses behind a
/// proficiency variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProficiencyParts {
    /// Character level, or 0 while untrained.
    pub level: i32,
    pub prof_value: i32,
    /// `None` when the proficiency names no attribute or it is missing.
    pub attribute_mod: Option<i32>,
    pub total_bonus_value: i32,
    pub has_conditionals: bool,
    pub breakdown: BonusBreakdown,
}

impl ProficiencyParts {
    pub fn total(&self) -> i32 {
        [
            self.level,
            self.prof_value,
            self.attribute_mod.unwrap_or(0),
            self.total_bonus_value,
        ]
        .into_iter()
        .fold(0, i32::saturating_add)
    }

    pub fn dc(&self) -> i32 {
        self.total().saturating_add(10)
    }
}
