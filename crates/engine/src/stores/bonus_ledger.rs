//! Append-only bonus log per variable, and the stacking rule over it.
//!
//! Stacking: bonuses are bucketed by normalised type. The `untyped` bucket
//! sums; every named bucket keeps its maximum. Bonuses with conditional text
//! never count towards the total and are listed as conditionals instead.

use std::collections::{BTreeMap, HashMap};

use charbuild_domain::{Bonus, CharacterId, UNTYPED_BONUS};
use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BonusContribution {
    pub amount: i32,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BonusBucket {
    pub value: i32,
    /// Every bonus that landed in the bucket, in record order.
    pub composition: Vec<BonusContribution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalNote {
    pub text: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BonusBreakdown {
    pub buckets: BTreeMap<String, BonusBucket>,
    pub conditionals: Vec<ConditionalNote>,
}

impl BonusBreakdown {
    pub fn from_bonuses<'a>(bonuses: impl IntoIterator<Item = &'a Bonus>) -> Self {
        let mut breakdown = BonusBreakdown::default();
        for bonus in bonuses {
            if let Some(text) = bonus.conditional_text() {
                breakdown.conditionals.push(ConditionalNote {
                    text: text.to_string(),
                    source: bonus.source.clone(),
                });
                continue;
            }

            let key = bonus.type_key();
            let amount = bonus.value.unwrap_or(0);
            let contribution = BonusContribution {
                amount,
                source: bonus.source.clone(),
            };
            match breakdown.buckets.get_mut(&key) {
                Some(bucket) => {
                    bucket.value = if key == UNTYPED_BONUS {
                        bucket.value.saturating_add(amount)
                    } else {
                        bucket.value.max(amount)
                    };
                    bucket.composition.push(contribution);
                }
                None => {
                    breakdown.buckets.insert(
                        key,
                        BonusBucket {
                            value: amount,
                            composition: vec![contribution],
                        },
                    );
                }
            }
        }
        breakdown
    }

    pub fn total(&self) -> i32 {
        self.buckets.values().map(|b| b.value).fold(0, i32::saturating_add)
    }

    pub fn has_conditionals(&self) -> bool {
        !self.conditionals.is_empty()
    }
}

/// Bonus log per scope and variable. Rebuilt for every evaluation pass.
#[derive(Default)]
pub struct BonusLedger {
    entries: DashMap<CharacterId, HashMap<String, Vec<Bonus>>>,
}

impl BonusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, scope: CharacterId, name: &str, bonus: Bonus) {
        self.entries
            .entry(scope)
            .or_default()
            .entry(name.to_string())
            .or_default()
            .push(bonus);
    }

    pub fn bonuses(&self, scope: CharacterId, name: &str) -> Vec<Bonus> {
        self.entries
            .get(&scope)
            .and_then(|vars| vars.get(name).cloned())
            .unwrap_or_default()
    }

    pub fn breakdown(&self, scope: CharacterId, name: &str) -> BonusBreakdown {
        match self.entries.get(&scope) {
            Some(vars) => BonusBreakdown::from_bonuses(vars.get(name).into_iter().flatten()),
            None => BonusBreakdown::default(),
        }
    }

    pub fn total_value(&self, scope: CharacterId, name: &str) -> i32 {
        self.breakdown(scope, name).total()
    }

    /// Names of every variable with at least one recorded bonus, sorted.
    pub fn variables(&self, scope: CharacterId) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .get(&scope)
            .map(|vars| vars.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn clear_scope(&self, scope: CharacterId) {
        self.entries.remove(&scope);
    }
}
