//! Variable name categories.
//!
//! Every "list all skills / attributes / weapon groups" query goes through
//! this table instead of matching prefixes at the call site.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Skill,
    Lore,
    Attribute,
    Save,
    WeaponGroup,
    ArmorGroup,
    Weapon,
    Armor,
    AncestryTrait,
    ClassTrait,
    ArchetypeTrait,
}

struct KindRule {
    kind: VariableKind,
    prefix: &'static str,
    excludes: &'static [&'static str],
    suffix: Option<&'static str>,
}

const KIND_TABLE: &[KindRule] = &[
    KindRule {
        kind: VariableKind::Skill,
        prefix: "SKILL_",
        excludes: &[],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::Lore,
        prefix: "SKILL_LORE_",
        excludes: &[],
        suffix: Some("Lore"),
    },
    KindRule {
        kind: VariableKind::Attribute,
        prefix: "ATTRIBUTE_",
        excludes: &[],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::Save,
        prefix: "SAVE_",
        excludes: &[],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::WeaponGroup,
        prefix: "WEAPON_GROUP_",
        excludes: &[],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::ArmorGroup,
        prefix: "ARMOR_GROUP_",
        excludes: &[],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::Weapon,
        prefix: "WEAPON_",
        excludes: &["WEAPON_GROUP_"],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::Armor,
        prefix: "ARMOR_",
        excludes: &["ARMOR_GROUP_"],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::AncestryTrait,
        prefix: "TRAIT_ANCESTRY_",
        excludes: &[],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::ClassTrait,
        prefix: "TRAIT_CLASS_",
        excludes: &[],
        suffix: None,
    },
    KindRule {
        kind: VariableKind::ArchetypeTrait,
        prefix: "TRAIT_ARCHETYPE_",
        excludes: &[],
        suffix: None,
    },
];

impl VariableKind {
    fn rule(&self) -> &'static KindRule {
        // The table holds one rule per kind.
        KIND_TABLE
            .iter()
            .find(|rule| rule.kind == *self)
            .unwrap_or(&KIND_TABLE[0])
    }

    pub fn prefix(&self) -> &'static str {
        self.rule().prefix
    }

    /// Whether `name` belongs to this kind. Lore skills are also skills.
    pub fn matches(&self, name: &str) -> bool {
        let rule = self.rule();
        name.starts_with(rule.prefix) && !rule.excludes.iter().any(|ex| name.starts_with(ex))
    }

    /// Most specific kind for a name, if any.
    pub fn of(name: &str) -> Option<VariableKind> {
        KIND_TABLE
            .iter()
            .filter(|rule| rule.kind.matches(name))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| rule.kind)
    }
}

/// Human label for a variable name: `SKILL_STEALTH` -> `Stealth`,
/// `SKILL_LORE_SAILING` -> `Sailing Lore`, `SAVE_FORT` -> `Fort`.
pub fn variable_label(name: &str) -> String {
    let (rest, suffix) = match VariableKind::of(name) {
        Some(kind) => {
            let rule = kind.rule();
            (&name[rule.prefix.len()..], rule.suffix)
        }
        None => (name, None),
    };

    let mut label = rest
        .split('_')
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(suffix) = suffix {
        label.push(' ');
        label.push_str(suffix);
    }
    label
}

/// Inverse of the word part of a label: `Long Sword` -> `LONG_SWORD`.
pub fn label_to_variable(label: &str) -> String {
    label
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_uppercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
