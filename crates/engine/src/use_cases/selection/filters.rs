//! Pure predicates behind filtered selection lists.

use charbuild_domain::operations::TraitFilters;
use charbuild_domain::{ContentEntity, ContentId, Variable, VariableValue};

/// Whether a candidate carries every required trait.
///
/// An empty requirement matches everything, including candidates with no
/// trait list. A non-empty requirement never matches a candidate without
/// one.
pub(super) fn has_required_traits(traits: Option<&[ContentId]>, required: &[ContentId]) -> bool {
    if required.is_empty() {
        return true;
    }
    match traits {
        Some(traits) => required.iter().all(|id| traits.contains(id)),
        None => false,
    }
}

/// Whether a candidate shares at least one trait with `ids`.
pub(super) fn shares_trait(traits: Option<&[ContentId]>, ids: &[ContentId]) -> bool {
    traits.is_some_and(|traits| traits.iter().any(|id| ids.contains(id)))
}

/// Every required tradition is present, compared case-insensitively.
pub(super) fn has_traditions(traditions: &[String], required: &[String]) -> bool {
    required
        .iter()
        .all(|r| traditions.iter().any(|t| t.eq_ignore_ascii_case(r)))
}

/// Trait ids held by trait-bearing variables. Values are stored as a
/// number or a numeric string; anything else is ignored.
pub(super) fn trait_ids_of(variables: &[Variable]) -> Vec<ContentId> {
    variables
        .iter()
        .filter_map(|v| match v.value() {
            VariableValue::Num(n) => Some(ContentId::new(i64::from(*n))),
            VariableValue::Str(s) => s.parse().ok(),
            _ => None,
        })
        .collect()
}

pub(super) fn trait_matches(entity: &ContentEntity, filters: &TraitFilters) -> bool {
    let meta = &entity.meta_data;
    if filters.is_creature == Some(true) && !meta.creature_trait {
        return false;
    }
    if filters.is_ancestry == Some(true) && !(meta.ancestry_trait || meta.versatile_heritage_trait) {
        return false;
    }
    if filters.is_class == Some(true) && !meta.class_trait {
        return false;
    }
    true
}
