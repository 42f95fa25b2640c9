//! Selection candidates for `select` operations.
//!
//! Predefined selects resolve each option to its content (or value/custom
//! payload); filtered selects query the content cache and the variable
//! store. Candidates are deduplicated by selection key, first one wins.

mod error;
mod filters;

pub use error::SelectionError;

use filters::{has_required_traits, has_traditions, shares_trait, trait_ids_of, trait_matches};

use std::collections::HashSet;
use std::sync::Arc;

use charbuild_domain::operations::{
    AbilityBlockFilters, AbilityBlockRef, AdjValueFilters, AdjValueGroup, ItemRef, LanguageFilters,
    LanguageRef, SelectFilters, SelectModeType, SelectOption, SpellFilters, SpellGrant,
    SpellGrantType, TraitFilterRef, TraitFilters, TraitGrant, ValueWrite,
};
use charbuild_domain::{
    label_to_variable, variable_label, CharacterId, ContentDetails, ContentEntity, ContentId,
    ContentType, Operation, OperationId, OperationKind, ProficiencyRank, SelectOptionId,
    VariableKind, VariableValue,
};
use serde::Serialize;

use crate::infrastructure::content_cache::{ContentCache, ContentError};
use crate::stores::VariableStore;

/// List variable naming the character's core languages.
pub const CORE_LANGUAGES: &str = "CORE_LANGUAGES";

const UNKNOWN_VALUE_LABEL: &str = "Unknown Value";

/// What a candidate stands for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum CandidateSubject {
    Content {
        entity: ContentEntity,
    },
    Value {
        variable: String,
        label: String,
        value: VariableValue,
    },
    Custom {
        option_id: SelectOptionId,
        title: String,
        description: String,
        operations: Vec<Operation>,
    },
}

/// One entry of a selection list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionCandidate {
    /// Key recorded when the user picks this candidate.
    pub select_uuid: String,
    pub content_type: ContentType,
    #[serde(flatten)]
    pub subject: CandidateSubject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_core: Option<bool>,
}

impl SelectionCandidate {
    fn content(select_uuid: String, entity: ContentEntity) -> Self {
        Self {
            select_uuid,
            content_type: entity.content_type(),
            subject: CandidateSubject::Content { entity },
            meta_data: None,
            is_core: None,
        }
    }

    fn value(select_uuid: String, variable: String, label: String, value: VariableValue) -> Self {
        Self {
            select_uuid,
            content_type: ContentType::AbilityBlock,
            subject: CandidateSubject::Value {
                variable,
                label,
                value,
            },
            meta_data: None,
            is_core: None,
        }
    }

    pub fn label(&self) -> &str {
        match &self.subject {
            CandidateSubject::Content { entity } => &entity.name,
            CandidateSubject::Value { label, .. } => label,
            CandidateSubject::Custom { title, .. } => title,
        }
    }

    /// The operation that applies this candidate when it is chosen from a
    /// filtered select. It takes the select's id so a re-evaluation stays
    /// stable. Custom candidates only exist on predefined selects.
    pub fn to_operation(&self, select_id: OperationId) -> Option<Operation> {
        let kind = match &self.subject {
            CandidateSubject::Content { entity } => match entity.content_type() {
                ContentType::AbilityBlock => OperationKind::GiveAbilityBlock(AbilityBlockRef {
                    block_type: entity.ability_block_type().unwrap_or_default(),
                    ability_block_id: entity.id,
                }),
                ContentType::Spell => OperationKind::GiveSpell(self.spell_grant(entity.id)),
                ContentType::Language => OperationKind::GiveLanguage(LanguageRef {
                    language_id: entity.id,
                }),
                ContentType::Trait => OperationKind::GiveTrait(TraitGrant { trait_id: entity.id }),
                ContentType::Item => OperationKind::GiveItem(ItemRef { item_id: entity.id }),
                _ => return None,
            },
            CandidateSubject::Value { variable, value, .. } => {
                OperationKind::AdjValue(ValueWrite {
                    variable: variable.clone(),
                    value: value.clone(),
                })
            }
            CandidateSubject::Custom { .. } => return None,
        };
        Some(Operation::with_id(select_id, kind))
    }

    /// Spell grant from the passed-through spell data, if it parses.
    fn spell_grant(&self, spell_id: ContentId) -> SpellGrant {
        let mut data = self
            .meta_data
            .clone()
            .filter(serde_json::Value::is_object)
            .unwrap_or_else(|| serde_json::json!({}));
        data["spellId"] = serde_json::json!(spell_id);
        serde_json::from_value(data).unwrap_or(SpellGrant {
            spell_id,
            grant_type: SpellGrantType::Normal,
            casting_source: None,
            rank: None,
            tradition: None,
        })
    }
}

/// Treat a repository failure as "not found"; only a missing source
/// configuration is fatal.
fn soften<T>(result: Result<Option<T>, ContentError>) -> Result<Option<T>, ContentError> {
    match result {
        Err(ContentError::Repo(e)) => {
            tracing::warn!(error = %e, "Content lookup failed, dropping candidate");
            Ok(None)
        }
        other => other,
    }
}

fn dedup(candidates: Vec<SelectionCandidate>) -> Vec<SelectionCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.select_uuid.clone()))
        .collect()
}

pub struct SelectionResolver {
    store: Arc<VariableStore>,
    content: Arc<ContentCache>,
}

impl SelectionResolver {
    pub fn new(store: Arc<VariableStore>, content: Arc<ContentCache>) -> Self {
        Self { store, content }
    }

    /// Candidate list for a `select` operation in `scope`.
    pub async fn candidates(
        &self,
        scope: CharacterId,
        operation: &Operation,
    ) -> Result<Vec<SelectionCandidate>, SelectionError> {
        let OperationKind::Select(select) = &operation.kind else {
            return Err(SelectionError::NotASelection(operation.id));
        };

        let candidates = match select.mode_type {
            SelectModeType::Predefined => self.predefined(scope, select.predefined()).await?,
            SelectModeType::Filtered => match &select.options_filters {
                Some(filters) => self.filtered(scope, filters).await?,
                None => {
                    tracing::debug!(operation_id = %operation.id, "Filtered select has no filters");
                    Vec::new()
                }
            },
        };
        Ok(dedup(candidates))
    }

    /// A training choice that would not change anything: `value` raises to
    /// trained and the skill is already trained or better.
    pub fn is_skill_already_trained(
        &self,
        scope: CharacterId,
        variable: &str,
        value: &VariableValue,
    ) -> bool {
        let Some(skill) = self
            .store
            .all_of_kind(scope, VariableKind::Skill)
            .into_iter()
            .find(|v| v.name() == variable)
        else {
            return false;
        };
        let wants_trained = value
            .as_prof()
            .and_then(|p| p.value.rank())
            .is_some_and(|rank| rank == ProficiencyRank::Trained);
        wants_trained
            && skill
                .value()
                .as_prof()
                .is_some_and(|current| current.rank() >= ProficiencyRank::Trained)
    }

    async fn predefined(
        &self,
        scope: CharacterId,
        options: &[SelectOption],
    ) -> Result<Vec<SelectionCandidate>, ContentError> {
        let mut out = Vec::with_capacity(options.len());
        for option in options {
            let candidate = match option {
                SelectOption::AbilityBlock(o) => match &o.operation.kind {
                    OperationKind::GiveAbilityBlock(r) => {
                        self.content_option(ContentType::AbilityBlock, r.ability_block_id, o.id)
                            .await?
                    }
                    _ => None,
                },
                SelectOption::Spell(o) => match &o.operation.kind {
                    OperationKind::GiveSpell(grant) => self
                        .content_option(ContentType::Spell, grant.spell_id, o.id)
                        .await?
                        .map(|mut c| {
                            c.meta_data = serde_json::to_value(grant).ok();
                            c
                        }),
                    _ => None,
                },
                SelectOption::Language(o) => match &o.operation.kind {
                    OperationKind::GiveLanguage(r) => {
                        self.content_option(ContentType::Language, r.language_id, o.id)
                            .await?
                    }
                    _ => None,
                },
                SelectOption::AdjValue(o) => match &o.operation.kind {
                    OperationKind::AdjValue(w) | OperationKind::SetValue(w) => {
                        let label = match self.store.get(scope, &w.variable) {
                            Some(_) => variable_label(&w.variable),
                            None => UNKNOWN_VALUE_LABEL.to_string(),
                        };
                        Some(SelectionCandidate::value(
                            o.operation.id.to_string(),
                            w.variable.clone(),
                            label,
                            w.value.clone(),
                        ))
                    }
                    _ => None,
                },
                SelectOption::Custom(c) => Some(SelectionCandidate {
                    select_uuid: c.id.to_string(),
                    content_type: ContentType::AbilityBlock,
                    subject: CandidateSubject::Custom {
                        option_id: c.id,
                        title: c.title.clone(),
                        description: c.description.clone(),
                        operations: c.operations.clone(),
                    },
                    meta_data: None,
                    is_core: None,
                }),
            };

            match candidate {
                Some(candidate) => out.push(candidate),
                None => tracing::debug!(option_id = %option.id(), "Select option did not resolve"),
            }
        }
        Ok(out)
    }

    async fn content_option(
        &self,
        content_type: ContentType,
        id: ContentId,
        option_id: SelectOptionId,
    ) -> Result<Option<SelectionCandidate>, ContentError> {
        let entity = soften(self.content.get(content_type, id).await)?;
        Ok(entity.map(|e| SelectionCandidate::content(option_id.to_string(), e)))
    }

    async fn filtered(
        &self,
        scope: CharacterId,
        filters: &SelectFilters,
    ) -> Result<Vec<SelectionCandidate>, ContentError> {
        match filters {
            SelectFilters::AbilityBlock(f) => self.ability_blocks(scope, f).await,
            SelectFilters::Spell(f) => self.spells(f).await,
            SelectFilters::Language(f) => self.languages(scope, f).await,
            SelectFilters::Trait(f) => self.traits(f).await,
            SelectFilters::AdjValue(f) => self.adj_values(scope, f).await,
        }
    }

    async fn ability_blocks(
        &self,
        scope: CharacterId,
        filters: &AbilityBlockFilters,
    ) -> Result<Vec<SelectionCandidate>, ContentError> {
        let mut blocks = self
            .content
            .all(ContentType::AbilityBlock, filters.ability_block_type)
            .await?;

        blocks.retain(|b| !b.is_unselectable());
        blocks.retain(|b| filters.level.contains(b.level()));

        let origins = [
            (filters.is_from_ancestry, VariableKind::AncestryTrait),
            (filters.is_from_class, VariableKind::ClassTrait),
            (filters.is_from_archetype, VariableKind::ArchetypeTrait),
        ];
        for (wanted, kind) in origins {
            if wanted == Some(true) {
                let ids = trait_ids_of(&self.store.all_of_kind(scope, kind));
                blocks.retain(|b| shares_trait(b.traits.as_deref(), &ids));
            }
        }

        if let Some(refs) = &filters.traits {
            let required = self.resolve_trait_refs(refs).await?;
            blocks.retain(|b| has_required_traits(b.traits.as_deref(), &required));
        }

        Ok(blocks
            .into_iter()
            .map(|b| SelectionCandidate::content(b.id.to_string(), b))
            .collect())
    }

    async fn spells(&self, filters: &SpellFilters) -> Result<Vec<SelectionCandidate>, ContentError> {
        let mut spells = self.content.all(ContentType::Spell, None).await?;

        spells.retain(|s| !s.is_unselectable());
        spells.retain(|s| filters.level.contains(s.level()));

        if let Some(refs) = &filters.traits {
            let required = self.resolve_trait_refs(refs).await?;
            spells.retain(|s| has_required_traits(s.traits.as_deref(), &required));
        }
        if let Some(traditions) = &filters.traditions {
            spells.retain(|s| has_traditions(s.traditions(), traditions));
        }

        Ok(spells
            .into_iter()
            .map(|s| {
                let mut candidate = SelectionCandidate::content(s.id.to_string(), s);
                candidate.meta_data = filters.spell_data.clone();
                candidate
            })
            .collect())
    }

    async fn languages(
        &self,
        scope: CharacterId,
        filters: &LanguageFilters,
    ) -> Result<Vec<SelectionCandidate>, ContentError> {
        let mut languages = self.content.all(ContentType::Language, None).await?;

        languages.retain(|l| !l.is_unselectable());
        if let Some(rarity) = &filters.rarity {
            languages.retain(|l| {
                matches!(&l.details, ContentDetails::Language { rarity: Some(r) } if r == rarity)
            });
        }

        let core: Option<Vec<String>> = (filters.core == Some(true)).then(|| {
            self.store
                .get(scope, CORE_LANGUAGES)
                .and_then(|v| v.value().as_list().map(<[String]>::to_vec))
                .unwrap_or_default()
        });

        Ok(languages
            .into_iter()
            .map(|l| {
                let is_core = core.as_ref().map(|core| core.contains(&l.name));
                let mut candidate = SelectionCandidate::content(l.id.to_string(), l);
                candidate.is_core = is_core;
                candidate
            })
            .collect())
    }

    async fn traits(&self, filters: &TraitFilters) -> Result<Vec<SelectionCandidate>, ContentError> {
        let mut traits = self.content.all(ContentType::Trait, None).await?;

        traits.retain(|t| !t.is_unselectable());
        traits.retain(|t| trait_matches(t, filters));

        Ok(traits
            .into_iter()
            .map(|t| SelectionCandidate::content(t.id.to_string(), t))
            .collect())
    }

    async fn adj_values(
        &self,
        scope: CharacterId,
        filters: &AdjValueFilters,
    ) -> Result<Vec<SelectionCandidate>, ContentError> {
        let names: Vec<String> = match filters.group {
            AdjValueGroup::Skill => self.names_of_kind(scope, VariableKind::Skill),
            AdjValueGroup::AddLore => self.names_of_kind(scope, VariableKind::Lore),
            AdjValueGroup::Attribute => self.names_of_kind(scope, VariableKind::Attribute),
            AdjValueGroup::WeaponGroup => self.names_of_kind(scope, VariableKind::WeaponGroup),
            AdjValueGroup::ArmorGroup => self.names_of_kind(scope, VariableKind::ArmorGroup),
            AdjValueGroup::Weapon => self.item_variables("WEAPON", VariableKind::Weapon).await?,
            AdjValueGroup::Armor => self.item_variables("ARMOR", VariableKind::Armor).await?,
        };

        Ok(names
            .into_iter()
            .map(|name| {
                let label = variable_label(&name);
                SelectionCandidate::value(name.clone(), name, label, filters.value.clone())
            })
            .collect())
    }

    fn names_of_kind(&self, scope: CharacterId, kind: VariableKind) -> Vec<String> {
        self.store
            .all_of_kind(scope, kind)
            .iter()
            .map(|v| v.name().to_string())
            .collect()
    }

    /// One proficiency variable name per item of the given group.
    async fn item_variables(
        &self,
        group: &str,
        kind: VariableKind,
    ) -> Result<Vec<String>, ContentError> {
        let items = self.content.all(ContentType::Item, None).await?;
        Ok(items
            .iter()
            .filter(|item| {
                matches!(&item.details, ContentDetails::Item { group: Some(g), .. } if g.eq_ignore_ascii_case(group))
            })
            .map(|item| format!("{}{}", kind.prefix(), label_to_variable(&item.name)))
            .collect())
    }

    async fn resolve_trait_refs(&self, refs: &[TraitFilterRef]) -> Result<Vec<ContentId>, ContentError> {
        let mut ids = Vec::with_capacity(refs.len());
        for r in refs {
            match r {
                TraitFilterRef::Id(id) => ids.push(*id),
                TraitFilterRef::Name(name) => {
                    match soften(self.content.trait_by_name(name).await)? {
                        Some(t) => ids.push(t.id),
                        None => tracing::debug!(trait_name = %name, "Trait filter name did not resolve"),
                    }
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_content::InMemoryContentRepo;
    use crate::infrastructure::ports::{MockContentRepo, RepoError};
    use crate::infrastructure::settings::VivifyPolicy;
    use charbuild_domain::operations::{
        CustomOption, LevelRange, OperationOption, Select, SelectOptionType,
    };
    use charbuild_domain::{
        AbilityBlockType, ContentSourceId, ProficiencyValue, VariableType,
    };

    const SOURCE: ContentSourceId = ContentSourceId::new(1);

    fn feat(id: i64, name: &str, level: Option<i32>, traits: Option<Vec<i64>>) -> ContentEntity {
        let mut e = ContentEntity::new(
            ContentId::new(id),
            name,
            ContentDetails::AbilityBlock {
                block_type: AbilityBlockType::Feat,
                level,
            },
        )
        .with_source(SOURCE);
        e.traits = traits.map(|t| t.into_iter().map(ContentId::new).collect());
        e
    }

    fn trait_entity(id: i64, name: &str) -> ContentEntity {
        ContentEntity::new(ContentId::new(id), name, ContentDetails::Trait).with_source(SOURCE)
    }

    fn spell(id: i64, name: &str, rank: i32, traditions: &[&str]) -> ContentEntity {
        ContentEntity::new(
            ContentId::new(id),
            name,
            ContentDetails::Spell {
                rank,
                traditions: traditions.iter().map(|t| t.to_string()).collect(),
            },
        )
        .with_source(SOURCE)
    }

    async fn resolver(entities: Vec<ContentEntity>) -> (SelectionResolver, Arc<VariableStore>, CharacterId) {
        let cache = Arc::new(ContentCache::new(Arc::new(InMemoryContentRepo::new(entities)), 1000));
        cache.define_enabled_sources([SOURCE]).await;
        let store = Arc::new(VariableStore::new(VivifyPolicy::Reject));
        (SelectionResolver::new(store.clone(), cache), store, CharacterId::new())
    }

    fn filtered(filters: SelectFilters) -> Operation {
        Operation::new(OperationKind::Select(Select {
            mode_type: SelectModeType::Filtered,
            option_type: filters.option_type(),
            options_filters: Some(filters),
            ..Default::default()
        }))
    }

    fn predefined(option_type: SelectOptionType, options: Vec<SelectOption>) -> Operation {
        Operation::new(OperationKind::Select(Select {
            option_type,
            options_predefined: Some(options),
            ..Default::default()
        }))
    }

    fn names(candidates: &[SelectionCandidate]) -> Vec<&str> {
        candidates.iter().map(SelectionCandidate::label).collect()
    }

    #[tokio::test]
    async fn ability_block_filters_apply_level_and_traits() {
        let (resolver, _, scope) = resolver(vec![
            trait_entity(100, "Fighter"),
            feat(1, "Power Attack", Some(1), Some(vec![100])),
            feat(2, "Sudden Charge", Some(3), Some(vec![100])),
            feat(3, "Toughness", Some(1), None),
            feat(4, "Unleveled", None, Some(vec![100])),
        ])
        .await;

        let op = filtered(SelectFilters::AbilityBlock(AbilityBlockFilters {
            level: LevelRange::between(1, 2),
            traits: Some(vec![TraitFilterRef::Name("fighter".into())]),
            ..Default::default()
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Power Attack"]);
        assert_eq!(candidates[0].select_uuid, "1");
    }

    #[tokio::test]
    async fn unresolved_trait_names_match_everything() {
        let (resolver, _, scope) = resolver(vec![
            feat(1, "Power Attack", Some(1), Some(vec![100])),
            feat(3, "Toughness", Some(1), None),
        ])
        .await;

        let op = filtered(SelectFilters::AbilityBlock(AbilityBlockFilters {
            traits: Some(vec![TraitFilterRef::Name("Nonexistent".into())]),
            ..Default::default()
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn unselectable_blocks_are_excluded() {
        let mut hidden = feat(2, "Hidden", Some(1), None);
        hidden.meta_data.unselectable = true;
        let (resolver, _, scope) = resolver(vec![feat(1, "Shown", Some(1), None), hidden]).await;

        let op = filtered(SelectFilters::AbilityBlock(AbilityBlockFilters::default()));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Shown"]);
    }

    #[tokio::test]
    async fn is_from_ancestry_uses_trait_variables() {
        let (resolver, store, scope) = resolver(vec![
            feat(1, "Dwarven Lore", Some(1), Some(vec![7])),
            feat(2, "Elven Lore", Some(1), Some(vec![8])),
            feat(3, "Generic", Some(1), None),
        ])
        .await;
        store
            .create(scope, "TRAIT_ANCESTRY_DWARF", VariableType::Str, "7".into())
            .unwrap();

        let op = filtered(SelectFilters::AbilityBlock(AbilityBlockFilters {
            is_from_ancestry: Some(true),
            ..Default::default()
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Dwarven Lore"]);
    }

    #[tokio::test]
    async fn spell_filters_check_rank_and_traditions() {
        let (resolver, _, scope) = resolver(vec![
            spell(1, "Shield", 1, &["Arcane", "Divine"]),
            spell(2, "Fireball", 3, &["Arcane"]),
            spell(3, "Heal", 1, &["Divine"]),
        ])
        .await;

        let op = filtered(SelectFilters::Spell(SpellFilters {
            level: LevelRange {
                min: None,
                max: Some(2),
            },
            traditions: Some(vec!["ARCANE".into()]),
            spell_data: Some(serde_json::json!({"type": "INNATE"})),
            ..Default::default()
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Shield"]);

        let applied = candidates[0].to_operation(op.id).unwrap();
        assert_eq!(applied.id, op.id);
        match applied.kind {
            OperationKind::GiveSpell(grant) => {
                assert_eq!(grant.spell_id, ContentId::new(1));
                assert_eq!(grant.grant_type, SpellGrantType::Innate);
            }
            other => panic!("expected giveSpell, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn language_core_flag_comes_from_variable() {
        let language = |id, name: &str, rarity: &str| {
            ContentEntity::new(
                ContentId::new(id),
                name,
                ContentDetails::Language {
                    rarity: Some(rarity.to_string()),
                },
            )
            .with_source(SOURCE)
        };
        let (resolver, store, scope) = resolver(vec![
            language(1, "Common", "COMMON"),
            language(2, "Dwarven", "COMMON"),
            language(3, "Aklo", "UNCOMMON"),
        ])
        .await;
        store
            .create(
                scope,
                CORE_LANGUAGES,
                VariableType::ListStr,
                vec!["Dwarven".to_string()].into(),
            )
            .unwrap();

        let op = filtered(SelectFilters::Language(LanguageFilters {
            rarity: Some("COMMON".into()),
            core: Some(true),
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        let flags: Vec<_> = candidates.iter().map(|c| (c.label(), c.is_core)).collect();
        assert_eq!(flags, vec![("Common", Some(false)), ("Dwarven", Some(true))]);
    }

    #[tokio::test]
    async fn trait_filters_use_meta_flags() {
        let mut dwarf = trait_entity(1, "Dwarf");
        dwarf.meta_data.ancestry_trait = true;
        let mut fighter = trait_entity(2, "Fighter");
        fighter.meta_data.class_trait = true;
        let (resolver, _, scope) = resolver(vec![dwarf, fighter]).await;

        let op = filtered(SelectFilters::Trait(TraitFilters {
            is_class: Some(true),
            ..Default::default()
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Fighter"]);
    }

    #[tokio::test]
    async fn adj_value_groups_list_store_variables() {
        let (resolver, store, scope) = resolver(vec![]).await;
        for name in ["SKILL_ATHLETICS", "SKILL_LORE_SAILING", "ATTRIBUTE_STR"] {
            let ty = if name.starts_with("ATTRIBUTE") {
                VariableType::Attr
            } else {
                VariableType::Prof
            };
            store.create(scope, name, ty, VariableValue::zero(ty)).unwrap();
        }
        let trained: VariableValue = ProficiencyValue::new(ProficiencyRank::Trained).into();

        let op = filtered(SelectFilters::AdjValue(AdjValueFilters {
            group: AdjValueGroup::Skill,
            value: trained.clone(),
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Athletics", "Sailing Lore"]);
        assert_eq!(candidates[0].select_uuid, "SKILL_ATHLETICS");

        let op = filtered(SelectFilters::AdjValue(AdjValueFilters {
            group: AdjValueGroup::AddLore,
            value: trained,
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Sailing Lore"]);
    }

    #[tokio::test]
    async fn weapon_group_comes_from_items() {
        let item = |id, name: &str, group: &str| {
            ContentEntity::new(
                ContentId::new(id),
                name,
                ContentDetails::Item {
                    group: Some(group.to_string()),
                    level: Some(0),
                },
            )
            .with_source(SOURCE)
        };
        let (resolver, _, scope) = resolver(vec![
            item(1, "Long Sword", "WEAPON"),
            item(2, "Chain Mail", "ARMOR"),
        ])
        .await;

        let op = filtered(SelectFilters::AdjValue(AdjValueFilters {
            group: AdjValueGroup::Weapon,
            value: ProficiencyValue::new(ProficiencyRank::Trained).into(),
        }));
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        let keys: Vec<_> = candidates.iter().map(|c| c.select_uuid.as_str()).collect();
        assert_eq!(keys, vec!["WEAPON_LONG_SWORD"]);
    }

    #[tokio::test]
    async fn predefined_options_resolve_and_skip_missing_content() {
        let (resolver, store, scope) = resolver(vec![feat(1, "Power Attack", Some(1), None)]).await;
        store
            .create(scope, "SKILL_STEALTH", VariableType::Prof, VariableValue::zero(VariableType::Prof))
            .unwrap();

        let present = SelectOption::AbilityBlock(OperationOption {
            id: SelectOptionId::new(),
            operation: Operation::new(OperationKind::GiveAbilityBlock(AbilityBlockRef {
                block_type: AbilityBlockType::Feat,
                ability_block_id: ContentId::new(1),
            })),
        });
        let missing = SelectOption::AbilityBlock(OperationOption {
            id: SelectOptionId::new(),
            operation: Operation::new(OperationKind::GiveAbilityBlock(AbilityBlockRef {
                block_type: AbilityBlockType::Feat,
                ability_block_id: ContentId::new(99),
            })),
        });
        let op = predefined(SelectOptionType::AbilityBlock, vec![present.clone(), missing]);
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Power Attack"]);
        assert_eq!(candidates[0].select_uuid, present.id().to_string());

        let known = Operation::adj_value("SKILL_STEALTH", ProficiencyValue::new(ProficiencyRank::Trained));
        let unknown = Operation::adj_value("SKILL_NOPE", 1);
        let known_id = known.id;
        let op = predefined(
            SelectOptionType::AdjValue,
            vec![
                SelectOption::AdjValue(OperationOption {
                    id: SelectOptionId::new(),
                    operation: known,
                }),
                SelectOption::AdjValue(OperationOption {
                    id: SelectOptionId::new(),
                    operation: unknown,
                }),
            ],
        );
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Stealth", "Unknown Value"]);
        assert_eq!(candidates[0].select_uuid, known_id.to_string());
    }

    #[tokio::test]
    async fn custom_options_carry_their_operations() {
        let (resolver, _, scope) = resolver(vec![]).await;
        let custom = CustomOption {
            id: SelectOptionId::new(),
            title: "Keen Eyes".into(),
            description: "Sharper senses".into(),
            operations: vec![Operation::adj_value("PERCEPTION_BONUS", 1)],
        };
        let op = predefined(SelectOptionType::Custom, vec![SelectOption::Custom(custom.clone())]);
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].select_uuid, custom.id.to_string());
        assert!(candidates[0].to_operation(op.id).is_none());
        match &candidates[0].subject {
            CandidateSubject::Custom { operations, .. } => assert_eq!(operations.len(), 1),
            other => panic!("expected custom subject, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_keys_keep_the_first_candidate() {
        let (resolver, _, scope) = resolver(vec![feat(1, "Power Attack", Some(1), None)]).await;
        let option = SelectOption::AbilityBlock(OperationOption {
            id: SelectOptionId::new(),
            operation: Operation::new(OperationKind::GiveAbilityBlock(AbilityBlockRef {
                block_type: AbilityBlockType::Feat,
                ability_block_id: ContentId::new(1),
            })),
        });
        let op = predefined(SelectOptionType::AbilityBlock, vec![option.clone(), option]);
        assert_eq!(resolver.candidates(scope, &op).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn options_sharing_content_stay_distinct() {
        let (resolver, _, scope) = resolver(vec![feat(7, "Power Attack", Some(1), None)]).await;
        let option = || {
            SelectOption::AbilityBlock(OperationOption {
                id: SelectOptionId::new(),
                operation: Operation::new(OperationKind::GiveAbilityBlock(AbilityBlockRef {
                    block_type: AbilityBlockType::Feat,
                    ability_block_id: ContentId::new(7),
                })),
            })
        };
        let op = predefined(SelectOptionType::AbilityBlock, vec![option(), option()]);
        let candidates = resolver.candidates(scope, &op).await.unwrap();
        assert_eq!(names(&candidates), vec!["Power Attack", "Power Attack"]);
        assert_ne!(candidates[0].select_uuid, candidates[1].select_uuid);
    }

    #[tokio::test]
    async fn missing_sources_are_fatal() {
        let cache = Arc::new(ContentCache::new(Arc::new(InMemoryContentRepo::new(vec![])), 10));
        let resolver = SelectionResolver::new(Arc::new(VariableStore::new(VivifyPolicy::Reject)), cache);
        let op = filtered(SelectFilters::Trait(TraitFilters::default()));
        let err = resolver.candidates(CharacterId::new(), &op).await.unwrap_err();
        assert!(matches!(
            err,
            SelectionError::Content(ContentError::NoEnabledContentSources)
        ));
    }

    #[tokio::test]
    async fn repo_failures_drop_predefined_options() {
        let mut repo = MockContentRepo::new();
        repo.expect_find_by_id()
            .returning(|_, _, _| Err(RepoError::database("find_by_id", "connection reset")));
        let cache = Arc::new(ContentCache::new(Arc::new(repo), 10));
        cache.define_enabled_sources([SOURCE]).await;
        let resolver = SelectionResolver::new(Arc::new(VariableStore::new(VivifyPolicy::Reject)), cache);

        let op = predefined(
            SelectOptionType::Language,
            vec![SelectOption::Language(OperationOption {
                id: SelectOptionId::new(),
                operation: Operation::new(OperationKind::GiveLanguage(LanguageRef {
                    language_id: ContentId::new(5),
                })),
            })],
        );
        assert!(resolver.candidates(CharacterId::new(), &op).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn not_a_select_is_rejected() {
        let (resolver, _, scope) = resolver(vec![]).await;
        let op = Operation::adj_value("LEVEL", 1);
        assert!(matches!(
            resolver.candidates(scope, &op).await,
            Err(SelectionError::NotASelection(id)) if id == op.id
        ));
    }

    #[tokio::test]
    async fn skill_already_trained_only_for_trained_choices() {
        let (resolver, store, scope) = resolver(vec![]).await;
        store
            .create(
                scope,
                "SKILL_ARCANA",
                VariableType::Prof,
                ProficiencyValue::new(ProficiencyRank::Expert).into(),
            )
            .unwrap();
        let trained: VariableValue = ProficiencyValue::new(ProficiencyRank::Trained).into();
        let master: VariableValue = ProficiencyValue::new(ProficiencyRank::Master).into();

        assert!(resolver.is_skill_already_trained(scope, "SKILL_ARCANA", &trained));
        assert!(!resolver.is_skill_already_trained(scope, "SKILL_ARCANA", &master));
        assert!(!resolver.is_skill_already_trained(scope, "SKILL_CRAFTING", &trained));
    }
}
