//! Evaluation scenarios: committed values, grants and selections over an
//! in-memory content bundle.

use std::sync::Arc;

use charbuild_domain::operations::{
    AbilityBlockFilters, AbilityBlockRef, BonusGrant, CastingSourceDefinition, Condition,
    ConditionOperator, Conditional, LevelRange, OperationOption, Select, SelectFilters,
    SelectOption, SelectOptionType, SpellSlot, SpellSlotGrant, TraitFilterRef, CASTING_SOURCES,
};
use charbuild_domain::{
    AbilityBlockType, ContentDetails, ContentEntity, ContentId, ContentSourceId, ContentType,
    OperationType, ProficiencyRank, ProficiencyValue, SelectOptionId, VariableType,
};
use chrono::{TimeZone, Utc};

use super::*;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::memory_content::InMemoryContentRepo;
use crate::infrastructure::ports::{ContentRepo, MockClockPort, MockContentRepo, RepoError};
use crate::infrastructure::settings::VivifyPolicy;
use crate::use_cases::display::StatDisplay;

const SOURCE: ContentSourceId = ContentSourceId::new(1);

struct Harness {
    evaluator: Evaluator,
    store: Arc<VariableStore>,
    ledger: Arc<BonusLedger>,
    scope: CharacterId,
}

impl Harness {
    async fn new(entities: Vec<ContentEntity>) -> Self {
        Self::with(Arc::new(InMemoryContentRepo::new(entities)), EngineSettings::default(), true).await
    }

    async fn with(repo: Arc<dyn ContentRepo>, settings: EngineSettings, enable_sources: bool) -> Self {
        let content = Arc::new(ContentCache::new(repo, settings.max_entities_per_source));
        if enable_sources {
            content.define_enabled_sources([SOURCE]).await;
        }
        let store = Arc::new(VariableStore::new(settings.vivify_policy));
        let ledger = Arc::new(BonusLedger::new());
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        Self {
            evaluator: Evaluator::new(store.clone(), ledger.clone(), content, clock, &settings),
            store,
            ledger,
            scope: CharacterId::new(),
        }
    }

    fn request(&self, baseline: Vec<Variable>, operations: Vec<Operation>) -> EvaluationRequest {
        EvaluationRequest::new(self.scope, baseline, operations)
    }

    async fn run(&self, baseline: Vec<Variable>, operations: Vec<Operation>) -> EvaluationReport {
        self.evaluator
            .evaluate(&self.request(baseline, operations))
            .await
            .unwrap()
    }
}

fn num(name: &str, value: i32) -> Variable {
    Variable::new(name, VariableType::Num, value.into()).unwrap()
}

fn prof(name: &str, rank: ProficiencyRank) -> Variable {
    Variable::new(name, VariableType::Prof, ProficiencyValue::new(rank).into()).unwrap()
}

fn rank_write(name: &str, rank: ProficiencyRank) -> Operation {
    Operation::adj_value(name, ProficiencyValue::new(rank))
}

fn feat(id: i64, name: &str, level: i32) -> ContentEntity {
    ContentEntity::new(
        ContentId::new(id),
        name,
        ContentDetails::AbilityBlock {
            block_type: AbilityBlockType::Feat,
            level: Some(level),
        },
    )
    .with_source(SOURCE)
}

fn trait_entity(id: i64, name: &str) -> ContentEntity {
    ContentEntity::new(ContentId::new(id), name, ContentDetails::Trait).with_source(SOURCE)
}

fn give_feat(id: i64) -> Operation {
    Operation::new(OperationKind::GiveAbilityBlock(AbilityBlockRef {
        block_type: AbilityBlockType::Feat,
        ability_block_id: ContentId::new(id),
    }))
}

fn bonus(variable: &str, value: Option<i32>, bonus_type: Option<&str>, text: Option<&str>) -> Operation {
    Operation::new(OperationKind::AddBonusToValue(BonusGrant {
        variable: variable.to_string(),
        value,
        bonus_type: bonus_type.map(str::to_string),
        text: text.map(str::to_string),
    }))
}

fn value_select(options: Vec<Operation>) -> Operation {
    Operation::new(OperationKind::Select(Select {
        title: Some("Skill Training".into()),
        option_type: SelectOptionType::AdjValue,
        options_predefined: Some(
            options
                .into_iter()
                .map(|operation| {
                    SelectOption::AdjValue(OperationOption {
                        id: SelectOptionId::new(),
                        operation,
                    })
                })
                .collect(),
        ),
        ..Default::default()
    }))
}

fn feat_filter_select(min: i32, max: i32, trait_id: i64) -> Operation {
    let filters = SelectFilters::AbilityBlock(AbilityBlockFilters {
        level: LevelRange::between(min, max),
        traits: Some(vec![TraitFilterRef::Id(ContentId::new(trait_id))]),
        ..Default::default()
    });
    Operation::new(OperationKind::Select(Select {
        mode_type: SelectModeType::Filtered,
        option_type: filters.option_type(),
        options_filters: Some(filters),
        ..Default::default()
    }))
}

#[tokio::test]
async fn adjustments_accumulate_on_the_baseline() {
    let h = Harness::new(vec![]).await;
    let report = h
        .run(
            vec![num("AC", 10)],
            vec![Operation::adj_value("AC", 2), Operation::adj_value("AC", -1)],
        )
        .await;

    assert_eq!(report.variable("AC").unwrap().value(), &VariableValue::Num(11));
    assert_eq!(report.passes, 1);
    assert!(report.diagnostics.is_empty());
}

#[tokio::test]
async fn accumulation_does_not_depend_on_order() {
    let h = Harness::new(vec![]).await;
    let deltas = [3, -2, 5, 1, -4];
    let forward: Vec<_> = deltas.iter().map(|d| Operation::adj_value("SPEED", *d)).collect();
    let mut backward = forward.clone();
    backward.reverse();

    let a = h.run(vec![num("SPEED", 25)], forward).await;
    let b = h.run(vec![num("SPEED", 25)], backward).await;

    let expected = VariableValue::Num(25 + deltas.iter().sum::<i32>());
    assert_eq!(a.variable("SPEED").unwrap().value(), &expected);
    assert_eq!(b.variable("SPEED").unwrap().value(), &expected);
}

#[tokio::test]
async fn proficiency_writes_keep_the_highest_rank() {
    use ProficiencyRank::*;

    let h = Harness::new(vec![]).await;
    let ranks = [Trained, Untrained, Expert, Trained];
    let mut ops: Vec<_> = ranks.iter().map(|r| rank_write("SAVE_FORT", *r)).collect();

    let report = h.run(vec![prof("SAVE_FORT", Untrained)], ops.clone()).await;
    assert_eq!(
        report.variable("SAVE_FORT").unwrap().value(),
        &VariableValue::from(Expert)
    );

    ops.rotate_left(2);
    let report = h.run(vec![prof("SAVE_FORT", Untrained)], ops).await;
    assert_eq!(
        report.variable("SAVE_FORT").unwrap().value(),
        &VariableValue::from(Expert)
    );
}

#[tokio::test]
async fn bonuses_stack_by_type() {
    let h = Harness::new(vec![]).await;
    let report = h
        .run(
            vec![num("AC", 10), num("PERCEPTION", 0)],
            vec![
                bonus("AC", Some(2), Some("item"), None),
                bonus("AC", Some(3), Some("Item"), None),
                bonus("PERCEPTION", Some(2), None, None),
                bonus("PERCEPTION", Some(3), None, None),
                bonus("PERCEPTION", None, None, Some("+1 if flanking")),
            ],
        )
        .await;

    assert_eq!(report.bonuses["AC"].total(), 3);
    assert!(!report.bonuses["AC"].has_conditionals());
    assert_eq!(report.bonuses["PERCEPTION"].total(), 5);
    assert!(report.bonuses["PERCEPTION"].has_conditionals());

    let stamped = h.ledger.bonuses(h.scope, "AC");
    assert!(stamped.iter().all(|b| b.source == CHARACTER_SOURCE));
    assert_eq!(stamped[0].timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
}

#[tokio::test]
async fn bonuses_are_stamped_by_the_clock() {
    let content = Arc::new(ContentCache::new(Arc::new(InMemoryContentRepo::new(vec![])), 100));
    content.define_enabled_sources([SOURCE]).await;
    let store = Arc::new(VariableStore::new(VivifyPolicy::Reject));
    let ledger = Arc::new(BonusLedger::new());
    let stamp = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let mut clock = MockClockPort::new();
    clock.expect_now().times(2).returning(move || stamp);
    let evaluator = Evaluator::new(
        store,
        ledger.clone(),
        content,
        Arc::new(clock),
        &EngineSettings::default(),
    );
    let scope = CharacterId::new();

    let request = EvaluationRequest::new(
        scope,
        vec![num("AC", 10)],
        vec![
            bonus("AC", Some(1), None, None),
            Operation::adj_value("AC", 1),
            bonus("AC", None, None, Some("+2 against traps")),
        ],
    );
    evaluator.evaluate(&request).await.unwrap();

    let stamped = ledger.bonuses(scope, "AC");
    assert_eq!(stamped.len(), 2);
    assert!(stamped.iter().all(|b| b.timestamp == stamp));
}

#[tokio::test]
async fn chosen_value_option_is_applied() {
    let h = Harness::new(vec![]).await;
    let stealth = Operation::set_value("SKILL_STEALTH", ProficiencyValue::new(ProficiencyRank::Trained));
    let athletics = Operation::set_value("SKILL_ATHLETICS", ProficiencyValue::new(ProficiencyRank::Trained));
    let select = value_select(vec![stealth.clone(), athletics]);
    let operations = vec![
        Operation::set_value("SKILL_STEALTH", ProficiencyValue::new(ProficiencyRank::Untrained)),
        select.clone(),
    ];
    let baseline = vec![
        prof("SKILL_STEALTH", ProficiencyRank::Untrained),
        prof("SKILL_ATHLETICS", ProficiencyRank::Untrained),
    ];

    let request = h
        .request(baseline, operations)
        .with_choice(select.id, stealth.id.to_string());
    let report = h.evaluator.evaluate(&request).await.unwrap();

    assert_eq!(
        report.variable("SKILL_STEALTH").unwrap().value(),
        &VariableValue::from(ProficiencyRank::Trained)
    );
    assert_eq!(
        report.variable("SKILL_ATHLETICS").unwrap().value(),
        &VariableValue::from(ProficiencyRank::Untrained)
    );
    assert!(report.pending_selections.is_empty());
}

#[tokio::test]
async fn open_select_is_pending_and_wins_best_value() {
    let h = Harness::new(vec![]).await;
    let select = value_select(vec![
        Operation::set_value("SKILL_STEALTH", ProficiencyValue::new(ProficiencyRank::Trained)),
        Operation::set_value("SKILL_ATHLETICS", ProficiencyValue::new(ProficiencyRank::Trained)),
    ]);
    let operations = vec![
        Operation::set_value("SKILL_STEALTH", ProficiencyValue::new(ProficiencyRank::Untrained)),
        select.clone(),
    ];
    let report = h
        .run(vec![prof("SKILL_STEALTH", ProficiencyRank::Untrained)], operations.clone())
        .await;

    assert_eq!(
        report.variable("SKILL_STEALTH").unwrap().value(),
        &VariableValue::from(ProficiencyRank::Untrained)
    );
    assert_eq!(report.pending_selections.len(), 1);
    assert_eq!(report.pending_selections[0].operation_id, select.id);
    assert_eq!(report.pending_selections[0].title.as_deref(), Some("Skill Training"));

    let display = StatDisplay::new(h.store.clone(), h.ledger.clone());
    let best = display
        .best_value(h.scope, "SKILL_STEALTH", &operations, &SelectionChoices::new())
        .unwrap();
    assert_eq!(best.pending_select, Some(select));
}

#[tokio::test]
async fn filtered_feat_choice_is_granted() {
    let h = Harness::new(vec![
        trait_entity(7, "General"),
        trait_entity(9, "Skill"),
        feat(1, "Assurance", 4).with_traits(vec![ContentId::new(7), ContentId::new(9)]),
        feat(2, "Robust Health", 6).with_traits(vec![ContentId::new(7)]),
        feat(3, "Quick Jump", 4).with_traits(vec![ContentId::new(9)]),
    ])
    .await;
    let select = feat_filter_select(3, 5, 7);

    let request = h.request(vec![], vec![select.clone()]).with_choice(select.id, "1");
    let report = h.evaluator.evaluate(&request).await.unwrap();
    assert!(report.granted(ContentType::AbilityBlock, ContentId::new(1)));
    assert_eq!(report.grants[0].operation_id, select.id);

    for excluded in ["2", "3"] {
        let request = h.request(vec![], vec![select.clone()]).with_choice(select.id, excluded);
        let report = h.evaluator.evaluate(&request).await.unwrap();
        assert!(report.grants.is_empty());
        assert_eq!(report.pending_selections.len(), 1);
        assert!(matches!(
            &report.diagnostics[..],
            [Diagnostic::StaleSelection { key, .. }] if key == excluded
        ));
    }
}

#[tokio::test]
async fn conditional_follows_current_state() {
    let h = Harness::new(vec![]).await;
    let conditional = |threshold: i32| {
        Operation::new(OperationKind::Conditional(Conditional {
            conditions: vec![Condition::new("LEVEL", ConditionOperator::AtLeast, threshold)],
            true_operations: Some(vec![Operation::adj_value("HP", 10)]),
            false_operations: Some(vec![Operation::adj_value("HP", 1)]),
        }))
    };

    let report = h
        .run(
            vec![num("LEVEL", 1), num("HP", 0)],
            vec![conditional(5), Operation::adj_value("LEVEL", 4), conditional(5)],
        )
        .await;
    assert_eq!(report.variable("HP").unwrap().value(), &VariableValue::Num(11));
}

#[tokio::test]
async fn unknown_operations_are_skipped() {
    let h = Harness::new(vec![]).await;
    let unknown: Operation = serde_json::from_value(serde_json::json!({
        "id": OperationId::new(),
        "type": "teleport",
        "data": {"to": "Absalom"}
    }))
    .unwrap();

    let report = h
        .run(
            vec![num("AC", 10)],
            vec![unknown.clone(), Operation::adj_value("AC", 1)],
        )
        .await;

    assert_eq!(report.variable("AC").unwrap().value(), &VariableValue::Num(11));
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::UnknownOperationType {
            operation_id: unknown.id,
            type_name: "teleport".into(),
        }]
    );
}

#[tokio::test]
async fn variable_errors_skip_only_the_write() {
    let h = Harness::new(vec![]).await;
    let missing = Operation::adj_value("HP", 5);
    let mismatched = Operation::set_value("AC", true);

    let report = h
        .run(
            vec![num("AC", 10)],
            vec![missing.clone(), mismatched.clone(), Operation::adj_value("AC", 2)],
        )
        .await;

    assert_eq!(report.variable("AC").unwrap().value(), &VariableValue::Num(12));
    assert!(report.variable("HP").is_none());
    assert!(matches!(
        &report.diagnostics[..],
        [
            Diagnostic::Variable { operation_id: a, variable: va, .. },
            Diagnostic::Variable { operation_id: b, variable: vb, .. },
        ] if *a == missing.id && va == "HP" && *b == mismatched.id && vb == "AC"
    ));
}

#[tokio::test]
async fn zero_policy_creates_missing_variables() {
    let settings = EngineSettings {
        vivify_policy: VivifyPolicy::Zero,
        ..Default::default()
    };
    let h = Harness::with(Arc::new(InMemoryContentRepo::new(vec![])), settings, true).await;
    let report = h.run(vec![], vec![Operation::adj_value("HP", 5)]).await;

    assert_eq!(report.variable("HP").unwrap().value(), &VariableValue::Num(5));
    assert!(report.diagnostics.is_empty());
}

#[tokio::test]
async fn missing_content_is_reported() {
    let h = Harness::new(vec![feat(1, "Toughness", 1)]).await;
    let give = give_feat(99);
    let report = h.run(vec![], vec![give.clone(), give_feat(1)]).await;

    assert!(report.granted(ContentType::AbilityBlock, ContentId::new(1)));
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::ContentNotFound {
            operation_id: give.id,
            content_type: ContentType::AbilityBlock,
            content_id: ContentId::new(99),
        }]
    );
}

#[tokio::test]
async fn granted_content_runs_in_a_follow_up_pass() {
    let h = Harness::new(vec![feat(1, "Toughness", 1).with_operations(vec![
        Operation::adj_value("HP", 3),
        bonus("SAVE_FORT", Some(1), Some("circumstance"), None),
    ])])
    .await;

    let report = h.run(vec![num("HP", 10)], vec![give_feat(1)]).await;

    assert_eq!(report.passes, 2);
    assert_eq!(report.variable("HP").unwrap().value(), &VariableValue::Num(13));
    assert_eq!(report.grants[0].source, CHARACTER_SOURCE);
    let fort = h.ledger.bonuses(h.scope, "SAVE_FORT");
    assert_eq!(fort[0].source, "Toughness");
}

#[tokio::test]
async fn dedication_feat_grants_its_archetype_trait() {
    let mut sentinel = trait_entity(60, "Sentinel");
    sentinel.meta_data.archetype_trait = true;
    let archetype = ContentEntity::new(
        ContentId::new(70),
        "Sentinel",
        ContentDetails::Archetype {
            trait_id: ContentId::new(60),
            dedication_feat_id: Some(ContentId::new(5)),
        },
    )
    .with_source(SOURCE);
    let h = Harness::new(vec![
        trait_entity(50, "Dedication"),
        sentinel,
        archetype,
        feat(5, "Sentinel Dedication", 2).with_traits(vec![ContentId::new(50)]),
    ])
    .await;

    let report = h.run(vec![], vec![give_feat(5)]).await;

    assert!(report.granted(ContentType::Trait, ContentId::new(60)));
    assert_eq!(
        report.variable("TRAIT_ARCHETYPE_SENTINEL").unwrap().value(),
        &VariableValue::Str("60".into())
    );
}

#[tokio::test]
async fn ancestry_traits_are_recorded_as_variables() {
    let mut dwarf = trait_entity(7, "Dwarf");
    dwarf.meta_data.ancestry_trait = true;
    let h = Harness::new(vec![dwarf]).await;

    let report = h
        .run(vec![], vec![Operation::give_trait(ContentId::new(7))])
        .await;
    assert_eq!(
        report.variable("TRAIT_ANCESTRY_DWARF").unwrap().value(),
        &VariableValue::Str("7".into())
    );
}

#[tokio::test]
async fn chained_grants_stop_at_the_settle_cap() {
    let chain = (1..=5)
        .map(|id| feat(id, &format!("Link {}", id), 1).with_operations(vec![give_feat(id + 1)]))
        .collect();
    let settings = EngineSettings {
        settle_max_passes: 2,
        ..Default::default()
    };
    let h = Harness::with(Arc::new(InMemoryContentRepo::new(chain)), settings, true).await;

    let report = h.run(vec![], vec![give_feat(1)]).await;

    assert_eq!(report.passes, 3);
    assert_eq!(report.grants.len(), 3);
    assert_eq!(
        report.diagnostics.last(),
        Some(&Diagnostic::SettleCapExceeded {
            passes: 3,
            outstanding: 1
        })
    );
}

#[tokio::test]
async fn grant_cycles_settle() {
    let h = Harness::new(vec![
        feat(1, "Ping", 1).with_operations(vec![give_feat(2)]),
        feat(2, "Pong", 1).with_operations(vec![give_feat(1)]),
    ])
    .await;

    let report = h.run(vec![], vec![give_feat(1)]).await;

    assert_eq!(report.passes, 3);
    assert!(report.diagnostics.is_empty());
    assert!(report.granted(ContentType::AbilityBlock, ContentId::new(2)));
}

#[tokio::test]
async fn content_without_sources_is_fatal() {
    let h = Harness::with(
        Arc::new(InMemoryContentRepo::new(vec![feat(1, "Toughness", 1)])),
        EngineSettings::default(),
        false,
    )
    .await;

    let plain = h
        .evaluator
        .evaluate(&h.request(vec![num("AC", 10)], vec![Operation::adj_value("AC", 1)]))
        .await;
    assert!(plain.is_ok());

    let err = h
        .evaluator
        .evaluate(&h.request(vec![], vec![give_feat(1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluationError::NoEnabledContentSources));
}

#[tokio::test]
async fn repository_failures_are_not_fatal() {
    let mut repo = MockContentRepo::new();
    repo.expect_find_by_id()
        .returning(|_, _, _| Err(RepoError::database("find_by_id", "connection reset")));
    let h = Harness::with(Arc::new(repo), EngineSettings::default(), true).await;

    let give = give_feat(1);
    let report = h
        .run(vec![num("AC", 10)], vec![give.clone(), Operation::adj_value("AC", 1)])
        .await;

    assert!(report.grants.is_empty());
    assert_eq!(report.variable("AC").unwrap().value(), &VariableValue::Num(11));
    assert!(matches!(
        &report.diagnostics[..],
        [Diagnostic::ContentLookupFailed { operation_id, .. }] if *operation_id == give.id
    ));
}

#[tokio::test]
async fn removal_drops_earlier_grants() {
    let h = Harness::new(vec![feat(1, "Toughness", 1), feat(2, "Fleet", 1)]).await;
    let remove = Operation::new(OperationKind::RemoveAbilityBlock(AbilityBlockRef {
        block_type: AbilityBlockType::Feat,
        ability_block_id: ContentId::new(1),
    }));

    let report = h.run(vec![], vec![give_feat(1), give_feat(2), remove]).await;

    assert!(!report.granted(ContentType::AbilityBlock, ContentId::new(1)));
    assert!(report.granted(ContentType::AbilityBlock, ContentId::new(2)));
}

#[tokio::test]
async fn casting_sources_and_spell_slots_are_collected() {
    let h = Harness::new(vec![]).await;
    let define = |value: &str| {
        Operation::new(OperationKind::DefineCastingSource(CastingSourceDefinition {
            variable: CASTING_SOURCES.to_string(),
            value: value.to_string(),
        }))
    };
    let slots = Operation::new(OperationKind::GiveSpellSlot(SpellSlotGrant {
        casting_source: "CASTING_SOURCE_WIZARD".into(),
        slots: vec![
            SpellSlot { lvl: 1, rank: 1, amt: 2 },
            SpellSlot { lvl: 3, rank: 2, amt: 1 },
        ],
    }));

    let report = h
        .run(
            vec![],
            vec![
                define("WIZARD:::PREPARED-LIST:::ARCANE:::ATTRIBUTE_INT"),
                define("WIZARD:::PREPARED-LIST:::ARCANE:::ATTRIBUTE_INT"),
                define("SORCERER:::SPONTANEOUS-REPERTOIRE:::ARCANE:::ATTRIBUTE_CHA"),
                slots.clone(),
            ],
        )
        .await;

    let sources = report.variable(CASTING_SOURCES).unwrap().value().as_list().unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(report.spell_slots.len(), 2);
    assert!(report.spell_slots.iter().all(|s| s.operation_id == slots.id));
    assert_eq!(report.spell_slots[1].slot.rank, 2);
}

#[tokio::test]
async fn each_evaluation_starts_from_the_baseline() {
    let h = Harness::new(vec![]).await;
    let ops = vec![Operation::adj_value("AC", 1), bonus("AC", Some(1), None, None)];

    h.run(vec![num("AC", 10)], ops.clone()).await;
    let report = h.run(vec![num("AC", 10)], ops).await;

    assert_eq!(report.variable("AC").unwrap().value(), &VariableValue::Num(11));
    assert_eq!(report.bonuses["AC"].total(), 1);
}

#[tokio::test]
async fn concurrent_evaluations_of_a_scope_do_not_interleave() {
    let h = Harness::new(vec![]).await;
    let request = h.request(
        vec![num("AC", 10)],
        (0..50).map(|_| Operation::adj_value("AC", 1)).collect(),
    );

    let (a, b) = tokio::join!(h.evaluator.evaluate(&request), h.evaluator.evaluate(&request));

    assert_eq!(a.unwrap().variable("AC").unwrap().value(), &VariableValue::Num(60));
    assert_eq!(b.unwrap().variable("AC").unwrap().value(), &VariableValue::Num(60));
    assert!(h.evaluator.scope_locks.is_empty());
}

#[tokio::test]
async fn scope_locks_are_released_after_evaluation() {
    let h = Harness::new(vec![]).await;
    for _ in 0..3 {
        let other = EvaluationRequest::new(CharacterId::new(), vec![num("AC", 10)], vec![Operation::adj_value("AC", 1)]);
        h.evaluator.evaluate(&other).await.unwrap();
    }
    assert!(h.evaluator.scope_locks.is_empty());

    let fatal = Harness::with(
        Arc::new(InMemoryContentRepo::new(vec![])),
        EngineSettings::default(),
        false,
    )
    .await;
    let result = fatal
        .evaluator
        .evaluate(&fatal.request(vec![], vec![give_feat(1)]))
        .await;
    assert!(matches!(result, Err(EvaluationError::NoEnabledContentSources)));
    assert!(fatal.evaluator.scope_locks.is_empty());
}

#[tokio::test]
async fn default_operations_evaluate_without_panicking() {
    let h = Harness::new(vec![]).await;
    let ops = OperationType::ALL.iter().map(|t| Operation::new_default(*t)).collect();

    let report = h.run(vec![], ops).await;

    assert_eq!(report.pending_selections.len(), 1);
    assert!(report.grants.is_empty());
}
