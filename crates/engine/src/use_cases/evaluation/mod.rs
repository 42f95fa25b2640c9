//! Operation evaluation.
//!
//! A pass walks operations in list order against the scope's baseline
//! variables. Conditional branches and chosen select options are applied
//! inline, where they sit in the list. Operations carried by granted
//! content are queued for a follow-up pass; passes repeat until nothing new
//! is granted or the settle cap is reached.
//!
//! Per-operation failures become [`Diagnostic`]s and the pass continues.
//! Only a missing content source configuration aborts.

mod error;
mod report;

#[cfg(test)]
mod tests;

pub use error::{Diagnostic, EvaluationError};
pub use report::{
    ContentGrant, EvaluationReport, EvaluationRequest, PendingSelection, SpellSlotRecord,
    CHARACTER_SOURCE,
};

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use charbuild_domain::operations::{all_hold, CastingSourceDefinition, Select, SelectModeType, SelectionChoices};
use charbuild_domain::{
    label_to_variable, Bonus, CharacterId, ContentDetails, ContentEntity, ContentId, ContentType,
    Operation, OperationId, OperationKind, Variable, VariableError, VariableKind, VariableType,
    VariableValue, DEDICATION_TRAIT,
};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::infrastructure::content_cache::{ContentCache, ContentError};
use crate::infrastructure::ports::ClockPort;
use crate::infrastructure::settings::EngineSettings;
use crate::stores::{BonusLedger, VariableStore};
use crate::use_cases::selection::{SelectionError, SelectionResolver};

/// An operation waiting to be applied, with the name of what carried it.
struct Work {
    operation: Operation,
    source: String,
}

impl Work {
    fn new(operation: Operation, source: impl Into<String>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

/// State of one evaluation across its passes.
#[derive(Default)]
struct Run {
    queue: VecDeque<Work>,
    /// Operations of content granted during the current pass.
    discovered: Vec<Work>,
    /// Content whose operations were already queued once.
    expanded: HashSet<(ContentType, ContentId)>,
    grants: Vec<ContentGrant>,
    spell_slots: Vec<SpellSlotRecord>,
    pending: Vec<PendingSelection>,
    diagnostics: Vec<Diagnostic>,
}

impl Run {
    /// Queue operations to run next, ahead of the rest of the pass.
    fn inline(&mut self, operations: &[Operation], source: &str) {
        for op in operations.iter().rev() {
            self.queue.push_front(Work::new(op.clone(), source));
        }
    }

    fn check(&mut self, operation_id: OperationId, result: Result<Variable, VariableError>) {
        if let Err(e) = result {
            tracing::debug!(operation_id = %operation_id, error = %e, "Skipping variable write");
            self.diagnostics.push(Diagnostic::variable(operation_id, &e));
        }
    }

    /// Fatal on a missing source configuration; a repository failure is
    /// recorded and yields `None`.
    fn lookup<T>(
        &mut self,
        result: Result<T, ContentError>,
        operation_id: OperationId,
    ) -> Result<Option<T>, EvaluationError> {
        match result {
            Ok(found) => Ok(Some(found)),
            Err(ContentError::NoEnabledContentSources) => Err(EvaluationError::NoEnabledContentSources),
            Err(ContentError::Repo(e)) => {
                tracing::warn!(operation_id = %operation_id, error = %e, "Content lookup failed");
                self.diagnostics.push(Diagnostic::ContentLookupFailed {
                    operation_id,
                    message: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    fn revoke(&mut self, content_type: ContentType, id: ContentId) {
        self.grants
            .retain(|g| !(g.content_type == content_type && g.content_id == id));
    }
}

pub struct Evaluator {
    store: Arc<VariableStore>,
    ledger: Arc<BonusLedger>,
    content: Arc<ContentCache>,
    selection: SelectionResolver,
    clock: Arc<dyn ClockPort>,
    settle_max_passes: u32,
    scope_locks: DashMap<CharacterId, Arc<Mutex<()>>>,
}

impl Evaluator {
    pub fn new(
        store: Arc<VariableStore>,
        ledger: Arc<BonusLedger>,
        content: Arc<ContentCache>,
        clock: Arc<dyn ClockPort>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            selection: SelectionResolver::new(store.clone(), content.clone()),
            store,
            ledger,
            content,
            clock,
            settle_max_passes: settings.settle_max_passes,
            scope_locks: DashMap::new(),
        }
    }

    pub fn selection(&self) -> &SelectionResolver {
        &self.selection
    }

    /// Evaluate a character from its baseline.
    ///
    /// Evaluations of the same scope run one at a time. Store and ledger
    /// reads for the scope are only meaningful once this returns.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationReport, EvaluationError> {
        let scope = request.scope;
        let lock = self.scope_locks.entry(scope).or_default().value().clone();
        let guard = lock.lock().await;
        let result = self.evaluate_locked(request).await;
        drop(guard);

        // Only the map and `lock` hold it: nobody is waiting on this scope.
        self.scope_locks
            .remove_if(&scope, |_, held| Arc::strong_count(held) == 2);
        result
    }

    async fn evaluate_locked(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationReport, EvaluationError> {
        let scope = request.scope;
        self.store.seed(scope, request.baseline.iter().cloned());
        self.ledger.clear_scope(scope);

        let mut run = Run::default();
        run.inline(&request.operations, CHARACTER_SOURCE);

        let mut passes = 0;
        loop {
            passes += 1;
            while let Some(work) = run.queue.pop_front() {
                self.apply(scope, &request.choices, work, &mut run).await?;
            }
            if run.discovered.is_empty() {
                break;
            }
            if passes > self.settle_max_passes {
                let outstanding = run.discovered.len();
                tracing::warn!(scope = %scope, passes, outstanding, "Granted content did not settle");
                run.diagnostics
                    .push(Diagnostic::SettleCapExceeded { passes, outstanding });
                break;
            }
            tracing::debug!(
                scope = %scope,
                pass = passes + 1,
                operations = run.discovered.len(),
                "Running follow-up pass over granted content"
            );
            run.queue = std::mem::take(&mut run.discovered).into();
        }

        let bonuses = self
            .ledger
            .variables(scope)
            .into_iter()
            .map(|name| {
                let breakdown = self.ledger.breakdown(scope, &name);
                (name, breakdown)
            })
            .collect();

        let report = EvaluationReport {
            scope,
            passes,
            variables: self.store.all(scope),
            bonuses,
            grants: run.grants,
            spell_slots: run.spell_slots,
            pending_selections: run.pending,
            diagnostics: run.diagnostics,
        };
        tracing::info!(
            scope = %scope,
            passes,
            grants = report.grants.len(),
            pending = report.pending_selections.len(),
            diagnostics = report.diagnostics.len(),
            "Evaluation finished"
        );
        Ok(report)
    }

    async fn apply(
        &self,
        scope: CharacterId,
        choices: &SelectionChoices,
        work: Work,
        run: &mut Run,
    ) -> Result<(), EvaluationError> {
        let op = &work.operation;
        match &op.kind {
            OperationKind::AdjValue(w) => {
                let result = self.store.adjust(scope, &w.variable, &w.value);
                run.check(op.id, result);
            }
            OperationKind::SetValue(w) => {
                let result = self.store.set(scope, &w.variable, &w.value);
                run.check(op.id, result);
            }
            OperationKind::CreateValue(c) => {
                let result = self
                    .store
                    .create(scope, &c.variable, c.value_type, c.value.clone());
                run.check(op.id, result);
            }
            OperationKind::AddBonusToValue(b) => {
                self.ledger.record(
                    scope,
                    &b.variable,
                    Bonus {
                        value: b.value,
                        bonus_type: b.bonus_type.clone(),
                        text: b.text.clone(),
                        source: work.source.clone(),
                        timestamp: self.clock.now(),
                    },
                );
            }
            OperationKind::GiveAbilityBlock(r) => {
                self.grant(scope, &work, ContentType::AbilityBlock, r.ability_block_id, run)
                    .await?;
            }
            OperationKind::GiveSpell(g) => {
                self.grant(scope, &work, ContentType::Spell, g.spell_id, run).await?;
            }
            OperationKind::GiveLanguage(r) => {
                self.grant(scope, &work, ContentType::Language, r.language_id, run)
                    .await?;
            }
            OperationKind::GiveItem(r) => {
                self.grant(scope, &work, ContentType::Item, r.item_id, run).await?;
            }
            OperationKind::GiveTrait(t) => {
                self.grant(scope, &work, ContentType::Trait, t.trait_id, run).await?;
            }
            OperationKind::RemoveAbilityBlock(r) => run.revoke(ContentType::AbilityBlock, r.ability_block_id),
            OperationKind::RemoveSpell(r) => run.revoke(ContentType::Spell, r.spell_id),
            OperationKind::RemoveLanguage(r) => run.revoke(ContentType::Language, r.language_id),
            OperationKind::GiveSpellSlot(g) => {
                run.spell_slots.extend(g.slots.iter().map(|slot| SpellSlotRecord {
                    casting_source: g.casting_source.clone(),
                    slot: slot.clone(),
                    operation_id: op.id,
                }));
            }
            OperationKind::DefineCastingSource(def) => {
                let result = self.define_casting_source(scope, def);
                run.check(op.id, result);
            }
            OperationKind::Conditional(c) => {
                let taken = all_hold(&c.conditions, |name| self.store.get(scope, name));
                run.inline(c.branch(taken), &work.source);
            }
            OperationKind::Select(select) => {
                match self.chosen(scope, choices, op, select, run).await? {
                    Some(operations) => run.inline(&operations, &work.source),
                    None => run.pending.push(PendingSelection {
                        operation_id: op.id,
                        title: select.title.clone(),
                        mode_type: select.mode_type,
                        option_type: select.option_type,
                        source: work.source.clone(),
                    }),
                }
            }
            OperationKind::Unknown { type_name, .. } => {
                tracing::warn!(
                    scope = %scope,
                    operation_id = %op.id,
                    type_name = %type_name,
                    "Skipping operation of unknown type"
                );
                run.diagnostics.push(Diagnostic::UnknownOperationType {
                    operation_id: op.id,
                    type_name: type_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Append the source record to its list variable unless already there.
    fn define_casting_source(
        &self,
        scope: CharacterId,
        def: &CastingSourceDefinition,
    ) -> Result<Variable, VariableError> {
        let current = self.store.create(
            scope,
            &def.variable,
            VariableType::ListStr,
            VariableValue::ListStr(Vec::new()),
        )?;
        let mut sources = current.value().as_list().map(<[String]>::to_vec).unwrap_or_default();
        if sources.contains(&def.value) {
            return Ok(current);
        }
        sources.push(def.value.clone());
        self.store.set(scope, &def.variable, &sources.into())
    }

    /// Operations a recorded choice stands for. `None` leaves the select
    /// pending.
    async fn chosen(
        &self,
        scope: CharacterId,
        choices: &SelectionChoices,
        op: &Operation,
        select: &Select,
        run: &mut Run,
    ) -> Result<Option<Vec<Operation>>, EvaluationError> {
        let Some(key) = choices.get(&op.id) else {
            return Ok(None);
        };

        let chosen = match select.mode_type {
            SelectModeType::Predefined => select
                .predefined()
                .iter()
                .find(|option| option.selection_key() == *key)
                .map(|option| option.operations().to_vec()),
            SelectModeType::Filtered => match self.selection.candidates(scope, op).await {
                Ok(candidates) => candidates
                    .iter()
                    .find(|c| c.select_uuid == *key)
                    .and_then(|c| c.to_operation(op.id))
                    .map(|inlined| vec![inlined]),
                Err(SelectionError::Content(ContentError::NoEnabledContentSources)) => {
                    return Err(EvaluationError::NoEnabledContentSources);
                }
                Err(e) => {
                    tracing::warn!(operation_id = %op.id, error = %e, "Could not list selection candidates");
                    run.diagnostics.push(Diagnostic::ContentLookupFailed {
                        operation_id: op.id,
                        message: e.to_string(),
                    });
                    return Ok(None);
                }
            },
        };

        if chosen.is_none() {
            tracing::debug!(operation_id = %op.id, key = %key, "Recorded choice matches no option");
            run.diagnostics.push(Diagnostic::StaleSelection {
                operation_id: op.id,
                key: key.clone(),
            });
        }
        Ok(chosen)
    }

    /// Resolve and record a granted reference, then queue what it carries.
    async fn grant(
        &self,
        scope: CharacterId,
        work: &Work,
        content_type: ContentType,
        id: ContentId,
        run: &mut Run,
    ) -> Result<(), EvaluationError> {
        let operation_id = work.operation.id;
        let entity = match run.lookup(self.content.get(content_type, id).await, operation_id)? {
            Some(Some(entity)) => entity,
            Some(None) => {
                tracing::debug!(
                    operation_id = %operation_id,
                    content_type = %content_type,
                    content_id = %id,
                    "Granted content not found"
                );
                run.diagnostics.push(Diagnostic::ContentNotFound {
                    operation_id,
                    content_type,
                    content_id: id,
                });
                return Ok(());
            }
            None => return Ok(()),
        };

        run.grants.push(ContentGrant {
            content_type,
            content_id: entity.id,
            name: entity.name.clone(),
            operation_id,
            source: work.source.clone(),
        });

        match content_type {
            ContentType::Trait => self.record_trait(scope, operation_id, &entity, run),
            ContentType::AbilityBlock | ContentType::Item => {
                if run.expanded.insert((content_type, entity.id)) {
                    run.discovered.extend(
                        entity
                            .operations()
                            .iter()
                            .map(|op| Work::new(op.clone(), entity.name.clone())),
                    );
                }
                if content_type == ContentType::AbilityBlock {
                    if let Some(give) = self.dedication_trait(&entity, operation_id, run).await? {
                        run.inline(&[give], &entity.name);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// A granted trait flagged as ancestry, class or archetype is remembered
    /// in its `TRAIT_*` variable, valued with the trait id.
    fn record_trait(
        &self,
        scope: CharacterId,
        operation_id: OperationId,
        entity: &ContentEntity,
        run: &mut Run,
    ) {
        let meta = &entity.meta_data;
        let kind = if meta.ancestry_trait {
            VariableKind::AncestryTrait
        } else if meta.class_trait {
            VariableKind::ClassTrait
        } else if meta.archetype_trait {
            VariableKind::ArchetypeTrait
        } else {
            return;
        };

        let name = format!("{}{}", kind.prefix(), label_to_variable(&entity.name));
        let id = VariableValue::Str(entity.id.to_string());
        let result = self
            .store
            .create(scope, &name, VariableType::Str, id.clone())
            .and_then(|_| self.store.set(scope, &name, &id));
        run.check(operation_id, result);
    }

    /// `giveTrait` for the archetype a dedication feat belongs to.
    async fn dedication_trait(
        &self,
        block: &ContentEntity,
        operation_id: OperationId,
        run: &mut Run,
    ) -> Result<Option<Operation>, EvaluationError> {
        if block.trait_ids().is_empty() {
            return Ok(None);
        }
        let traits = self.content.traits(block.trait_ids()).await;
        let traits = run.lookup(traits, operation_id)?.unwrap_or_default();
        if !traits.iter().any(|t| t.name.eq_ignore_ascii_case(DEDICATION_TRAIT)) {
            return Ok(None);
        }

        let archetype = self.content.archetype_by_dedication_feat(block.id).await;
        let archetype = run.lookup(archetype, operation_id)?.flatten();
        match archetype.map(|a| a.details) {
            Some(ContentDetails::Archetype { trait_id, .. }) => Ok(Some(Operation::give_trait(trait_id))),
            _ => {
                tracing::debug!(feat_id = %block.id, "Dedication feat has no archetype");
                Ok(None)
            }
        }
    }
}
