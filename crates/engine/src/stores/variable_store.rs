//! Process-wide variable registry, keyed by character scope.

use std::collections::HashMap;

use charbuild_domain::{CharacterId, Variable, VariableError, VariableKind, VariableType, VariableValue};
use dashmap::DashMap;

use crate::infrastructure::settings::VivifyPolicy;

/// Typed variables per scope.
///
/// Writes are type-checked against the type fixed at creation. Whether a
/// write to a missing variable fails or creates it is the [`VivifyPolicy`].
pub struct VariableStore {
    scopes: DashMap<CharacterId, HashMap<String, Variable>>,
    vivify: VivifyPolicy,
}

impl VariableStore {
    pub fn new(vivify: VivifyPolicy) -> Self {
        Self {
            scopes: DashMap::new(),
            vivify,
        }
    }

    pub fn vivify_policy(&self) -> VivifyPolicy {
        self.vivify
    }

    pub fn get(&self, scope: CharacterId, name: &str) -> Option<Variable> {
        self.scopes.get(&scope).and_then(|vars| vars.get(name).cloned())
    }

    /// Declare a variable. Re-declaring with the same type returns the
    /// existing variable untouched.
    pub fn create(
        &self,
        scope: CharacterId,
        name: &str,
        variable_type: VariableType,
        initial: VariableValue,
    ) -> Result<Variable, VariableError> {
        let mut vars = self.scopes.entry(scope).or_default();
        if let Some(existing) = vars.get(name) {
            if existing.variable_type() == variable_type {
                return Ok(existing.clone());
            }
            return Err(VariableError::DuplicateVariable {
                name: name.to_string(),
                existing: existing.variable_type(),
                requested: variable_type,
            });
        }
        let variable = Variable::new(name, variable_type, initial)?;
        vars.insert(name.to_string(), variable.clone());
        Ok(variable)
    }

    /// Type-specific accumulation.
    pub fn adjust(
        &self,
        scope: CharacterId,
        name: &str,
        delta: &VariableValue,
    ) -> Result<Variable, VariableError> {
        self.write(scope, name, delta, |var, value| var.adjust(value))
    }

    /// Type-specific overwrite.
    pub fn set(
        &self,
        scope: CharacterId,
        name: &str,
        value: &VariableValue,
    ) -> Result<Variable, VariableError> {
        self.write(scope, name, value, |var, value| var.set(value))
    }

    fn write<F>(
        &self,
        scope: CharacterId,
        name: &str,
        value: &VariableValue,
        apply: F,
    ) -> Result<Variable, VariableError>
    where
        F: FnOnce(&mut Variable, &VariableValue) -> Result<(), VariableError>,
    {
        let mut vars = self.scopes.entry(scope).or_default();
        if !vars.contains_key(name) {
            match self.vivify {
                VivifyPolicy::Reject => return Err(VariableError::unknown(name)),
                VivifyPolicy::Zero => {
                    tracing::debug!(scope = %scope, variable = name, "Auto-vivifying variable");
                    vars.insert(
                        name.to_string(),
                        Variable::zeroed(name, value.variable_type()),
                    );
                }
            }
        }
        let variable = vars
            .get_mut(name)
            .ok_or_else(|| VariableError::unknown(name))?;
        apply(variable, value)?;
        Ok(variable.clone())
    }

    /// Every variable of a kind, sorted by name.
    pub fn all_of_kind(&self, scope: CharacterId, kind: VariableKind) -> Vec<Variable> {
        self.filtered(scope, |v| kind.matches(v.name()))
    }

    /// Every variable in the scope, sorted by name.
    pub fn all(&self, scope: CharacterId) -> Vec<Variable> {
        self.filtered(scope, |_| true)
    }

    fn filtered(&self, scope: CharacterId, keep: impl Fn(&Variable) -> bool) -> Vec<Variable> {
        let mut out: Vec<Variable> = self
            .scopes
            .get(&scope)
            .map(|vars| vars.values().filter(|v| keep(v)).cloned().collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }

    pub fn reset_scope(&self, scope: CharacterId) {
        self.scopes.remove(&scope);
    }

    /// Replace the scope's contents with `variables`.
    pub fn seed(&self, scope: CharacterId, variables: impl IntoIterator<Item = Variable>) {
        let vars = variables
            .into_iter()
            .map(|v| (v.name().to_string(), v))
            .collect();
        self.scopes.insert(scope, vars);
    }
}
