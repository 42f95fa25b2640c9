use serde::{Deserialize, Serialize};

use super::value::{VariableType, VariableValue};
use crate::error::VariableError;

/// A named, typed piece of character state.
///
/// The type is fixed when the variable is created; every later write must
/// carry a value of the same shape.
///
/// Deserialization goes through [`Variable::new`], so persisted variables
/// are type-checked like created ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVariable")]
pub struct Variable {
    name: String,
    #[serde(rename = "type")]
    variable_type: VariableType,
    value: VariableValue,
}

#[derive(Deserialize)]
struct RawVariable {
    name: String,
    #[serde(rename = "type")]
    variable_type: VariableType,
    value: VariableValue,
}

impl TryFrom<RawVariable> for Variable {
    type Error = VariableError;

    fn try_from(raw: RawVariable) -> Result<Self, Self::Error> {
        Variable::new(raw.name, raw.variable_type, raw.value)
    }
}

impl Variable {
    /// Create a variable; the initial value must match the declared type.
    pub fn new(
        name: impl Into<String>,
        variable_type: VariableType,
        value: VariableValue,
    ) -> Result<Self, VariableError> {
        let name = name.into();
        let value = value.normalized();
        if value.variable_type() != variable_type {
            return Err(VariableError::type_mismatch(
                name,
                variable_type,
                value.variable_type(),
            ));
        }
        Ok(Self {
            name,
            variable_type,
            value,
        })
    }

    /// Create a variable holding the zero value of its type.
    pub fn zeroed(name: impl Into<String>, variable_type: VariableType) -> Self {
        Self {
            name: name.into(),
            variable_type,
            value: VariableValue::zero(variable_type),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variable_type(&self) -> VariableType {
        self.variable_type
    }

    pub fn value(&self) -> &VariableValue {
        &self.value
    }

    /// Apply a committed `adjust`.
    pub fn adjust(&mut self, delta: &VariableValue) -> Result<(), VariableError> {
        let next = self
            .value
            .accumulate(delta)
            .ok_or_else(|| self.mismatch(delta))?;
        self.value = next;
        Ok(())
    }

    /// Apply a committed `set`.
    pub fn set(&mut self, value: &VariableValue) -> Result<(), VariableError> {
        let next = self
            .value
            .overwrite(value)
            .ok_or_else(|| self.mismatch(value))?;
        self.value = next;
        Ok(())
    }

    fn mismatch(&self, got: &VariableValue) -> VariableError {
        VariableError::type_mismatch(self.name.clone(), self.variable_type, got.variable_type())
    }
}
