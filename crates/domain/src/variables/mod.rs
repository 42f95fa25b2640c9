//! Typed character variables.

mod kinds;
mod proficiency;
mod value;
mod variable;

pub use kinds::{label_to_variable, variable_label, VariableKind};
pub use proficiency::{ProficiencyLevel, ProficiencyRank, ProficiencyValue};
pub use value::{AttributeValue, VariableType, VariableValue};
pub use variable::Variable;
