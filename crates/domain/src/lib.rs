//! Charbuild domain vocabulary.
//!
//! Pure, synchronous types shared by the engine: ids, the typed variable
//! model, bonuses, operations with their persisted format, and content
//! entities. Nothing here performs I/O.

pub mod bonus;
pub mod content;
pub mod error;
pub mod ids;
pub mod operations;
pub mod variables;

pub use bonus::{bonus_text, normalize_bonus_type, Bonus, UNTYPED_BONUS};
pub use content::{
    AbilityBlockType, ContentDetails, ContentEntity, ContentMetaData, ContentType,
    DEDICATION_TRAIT,
};
pub use error::{DomainError, VariableError};
pub use ids::{CharacterId, ContentId, ContentSourceId, OperationId, SelectOptionId};
pub use operations::{Operation, OperationKind, OperationType, SelectionChoices};
pub use variables::{
    label_to_variable, variable_label, AttributeValue, ProficiencyLevel, ProficiencyRank,
    ProficiencyValue, Variable, VariableKind, VariableType, VariableValue,
};
