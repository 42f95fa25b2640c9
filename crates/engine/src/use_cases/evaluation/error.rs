//! Evaluation errors and diagnostics.
//!
//! `EvaluationError` aborts a pass. Everything else a pass runs into is a
//! [`Diagnostic`]: the offending operation is skipped and the pass goes on.

use charbuild_domain::{ContentId, ContentType, OperationId, VariableError};
use serde::Serialize;

#[derive(Debug, Clone, thiserror::Error)]
pub enum EvaluationError {
    #[error("No content sources are enabled")]
    NoEnabledContentSources,
}

/// A non-fatal problem met while applying one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A variable store write or declaration failed.
    Variable {
        operation_id: OperationId,
        variable: String,
        message: String,
    },
    UnknownOperationType {
        operation_id: OperationId,
        type_name: String,
    },
    ContentNotFound {
        operation_id: OperationId,
        content_type: ContentType,
        content_id: ContentId,
    },
    ContentLookupFailed {
        operation_id: OperationId,
        message: String,
    },
    /// A recorded choice names no current option.
    StaleSelection {
        operation_id: OperationId,
        key: String,
    },
    SettleCapExceeded {
        passes: u32,
        outstanding: usize,
    },
}

impl Diagnostic {
    pub(super) fn variable(operation_id: OperationId, error: &VariableError) -> Self {
        Diagnostic::Variable {
            operation_id,
            variable: error.variable_name().to_string(),
            message: error.to_string(),
        }
    }
}
