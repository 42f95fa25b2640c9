//! Selection resolution errors.

use charbuild_domain::OperationId;

use crate::infrastructure::content_cache::ContentError;

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("Operation {0} is not a select")]
    NotASelection(OperationId),

    #[error(transparent)]
    Content(#[from] ContentError),
}
