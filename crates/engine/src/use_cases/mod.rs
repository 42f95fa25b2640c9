//! Use cases - character evaluation and the sheet questions built on it.
//!
//! - `evaluation` applies an operation list to the stores
//! - `selection` lists the candidates of a `select` operation
//! - `display` reads best values and proficiency breakdowns back out

pub mod display;
pub mod evaluation;
pub mod selection;

pub use display::{BestValue, ProficiencyParts, StatDisplay};
pub use evaluation::{Diagnostic, EvaluationError, EvaluationReport, EvaluationRequest, Evaluator};
pub use selection::{SelectionCandidate, SelectionError, SelectionResolver};
