//! Charbuild Engine library.
//!
//! Evaluates a character's operation list into typed variables, stacked
//! bonuses and granted content, and answers the questions a character sheet
//! asks about the result.
//!
//! ## Structure
//!
//! - `stores/` - Per-scope variable store and bonus ledger
//! - `use_cases/` - Evaluation, selection candidates and stat display
//! - `infrastructure/` - Content repository port and adapters, content
//!   cache, clock, settings

pub mod infrastructure;
pub mod stores;
pub mod use_cases;
