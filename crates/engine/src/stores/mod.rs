//! In-memory state storage modules.
//!
//! - `VariableStore` - typed character variables per scope
//! - `BonusLedger` - per-variable bonus log and stacking

pub mod bonus_ledger;
pub mod variable_store;

pub use bonus_ledger::{BonusBreakdown, BonusBucket, BonusContribution, BonusLedger, ConditionalNote};
pub use variable_store::VariableStore;
