//! Token counting and context-window budgeting
//!
//! Every budgeting decision downstream (window accumulation, chunk sizing)
//! goes through a single [`TokenCounter`] so that the same text always
//! costs the same number of tokens.

mod budget;
mod counter;

pub use budget::{BudgetError, ModelBudget, TokenBudgetPlanner};
pub use counter::{Encoding, TokenCounter};
