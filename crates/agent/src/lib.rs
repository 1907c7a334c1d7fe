//! The agent execution loop for LedgerLoop.
//!
//! The executor follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Plan**: ask the planner for the next actions, given the steps so far
//! 2. **Act**: dispatch each action to its tool through the registry
//! 3. **Observe**: record every result in the ledger and loop back
//!
//! The loop continues until the planner returns a finish, repeats an
//! action, or exhausts the iteration budget.

pub mod error_policy;
pub mod executor;
pub mod observers;
pub mod scripted;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error_policy::{Formatter, ParserErrorHandler};
pub use executor::{
    DEFAULT_MAX_ITERATIONS, ExecutionReport, Executor, FINAL_ANSWER_HINT, LAST_CHANCE_HINT,
    NOT_FINISHED_MARKER, Outcome, REPEATED_ACTION_OBSERVATION, inputs_to_strings,
};
pub use observers::{EventBusObserver, LogObserver, ObserverSet};
pub use scripted::{Script, ScriptError, ScriptRound, ScriptedPlanner};
