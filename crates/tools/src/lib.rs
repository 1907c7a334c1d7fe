//! Built-in tool implementations for LedgerLoop.
//!
//! These are small, dependency-free tools used by the CLI and the
//! end-to-end tests. Real deployments register their own tools.

pub mod calculator;
pub mod step_history;

use ledgerloop_core::tool::Tool;
use std::sync::Arc;

pub use calculator::{CalcError, CalculatorTool, evaluate};
pub use step_history::StepHistoryTool;

/// All built-in tools, ready to hand to a planner.
pub fn builtin_tools() -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(CalculatorTool), Arc::new(StepHistoryTool)]
}
