//! Planner trait: the abstraction over agent reasoning strategies.
//!
//! A planner looks at the task inputs and the steps taken so far and
//! decides what happens next: one or more tool actions, or a finish.
//! How it reaches that decision (prompting an LLM, following a script,
//! a rule engine) is entirely up to the implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::{AgentAction, AgentFinish, AgentStep};
use crate::error::PlannerError;
use crate::tool::Tool;

/// String-typed task inputs handed to the planner every round.
pub type PlannerInputs = HashMap<String, String>;

/// What a planner decided for one round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Actions to dispatch, in order
    pub actions: Vec<AgentAction>,

    /// Terminal result; when present the executor stops this round
    pub finish: Option<AgentFinish>,
}

impl Plan {
    /// A round that dispatches the given actions.
    pub fn act(actions: Vec<AgentAction>) -> Self {
        Self { actions, finish: None }
    }

    /// A round that ends the run.
    pub fn finish(finish: AgentFinish) -> Self {
        Self {
            actions: vec![],
            finish: Some(finish),
        }
    }

    /// Neither actions nor a finish: no forward progress.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.finish.is_none()
    }
}

/// The core Planner trait.
///
/// Implementations are shared across concurrent executor calls and must
/// not keep per-call mutable state.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Decide the next round given the ledger so far and the task inputs.
    async fn plan(
        &self,
        steps: &[AgentStep],
        inputs: &PlannerInputs,
    ) -> Result<Plan, PlannerError>;

    /// Tools this planner intends to use.
    fn tools(&self) -> Vec<Arc<dyn Tool>>;

    /// Input keys the planner expects (often just `input`).
    fn input_keys(&self) -> Vec<String>;

    /// Output keys the planner returns in its finish.
    fn output_keys(&self) -> Vec<String>;
}
