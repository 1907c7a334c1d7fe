//! The agent execution loop.
//!
//! Each call runs a bounded Plan → Act → Observe cycle:
//!
//! 1. **Plan**: hand the ledger and inputs to the planner
//! 2. **Act**: dispatch every returned action to its tool
//! 3. **Observe**: append one step per action to the ledger
//!
//! The loop ends when the planner finishes, when it repeats an action it
//! already took, or when the iteration budget runs out.

use ledgerloop_config::ExecutorConfig;
use ledgerloop_core::agent::{
    ActionTarget, AgentAction, AgentFinish, AgentStep, ChainValues, INTERMEDIATE_STEPS_KEY,
};
use ledgerloop_core::error::{Error, Result, ToolError};
use ledgerloop_core::memory::ConversationMemory;
use ledgerloop_core::observer::Observer;
use ledgerloop_core::planner::{Planner, PlannerInputs};
use ledgerloop_core::tool::{ToolContext, ToolRegistry};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error_policy::ParserErrorHandler;

/// Default bound on planner invocations per call.
pub const DEFAULT_MAX_ITERATIONS: u32 = 15;

/// Observation appended when the planner repeats an earlier action.
pub const REPEATED_ACTION_OBSERVATION: &str = "ATTENTION: you are repeating the same action. \
     You have two options now: 1. Write the final answer. 2. Choose a different action.";

/// Observation appended when the planner asks for no tool.
pub const FINAL_ANSWER_HINT: &str = "ATTENTION: no tool was requested, write the final answer now. \
    Use the format -> Final Answer: ";

/// Observation appended two iterations before the budget runs out.
pub const LAST_CHANCE_HINT: &str =
    "\n Important: Do you have enough data to answer? Provide the final answer \n";

/// `output` value of the finish reported to the observer on exhaustion.
pub const NOT_FINISHED_MARKER: &str = "agent not finished before max iterations";

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The planner produced a finish.
    Finished(AgentFinish),
    /// The planner repeated an earlier action; the run stopped softly.
    RepeatedAction(AgentAction),
    /// The iteration budget ran out without a finish.
    Exhausted,
}

/// Everything a run produced, for callers that need more than the outputs.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Identifier used on this run's log lines
    pub run_id: Uuid,
    /// Why the run ended
    pub outcome: Outcome,
    /// The full ledger
    pub steps: Vec<AgentStep>,
    /// Number of planner invocations
    pub iterations: u32,
}

/// What one iteration decided.
enum Round {
    Continue,
    Stop(Outcome),
}

/// Drives a [`Planner`] against its tools until it finishes.
///
/// The executor holds no per-call state: every call builds its own ledger
/// and tool registry, so one executor can serve concurrent calls.
pub struct Executor {
    /// The planner deciding each round
    planner: Arc<dyn Planner>,

    /// Maximum planner invocations per call
    max_iterations: u32,

    /// Whether successful outputs carry the ledger
    return_intermediate_steps: bool,

    /// Recovery policy for unparsable planner output
    error_handler: Option<ParserErrorHandler>,

    /// Optional side channel notified on actions and finishes
    observer: Option<Arc<dyn Observer>>,

    /// Optional conversation memory, used by [`Executor::call_with_memory`]
    memory: Option<Arc<dyn ConversationMemory>>,
}

impl Executor {
    /// Create an executor for the given planner.
    pub fn new(planner: Arc<dyn Planner>) -> Self {
        Self {
            planner,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            return_intermediate_steps: false,
            error_handler: None,
            observer: None,
            memory: None,
        }
    }

    /// Set the maximum number of planner invocations per call.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Include the ledger in successful outputs.
    pub fn with_intermediate_steps(mut self, enabled: bool) -> Self {
        self.return_intermediate_steps = enabled;
        self
    }

    /// Recover from unparsable planner output instead of failing.
    pub fn with_error_handler(mut self, handler: ParserErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Attach an observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Attach a conversation memory.
    pub fn with_memory(mut self, memory: Arc<dyn ConversationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Apply the `[executor]` config section.
    pub fn with_config(mut self, config: &ExecutorConfig) -> Self {
        self.max_iterations = config.max_iterations;
        self.return_intermediate_steps = config.return_intermediate_steps;
        if config.handle_parsing_errors {
            self.error_handler = Some(match &config.parsing_error_message {
                Some(message) => ParserErrorHandler::with_message(message.clone()),
                None => ParserErrorHandler::new(),
            });
        }
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Input keys the planner expects. Often just `input`.
    pub fn input_keys(&self) -> Vec<String> {
        self.planner.input_keys()
    }

    /// Output keys the planner returns.
    pub fn output_keys(&self) -> Vec<String> {
        self.planner.output_keys()
    }

    pub fn memory(&self) -> Option<&Arc<dyn ConversationMemory>> {
        self.memory.as_ref()
    }

    pub fn observer(&self) -> Option<&Arc<dyn Observer>> {
        self.observer.as_ref()
    }

    /// Run the agent and return its outputs.
    ///
    /// - finish: the planner's return values, plus the ledger under
    ///   `intermediate_steps` when enabled
    /// - repeated action: an empty map and no error
    /// - budget exhausted: [`Error::NotFinished`]
    pub async fn call(
        &self,
        cancel: &CancellationToken,
        inputs: &ChainValues,
    ) -> Result<ChainValues> {
        let ExecutionReport {
            outcome,
            steps,
            iterations,
            ..
        } = self.execute(cancel, inputs).await?;

        match outcome {
            Outcome::Finished(finish) => self.assemble_outputs(finish, &steps),
            Outcome::RepeatedAction(_) => Ok(ChainValues::new()),
            Outcome::Exhausted => Err(Error::NotFinished { iterations }),
        }
    }

    /// Like [`Executor::call`], but threads the configured memory around it.
    ///
    /// Memory variables are added to the inputs (caller-supplied keys win)
    /// and non-empty outputs are saved back after a successful call.
    pub async fn call_with_memory(
        &self,
        cancel: &CancellationToken,
        inputs: &ChainValues,
    ) -> Result<ChainValues> {
        let Some(memory) = &self.memory else {
            return self.call(cancel, inputs).await;
        };

        let caller_inputs = inputs_to_strings(inputs)?;
        let mut full_inputs = inputs.clone();
        for (key, value) in memory.load_variables(&caller_inputs).await? {
            full_inputs.entry(key).or_insert(value);
        }

        let outputs = self.call(cancel, &full_inputs).await?;
        if !outputs.is_empty() {
            memory.save_context(&caller_inputs, &outputs).await?;
        }
        Ok(outputs)
    }

    /// Run the loop and report how it ended, with the full ledger.
    ///
    /// Fatal conditions (invalid input, planner or tool failure, a planner
    /// that returns nothing, cancellation) are returned as errors.
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        inputs: &ChainValues,
    ) -> Result<ExecutionReport> {
        let inputs = inputs_to_strings(inputs)?;
        let registry = ToolRegistry::from_tools(self.planner.tools())?;
        let run_id = Uuid::new_v4();
        let mut steps: Vec<AgentStep> = Vec::new();

        info!(
            run_id = %run_id,
            max_iterations = self.max_iterations,
            tools = registry.len(),
            "Agent run starting"
        );
        debug!(run_id = %run_id, tools = %registry.descriptions(), "Registered tools");

        for iteration in 0..self.max_iterations {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            debug!(run_id = %run_id, iteration, steps = steps.len(), "Agent iteration");

            let round = self
                .do_iteration(run_id, cancel, &registry, &inputs, &mut steps)
                .await?;
            if let Round::Stop(outcome) = round {
                info!(
                    run_id = %run_id,
                    iterations = iteration + 1,
                    steps = steps.len(),
                    "Agent run ended"
                );
                return Ok(ExecutionReport {
                    run_id,
                    outcome,
                    steps,
                    iterations: iteration + 1,
                });
            }

            if self.max_iterations > 2 && iteration == self.max_iterations - 2 {
                steps.push(AgentStep::synthetic(LAST_CHANCE_HINT));
            }
        }

        warn!(
            run_id = %run_id,
            max_iterations = self.max_iterations,
            "Agent did not finish within the iteration budget"
        );
        if let Some(observer) = &self.observer {
            observer.on_finish(&AgentFinish::output(NOT_FINISHED_MARKER), &steps);
        }

        Ok(ExecutionReport {
            run_id,
            outcome: Outcome::Exhausted,
            steps,
            iterations: self.max_iterations,
        })
    }

    async fn do_iteration(
        &self,
        run_id: Uuid,
        cancel: &CancellationToken,
        registry: &ToolRegistry,
        inputs: &PlannerInputs,
        steps: &mut Vec<AgentStep>,
    ) -> Result<Round> {
        let planned = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            planned = self.planner.plan(steps.as_slice(), inputs) => planned,
        };

        let plan = match planned {
            Ok(plan) => plan,
            Err(e) if e.is_unparsable() => match &self.error_handler {
                Some(handler) => {
                    warn!(
                        run_id = %run_id,
                        error = %e,
                        "Planner output unparsable, feeding error back"
                    );
                    steps.push(AgentStep::synthetic(handler.format(&e.to_string())));
                    return Ok(Round::Continue);
                }
                None => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        };

        if plan.is_empty() {
            return Err(Error::AgentNoReturn);
        }

        if let Some(finish) = plan.finish {
            if let Some(observer) = &self.observer {
                observer.on_finish(&finish, steps.as_slice());
            }
            return Ok(Round::Stop(Outcome::Finished(finish)));
        }

        for action in plan.actions {
            if steps.iter().any(|s| s.action.repeats(&action)) {
                warn!(
                    run_id = %run_id,
                    tool = %action.tool,
                    input = %action.tool_input,
                    "Repeated action, stopping run"
                );
                steps.push(AgentStep::new(action.clone(), REPEATED_ACTION_OBSERVATION));
                return Ok(Round::Stop(Outcome::RepeatedAction(action)));
            }

            self.do_action(run_id, cancel, registry, steps, action).await?;
        }

        Ok(Round::Continue)
    }

    async fn do_action(
        &self,
        run_id: Uuid,
        cancel: &CancellationToken,
        registry: &ToolRegistry,
        steps: &mut Vec<AgentStep>,
        action: AgentAction,
    ) -> Result<()> {
        if let Some(observer) = &self.observer {
            observer.on_action(&action);
        }

        let resolved = match action.target() {
            ActionTarget::FinalAnswerHint => {
                debug!(run_id = %run_id, "Planner requested no tool");
                steps.push(AgentStep::new(action, FINAL_ANSWER_HINT));
                return Ok(());
            }
            ActionTarget::Tool(name) => registry.resolve(name),
        };

        let Some(tool) = resolved else {
            warn!(run_id = %run_id, tool = %action.tool, "Planner requested an unknown tool");
            let observation = format!("{} is not a valid tool, try another one", action.tool);
            steps.push(AgentStep::new(action, observation));
            return Ok(());
        };

        debug!(
            run_id = %run_id,
            tool = %tool.name(),
            input = %action.tool_input,
            "Calling tool"
        );
        let ctx = ToolContext::new(steps.as_slice(), cancel);
        let observation = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            observed = tool.call(&ctx, &action.tool_input) => match observed {
                Ok(observation) => observation,
                Err(ToolError::Cancelled(reason)) => {
                    debug!(
                        run_id = %run_id,
                        tool = %tool.name(),
                        %reason,
                        "Tool observed cancellation"
                    );
                    return Err(Error::Cancelled);
                }
                Err(e) => return Err(e.into()),
            },
        };

        steps.push(AgentStep::new(action, observation));
        Ok(())
    }

    fn assemble_outputs(&self, finish: AgentFinish, steps: &[AgentStep]) -> Result<ChainValues> {
        let mut outputs = finish.return_values;
        if self.return_intermediate_steps {
            outputs.insert(INTERMEDIATE_STEPS_KEY.into(), serde_json::to_value(steps)?);
        }
        Ok(outputs)
    }
}

/// Check that every input is a string, before any planning happens.
pub fn inputs_to_strings(inputs: &ChainValues) -> Result<PlannerInputs> {
    inputs
        .iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key.clone(), s.clone())),
            _ => Err(Error::InputNotString { key: key.clone() }),
        })
        .collect()
}
