//! Agent domain types: actions, steps, and the terminal finish.
//!
//! These are the values that flow around one executor call: the planner
//! emits [`AgentAction`]s or an [`AgentFinish`], the executor turns every
//! dispatched action into an [`AgentStep`] and replays the accumulated
//! steps to the planner on the next round.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key/value mapping used for executor inputs and outputs.
pub type ChainValues = HashMap<String, serde_json::Value>;

/// Conventional key carrying the planner's answer in [`AgentFinish::return_values`].
pub const OUTPUT_KEY: &str = "output";

/// Reserved output key under which the ledger is returned when
/// intermediate steps are requested.
pub const INTERMEDIATE_STEPS_KEY: &str = "intermediate_steps";

/// Tool name a planner uses to say "no tool, I'm ready to answer".
pub const NO_TOOL_SENTINEL: &str = "none";

/// A requested invocation of a named tool with a string input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAction {
    /// Tool name, matched case-insensitively against the registry
    pub tool: String,

    /// Raw input handed to the tool
    pub tool_input: String,

    /// Planner reasoning that produced this action
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log: String,
}

/// How the executor should interpret an action's tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget<'a> {
    /// The planner asked for no tool; it should write the final answer.
    FinalAnswerHint,
    /// A named tool to resolve in the registry.
    Tool(&'a str),
}

impl AgentAction {
    pub fn new(tool: impl Into<String>, tool_input: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            tool_input: tool_input.into(),
            log: String::new(),
        }
    }

    /// Attach the planner's reasoning log.
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = log.into();
        self
    }

    /// Interpret the tool name, mapping the `none` sentinel to its own outcome.
    pub fn target(&self) -> ActionTarget<'_> {
        if self.tool.eq_ignore_ascii_case(NO_TOOL_SENTINEL) {
            ActionTarget::FinalAnswerHint
        } else {
            ActionTarget::Tool(&self.tool)
        }
    }

    /// Two actions repeat each other when tool and input match.
    ///
    /// The tool name is compared case-folded (as the registry resolves it);
    /// the input must match exactly and the log is ignored.
    pub fn repeats(&self, other: &AgentAction) -> bool {
        self.tool_input == other.tool_input
            && self.tool.to_uppercase() == other.tool.to_uppercase()
    }
}

/// One completed round-trip: the action taken and what it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStep {
    /// The dispatched action (empty for synthetic steps)
    #[serde(default)]
    pub action: AgentAction,

    /// The observation recorded for the action
    pub observation: String,
}

impl AgentStep {
    pub fn new(action: AgentAction, observation: impl Into<String>) -> Self {
        Self {
            action,
            observation: observation.into(),
        }
    }

    /// A step with no action, carrying only an observation for the planner.
    pub fn synthetic(observation: impl Into<String>) -> Self {
        Self::new(AgentAction::default(), observation)
    }
}

/// The planner's terminal output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentFinish {
    /// Result values; by convention carries an `output` entry
    pub return_values: ChainValues,

    /// Planner reasoning that produced the finish
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log: String,
}

impl AgentFinish {
    pub fn new(return_values: ChainValues) -> Self {
        Self {
            return_values,
            log: String::new(),
        }
    }

    /// A finish carrying a single `output` value.
    pub fn output(text: impl Into<String>) -> Self {
        let mut values = ChainValues::new();
        values.insert(OUTPUT_KEY.into(), serde_json::Value::String(text.into()));
        Self::new(values)
    }

    /// The `output` entry as text, if present and a string.
    pub fn output_text(&self) -> Option<&str> {
        self.return_values.get(OUTPUT_KEY).and_then(|v| v.as_str())
    }
}
