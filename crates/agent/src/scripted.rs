//! Scripted planner: replays a fixed sequence of rounds from TOML.
//!
//! Lets the CLI and integration tests drive the executor without a model
//! behind it. A script looks like:
//!
//! ```toml
//! input_keys = ["input"]
//!
//! [[round]]
//! actions = [{ tool = "calculator", tool_input = "2 + 2" }]
//!
//! [[round]]
//! finish = { output = "The answer is {last_observation}" }
//! ```
//!
//! String values in actions and finishes may use `{last_observation}` and
//! `{<input key>}` placeholders.

use async_trait::async_trait;
use ledgerloop_core::agent::{AgentAction, AgentFinish, AgentStep, ChainValues, OUTPUT_KEY};
use ledgerloop_core::error::PlannerError;
use ledgerloop_core::planner::{Plan, Planner, PlannerInputs};
use ledgerloop_core::tool::Tool;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::executor::LAST_CHANCE_HINT;

/// One scripted planner round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptRound {
    /// Actions to dispatch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AgentAction>,

    /// Return values that end the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<ChainValues>,

    /// Simulate output the planner could not parse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unparsable: Option<String>,

    /// Simulate any other planner failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A full planner script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(default = "default_input_keys")]
    pub input_keys: Vec<String>,

    #[serde(default = "default_output_keys")]
    pub output_keys: Vec<String>,

    #[serde(default, rename = "round")]
    pub rounds: Vec<ScriptRound>,
}

fn default_input_keys() -> Vec<String> {
    vec!["input".into()]
}
fn default_output_keys() -> Vec<String> {
    vec![OUTPUT_KEY.into()]
}

impl Script {
    /// Parse a script from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ScriptError> {
        let script: Self = toml::from_str(text).map_err(|e| ScriptError::Parse(e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    /// Load a script from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(|e| ScriptError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if self.rounds.is_empty() {
            return Err(ScriptError::Invalid("script has no rounds".into()));
        }
        for (i, round) in self.rounds.iter().enumerate() {
            let kinds = [
                round.finish.is_some(),
                round.unparsable.is_some(),
                round.error.is_some(),
            ]
            .iter()
            .filter(|set| **set)
            .count();
            if kinds > 1 {
                return Err(ScriptError::Invalid(format!(
                    "round {} mixes finish, unparsable and error",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to read script at {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse script: {0}")]
    Parse(String),

    #[error("Invalid script: {0}")]
    Invalid(String),
}

/// Replays a [`Script`], one round per planner call.
///
/// The planner keeps no per-run state: the round to play is worked out
/// from the ledger, so one planner can serve concurrent calls. Once the
/// script runs out the last round is replayed.
pub struct ScriptedPlanner {
    script: Script,
    tools: Vec<Arc<dyn Tool>>,
}

impl ScriptedPlanner {
    pub fn new(script: Script, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { script, tools }
    }

    /// Index of the round that produced `steps`, i.e. the next one to play.
    ///
    /// Action rounds leave one step per action and unparsable rounds leave
    /// one synthetic step. Last-chance hints are not rounds.
    pub fn round_index(&self, steps: &[AgentStep]) -> usize {
        let mut index = 0;
        let mut pos = 0;
        while pos < steps.len() {
            let step = &steps[pos];
            if step.action.tool.is_empty() && step.observation == LAST_CHANCE_HINT {
                pos += 1;
                continue;
            }
            let consumed = match self.round_at(index) {
                Some(round) if round.unparsable.is_none() => round.actions.len().max(1),
                _ => 1,
            };
            pos += consumed;
            index += 1;
        }
        index
    }

    fn round_at(&self, index: usize) -> Option<&ScriptRound> {
        let last = self.script.rounds.len().checked_sub(1)?;
        self.script.rounds.get(index.min(last))
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(
        &self,
        steps: &[AgentStep],
        inputs: &PlannerInputs,
    ) -> Result<Plan, PlannerError> {
        let index = self.round_index(steps);
        let round = self
            .round_at(index)
            .ok_or_else(|| PlannerError::Internal("script has no rounds".into()))?;
        debug!(round = index + 1, steps = steps.len(), "Scripted planner round");

        if let Some(message) = &round.unparsable {
            return Err(PlannerError::UnparsableOutput(message.clone()));
        }
        if let Some(message) = &round.error {
            return Err(PlannerError::Internal(message.clone()));
        }

        let vars = Placeholders { steps, inputs };
        if let Some(values) = &round.finish {
            let values = values
                .iter()
                .map(|(k, v)| (k.clone(), vars.render_value(v)))
                .collect();
            return Ok(Plan::finish(AgentFinish::new(values)));
        }

        let actions = round
            .actions
            .iter()
            .map(|a| AgentAction {
                tool: a.tool.clone(),
                tool_input: vars.render(&a.tool_input),
                log: a.log.clone(),
            })
            .collect();
        Ok(Plan::act(actions))
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }

    fn input_keys(&self) -> Vec<String> {
        self.script.input_keys.clone()
    }

    fn output_keys(&self) -> Vec<String> {
        self.script.output_keys.clone()
    }
}

struct Placeholders<'a> {
    steps: &'a [AgentStep],
    inputs: &'a PlannerInputs,
}

impl Placeholders<'_> {
    fn render(&self, template: &str) -> String {
        let mut out = template.to_string();
        if out.contains("{last_observation}") {
            let last = self
                .steps
                .iter()
                .rev()
                .find(|s| !s.action.tool.is_empty())
                .map(|s| s.observation.as_str())
                .unwrap_or_default();
            out = out.replace("{last_observation}", last);
        }
        for (key, value) in self.inputs {
            out = out.replace(&format!("{{{key}}}"), value);
        }
        out
    }

    fn render_value(&self, value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::String(s) => serde_json::Value::String(self.render(s)),
            other => other.clone(),
        }
    }
}
