//! Step history tool: lets the planner look back at what it already did.
//!
//! The executor hands every tool the current ledger through its
//! [`ToolContext`]; this tool renders it. The input is an optional
//! limit on how many of the most recent steps to show.

use async_trait::async_trait;
use ledgerloop_core::error::ToolError;
use ledgerloop_core::tool::{Tool, ToolContext};

pub struct StepHistoryTool;

#[async_trait]
impl Tool for StepHistoryTool {
    fn name(&self) -> &str {
        "step_history"
    }

    fn description(&self) -> &str {
        "List the actions already taken in this task and what they returned. \
         Input: optional number of most recent steps to show."
    }

    async fn call(&self, ctx: &ToolContext<'_>, input: &str) -> Result<String, ToolError> {
        let input = input.trim();
        let limit = if input.is_empty() {
            ctx.steps.len()
        } else {
            input.parse::<usize>().map_err(|_| ToolError::InvalidInput {
                tool_name: self.name().into(),
                reason: format!("expected a step count, got '{input}'"),
            })?
        };

        let taken: Vec<_> = ctx
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.action.tool.is_empty())
            .collect();
        if taken.is_empty() {
            return Ok("No actions taken yet.".into());
        }

        let skip = taken.len().saturating_sub(limit);
        Ok(taken[skip..]
            .iter()
            .map(|(i, s)| {
                format!(
                    "{}. {}({}) -> {}",
                    i + 1,
                    s.action.tool,
                    s.action.tool_input,
                    s.observation
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
