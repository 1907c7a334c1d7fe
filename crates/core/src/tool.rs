//! Tool trait: the abstraction over capabilities an agent can invoke.
//!
//! A tool takes a plain string input and returns a string observation.
//! Tools are shared between concurrent executor calls, so they must not
//! keep per-call mutable state; anything call-specific arrives through
//! the [`ToolContext`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::agent::{AgentStep, NO_TOOL_SENTINEL};
use crate::error::ToolError;

/// Per-invocation, read-only context handed to a tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    /// Steps recorded so far in the current executor call
    pub steps: &'a [AgentStep],

    /// Cancellation signal of the current executor call
    pub cancellation: &'a CancellationToken,
}

impl<'a> ToolContext<'a> {
    pub fn new(steps: &'a [AgentStep], cancellation: &'a CancellationToken) -> Self {
        Self { steps, cancellation }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name the planner uses to request this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (shown to the planner).
    fn description(&self) -> &str;

    /// Run the tool. Any error is fatal to the executor call.
    async fn call(&self, ctx: &ToolContext<'_>, input: &str) -> Result<String, ToolError>;
}

/// Case-insensitive name → tool lookup.
///
/// Names are canonicalized to uppercase. Registering a second tool under
/// the same name replaces the first. The `none` sentinel is reserved.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools, in order.
    pub fn from_tools<I>(tools: I) -> Result<Self, ToolError>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        if tool.name().eq_ignore_ascii_case(NO_TOOL_SENTINEL) {
            return Err(ToolError::ReservedName(tool.name().to_string()));
        }
        let key = canonical(tool.name());
        if self.tools.insert(key, tool.clone()).is_some() {
            warn!(tool = %tool.name(), "Duplicate tool name, keeping the last registered");
        }
        Ok(())
    }

    /// Look up a tool by name, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(&canonical(name))
    }

    /// Registered tool names, as the tools report them, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.values().map(|t| t.name()).collect();
        names.sort_unstable();
        names
    }

    /// One `name: description` line per tool, sorted by name.
    pub fn descriptions(&self) -> String {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

fn canonical(name: &str) -> String {
    name.to_uppercase()
}
