//! Error types for the LedgerLoop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each capability (planner, tool, memory) has its own error enum that
//! folds into the top-level [`Error`].

use thiserror::Error;

/// The top-level error type returned by an executor call.
#[derive(Debug, Error)]
pub enum Error {
    // --- Input validation ---
    #[error("Executor input is not a string: {key}")]
    InputNotString { key: String },

    // --- Loop termination ---
    #[error("Agent returned neither actions nor a finish")]
    AgentNoReturn,

    #[error("Agent did not finish within {iterations} iterations")]
    NotFinished { iterations: u32 },

    #[error("Execution cancelled")]
    Cancelled,

    // --- Capability errors ---
    #[error("Planner error: {0}")]
    Planner(#[from] PlannerError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Capability errors ---

#[derive(Debug, Clone, Error)]
pub enum PlannerError {
    /// The planner produced output it could not turn into actions or a finish.
    #[error("unable to parse agent output: {0}")]
    UnparsableOutput(String),

    #[error("Provider failure: {0}")]
    Provider(String),

    #[error("Planner failure: {0}")]
    Internal(String),
}

impl PlannerError {
    /// Whether an error recovery policy may turn this failure into an observation.
    pub fn is_unparsable(&self) -> bool {
        matches!(self, PlannerError::UnparsableOutput(_))
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool input for {tool_name}: {reason}")]
    InvalidInput { tool_name: String, reason: String },

    #[error("Tool name is reserved: {0}")]
    ReservedName(String),

    #[error("Tool cancelled: {0}")]
    Cancelled(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Memory serialization failed: {0}")]
    Serialization(String),
}
