//! # LedgerLoop Core
//!
//! Domain types, capability traits, and error definitions for the
//! LedgerLoop agent executor. Concrete planners, tools, and memories live
//! in other crates and implement the traits defined here.
//!
//! ## Capabilities
//!
//! - [`Planner`] decides the next actions or the final answer
//! - [`Tool`] executes one action and returns an observation
//! - [`Observer`] watches a run without influencing it
//! - [`ConversationMemory`] carries variables between runs

pub mod agent;
pub mod error;
pub mod event;
pub mod memory;
pub mod observer;
pub mod planner;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{
    ActionTarget, AgentAction, AgentFinish, AgentStep, ChainValues, INTERMEDIATE_STEPS_KEY,
    NO_TOOL_SENTINEL, OUTPUT_KEY,
};
pub use error::{Error, MemoryError, PlannerError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use memory::ConversationMemory;
pub use observer::Observer;
pub use planner::{Plan, Planner, PlannerInputs};
pub use tool::{Tool, ToolContext, ToolRegistry};
pub use tokio_util::sync::CancellationToken;
