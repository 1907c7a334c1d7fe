//! Conversation memory: named variables carried between executor calls.
//!
//! The executor never reads memory inside its loop. Memory is loaded into
//! the inputs before a call and updated with the outputs after a
//! successful one, so the same planner can hold a multi-turn conversation.

use async_trait::async_trait;

use crate::agent::ChainValues;
use crate::error::MemoryError;
use crate::planner::PlannerInputs;

#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// The backend name (e.g., "buffer", "none").
    fn name(&self) -> &str;

    /// Variable names this memory contributes to the inputs.
    fn memory_variables(&self) -> Vec<String>;

    /// Load the memory variables for the upcoming call.
    async fn load_variables(&self, inputs: &PlannerInputs) -> Result<ChainValues, MemoryError>;

    /// Record the inputs and outputs of a completed call.
    async fn save_context(
        &self,
        inputs: &PlannerInputs,
        outputs: &ChainValues,
    ) -> Result<(), MemoryError>;

    /// Forget everything.
    async fn clear(&self) -> Result<(), MemoryError>;
}
