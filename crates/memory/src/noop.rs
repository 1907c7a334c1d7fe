//! No-op memory: disables conversation memory entirely.

use async_trait::async_trait;
use ledgerloop_core::agent::ChainValues;
use ledgerloop_core::error::MemoryError;
use ledgerloop_core::memory::ConversationMemory;
use ledgerloop_core::planner::PlannerInputs;

/// A memory that remembers nothing and contributes no variables.
pub struct NoopMemory;

#[async_trait]
impl ConversationMemory for NoopMemory {
    fn name(&self) -> &str {
        "none"
    }

    fn memory_variables(&self) -> Vec<String> {
        Vec::new()
    }

    async fn load_variables(&self, _inputs: &PlannerInputs) -> Result<ChainValues, MemoryError> {
        Ok(ChainValues::new())
    }

    async fn save_context(
        &self,
        _inputs: &PlannerInputs,
        _outputs: &ChainValues,
    ) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        Ok(())
    }
}
