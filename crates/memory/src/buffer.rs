//! Buffer memory: keeps every exchange in process and replays it as text.
//!
//! Each saved call becomes a [`Turn`]. Loading renders all turns as a
//! `Human: …` / `AI: …` transcript under the `history` variable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerloop_core::agent::{ChainValues, OUTPUT_KEY};
use ledgerloop_core::error::MemoryError;
use ledgerloop_core::memory::ConversationMemory;
use ledgerloop_core::planner::PlannerInputs;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// One remembered exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub human: String,
    pub ai: String,
    pub recorded_at: DateTime<Utc>,
}

/// An in-process conversation buffer.
pub struct BufferMemory {
    turns: Arc<RwLock<Vec<Turn>>>,
    memory_key: String,
    human_prefix: String,
    ai_prefix: String,
    input_key: Option<String>,
    output_key: String,
}

impl BufferMemory {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
            memory_key: "history".into(),
            human_prefix: "Human".into(),
            ai_prefix: "AI".into(),
            input_key: None,
            output_key: OUTPUT_KEY.into(),
        }
    }

    /// Variable name the transcript is loaded under.
    pub fn with_memory_key(mut self, key: impl Into<String>) -> Self {
        self.memory_key = key.into();
        self
    }

    pub fn with_prefixes(mut self, human: impl Into<String>, ai: impl Into<String>) -> Self {
        self.human_prefix = human.into();
        self.ai_prefix = ai.into();
        self
    }

    /// Which input holds the human message. Without it the inputs must
    /// have exactly one non-memory key.
    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.input_key = Some(key.into());
        self
    }

    /// Which output holds the AI message.
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }

    /// Snapshot of the remembered turns.
    pub async fn turns(&self) -> Vec<Turn> {
        self.turns.read().await.clone()
    }

    fn human_message(&self, inputs: &PlannerInputs) -> Result<String, MemoryError> {
        if let Some(key) = &self.input_key {
            return inputs
                .get(key)
                .cloned()
                .ok_or_else(|| MemoryError::Storage(format!("input key '{key}' not found")));
        }

        let mut candidates = inputs.iter().filter(|(k, _)| **k != self.memory_key);
        match (candidates.next(), candidates.next()) {
            (Some((_, value)), None) => Ok(value.clone()),
            (None, _) => Err(MemoryError::Storage("no input to remember".into())),
            (Some(_), Some(_)) => Err(MemoryError::Storage(
                "multiple input keys; set an input key for the memory".into(),
            )),
        }
    }

    fn ai_message(&self, outputs: &ChainValues) -> Result<String, MemoryError> {
        match outputs.get(&self.output_key) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(other) => serde_json::to_string(other)
                .map_err(|e| MemoryError::Serialization(e.to_string())),
            None => Err(MemoryError::Storage(format!(
                "output key '{}' not found",
                self.output_key
            ))),
        }
    }
}

impl Default for BufferMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationMemory for BufferMemory {
    fn name(&self) -> &str {
        "buffer"
    }

    fn memory_variables(&self) -> Vec<String> {
        vec![self.memory_key.clone()]
    }

    async fn load_variables(&self, _inputs: &PlannerInputs) -> Result<ChainValues, MemoryError> {
        let turns = self.turns.read().await;
        let transcript = turns
            .iter()
            .map(|t| format!("{}: {}\n{}: {}", self.human_prefix, t.human, self.ai_prefix, t.ai))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = ChainValues::new();
        vars.insert(self.memory_key.clone(), serde_json::Value::String(transcript));
        Ok(vars)
    }

    async fn save_context(
        &self,
        inputs: &PlannerInputs,
        outputs: &ChainValues,
    ) -> Result<(), MemoryError> {
        let turn = Turn {
            human: self.human_message(inputs)?,
            ai: self.ai_message(outputs)?,
            recorded_at: Utc::now(),
        };
        let mut turns = self.turns.write().await;
        turns.push(turn);
        debug!(turns = turns.len(), "Buffer memory saved turn");
        Ok(())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.turns.write().await.clear();
        Ok(())
    }
}
