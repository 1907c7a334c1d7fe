//! Ready-made [`Observer`] implementations.

use chrono::Utc;
use ledgerloop_core::agent::{AgentAction, AgentFinish, AgentStep};
use ledgerloop_core::event::{DomainEvent, EventBus};
use ledgerloop_core::observer::Observer;
use std::sync::Arc;
use tracing::info;

/// Writes every notification to the `tracing` log.
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_action(&self, action: &AgentAction) {
        info!(tool = %action.tool, input = %action.tool_input, "Agent action");
    }

    fn on_finish(&self, finish: &AgentFinish, steps: &[AgentStep]) {
        info!(
            output = finish.output_text().unwrap_or_default(),
            steps = steps.len(),
            "Agent finish"
        );
    }
}

/// Republishes notifications as [`DomainEvent`]s on an [`EventBus`].
pub struct EventBusObserver {
    bus: Arc<EventBus>,
}

impl EventBusObserver {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

impl Observer for EventBusObserver {
    fn on_action(&self, action: &AgentAction) {
        self.bus.publish(DomainEvent::ActionDispatched {
            tool: action.tool.clone(),
            tool_input: action.tool_input.clone(),
            timestamp: Utc::now(),
        });
    }

    fn on_finish(&self, finish: &AgentFinish, steps: &[AgentStep]) {
        self.bus.publish(DomainEvent::RunFinished {
            finished: finish.output_text() != Some(crate::executor::NOT_FINISHED_MARKER),
            output: finish.output_text().map(str::to_string),
            steps: steps.len(),
            timestamp: Utc::now(),
        });
    }
}

/// Fans each notification out to several observers, in order.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn Observer>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for ObserverSet {
    fn on_action(&self, action: &AgentAction) {
        for o in &self.observers {
            o.on_action(action);
        }
    }

    fn on_finish(&self, finish: &AgentFinish, steps: &[AgentStep]) {
        for o in &self.observers {
            o.on_finish(finish, steps);
        }
    }
}
