//! Observer hook: a side channel notified as the executor runs.
//!
//! Observers are fire-and-forget: they get borrowed views of the data and
//! return nothing, so they cannot steer the loop. Keep them fast; they run
//! inline on the executor's task.

use crate::agent::{AgentAction, AgentFinish, AgentStep};

pub trait Observer: Send + Sync {
    /// Called for every action the executor dispatches.
    fn on_action(&self, _action: &AgentAction) {}

    /// Called once when the run ends with a finish or runs out of iterations.
    fn on_finish(&self, _finish: &AgentFinish, _steps: &[AgentStep]) {}
}
