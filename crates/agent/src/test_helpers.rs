//! Shared test helpers for executor tests.

use async_trait::async_trait;
use ledgerloop_core::agent::{AgentAction, AgentFinish, AgentStep, ChainValues};
use ledgerloop_core::error::{PlannerError, ToolError};
use ledgerloop_core::observer::Observer;
use ledgerloop_core::planner::{Plan, Planner, PlannerInputs};
use ledgerloop_core::tool::{Tool, ToolContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

type PlanResult = Result<Plan, PlannerError>;
type PlanFn = Box<dyn Fn(&[AgentStep]) -> PlanResult + Send + Sync>;

enum Responder {
    Sequence(Vec<PlanResult>),
    Repeating(PlanResult),
    Func(PlanFn),
}

/// A mock planner that returns scripted plans and records what it was shown.
///
/// With a sequence, each call to `plan` returns the next entry.
/// Panics if more calls are made than entries provided.
pub struct SequentialMockPlanner {
    responder: Responder,
    tools: Vec<Arc<dyn Tool>>,
    call_count: Mutex<usize>,
    seen_step_counts: Mutex<Vec<usize>>,
    seen_inputs: Mutex<Vec<PlannerInputs>>,
}

impl SequentialMockPlanner {
    fn with_responder(responder: Responder) -> Self {
        Self {
            responder,
            tools: vec![],
            call_count: Mutex::new(0),
            seen_step_counts: Mutex::new(vec![]),
            seen_inputs: Mutex::new(vec![]),
        }
    }

    pub fn new(responses: Vec<PlanResult>) -> Self {
        Self::with_responder(Responder::Sequence(responses))
    }

    /// Return the same plan on every call.
    pub fn repeating(response: PlanResult) -> Self {
        Self::with_responder(Responder::Repeating(response))
    }

    /// Compute each plan from the ledger.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&[AgentStep]) -> PlanResult + Send + Sync + 'static,
    {
        Self::with_responder(Responder::Func(Box::new(f)))
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Ledger length seen on each call.
    pub fn seen_step_counts(&self) -> Vec<usize> {
        self.seen_step_counts.lock().unwrap().clone()
    }

    /// Inputs seen on each call.
    pub fn seen_inputs(&self) -> Vec<PlannerInputs> {
        self.seen_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Planner for SequentialMockPlanner {
    async fn plan(&self, steps: &[AgentStep], inputs: &PlannerInputs) -> PlanResult {
        let index = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count - 1
        };
        self.seen_step_counts.lock().unwrap().push(steps.len());
        self.seen_inputs.lock().unwrap().push(inputs.clone());

        match &self.responder {
            Responder::Sequence(responses) => match responses.get(index) {
                Some(response) => response.clone(),
                None => panic!(
                    "SequentialMockPlanner: no more responses (call #{}, have {})",
                    index,
                    responses.len()
                ),
            },
            Responder::Repeating(response) => response.clone(),
            Responder::Func(f) => f(steps),
        }
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }

    fn input_keys(&self) -> Vec<String> {
        vec!["input".into()]
    }

    fn output_keys(&self) -> Vec<String> {
        vec!["output".into()]
    }
}

/// A planner that cancels the run's token and then never returns a plan.
pub struct HangingPlanner {
    token: CancellationToken,
    tools: Vec<Arc<dyn Tool>>,
    calls: AtomicUsize,
}

impl HangingPlanner {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            tools: vec![],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Planner for HangingPlanner {
    async fn plan(&self, _steps: &[AgentStep], _inputs: &PlannerInputs) -> PlanResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token.cancel();
        std::future::pending().await
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }

    fn input_keys(&self) -> Vec<String> {
        vec!["input".into()]
    }

    fn output_keys(&self) -> Vec<String> {
        vec!["output".into()]
    }
}

/// Records every notification it receives.
#[derive(Default)]
pub struct RecordingObserver {
    actions: Mutex<Vec<AgentAction>>,
    finishes: Mutex<Vec<(AgentFinish, usize)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<AgentAction> {
        self.actions.lock().unwrap().clone()
    }

    /// Each finish with the ledger length it was reported with.
    pub fn finishes(&self) -> Vec<(AgentFinish, usize)> {
        self.finishes.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn on_action(&self, action: &AgentAction) {
        self.actions.lock().unwrap().push(action.clone());
    }

    fn on_finish(&self, finish: &AgentFinish, steps: &[AgentStep]) {
        self.finishes.lock().unwrap().push((finish.clone(), steps.len()));
    }
}

/// A tool that always returns the same observation and counts its calls.
pub struct StaticTool {
    name: String,
    output: String,
    calls: AtomicUsize,
}

impl StaticTool {
    pub fn new(name: &str, output: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            output: output.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Returns a fixed observation"
    }

    async fn call(&self, _ctx: &ToolContext<'_>, _input: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// A tool that always fails.
pub struct FailingTool {
    name: String,
}

impl FailingTool {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    async fn call(&self, _ctx: &ToolContext<'_>, _input: &str) -> Result<String, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: "backend unavailable".into(),
        })
    }
}

/// A tool that cancels the run's token and then never completes.
pub struct HangingTool {
    name: String,
    token: CancellationToken,
}

impl HangingTool {
    pub fn new(name: &str, token: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            token,
        })
    }
}

#[async_trait]
impl Tool for HangingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Hangs until cancelled"
    }

    async fn call(&self, _ctx: &ToolContext<'_>, _input: &str) -> Result<String, ToolError> {
        self.token.cancel();
        std::future::pending().await
    }
}

/// A tool that gives up with its own cancellation error.
pub struct CancelledTool {
    name: String,
}

impl CancelledTool {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }
}

#[async_trait]
impl Tool for CancelledTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Reports cancellation"
    }

    async fn call(&self, _ctx: &ToolContext<'_>, _input: &str) -> Result<String, ToolError> {
        Err(ToolError::Cancelled("deadline reached".into()))
    }
}

/// A tool that reports how many steps it was shown.
pub struct LedgerLengthTool;

#[async_trait]
impl Tool for LedgerLengthTool {
    fn name(&self) -> &str {
        "count"
    }

    fn description(&self) -> &str {
        "Counts ledger steps"
    }

    async fn call(&self, ctx: &ToolContext<'_>, _input: &str) -> Result<String, ToolError> {
        Ok(ctx.steps.len().to_string())
    }
}

/// Build string-valued executor inputs.
pub fn inputs(pairs: &[(&str, &str)]) -> ChainValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect()
}
