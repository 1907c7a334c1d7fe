//! `ledgerloop run`: drive the executor with a scripted planner.

use clap::Args;
use ledgerloop_agent::{Executor, LogObserver, Script, ScriptedPlanner};
use ledgerloop_config::{AppConfig, MemoryBackend, MemoryConfig};
use ledgerloop_core::{CancellationToken, ChainValues, ConversationMemory};
use ledgerloop_memory::BufferMemory;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Planner script (TOML)
    #[arg(short, long)]
    pub script: PathBuf,

    /// Executor input as key=value, repeatable
    #[arg(short, long = "input", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// Include intermediate steps in the output
    #[arg(long)]
    pub steps: bool,

    /// Override executor.max_iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn run(config: &AppConfig, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let script = Script::load(&args.script)?;
    let planner = Arc::new(ScriptedPlanner::new(script, ledgerloop_tools::builtin_tools()));

    let mut executor = Executor::new(planner)
        .with_config(&config.executor)
        .with_observer(Arc::new(LogObserver));
    if let Some(max) = args.max_iterations {
        executor = executor.with_max_iterations(max);
    }
    if args.steps {
        executor = executor.with_intermediate_steps(true);
    }
    if let Some(memory) = build_memory(config)? {
        executor = executor.with_memory(memory);
    }

    let inputs: ChainValues = args
        .inputs
        .into_iter()
        .map(|(k, v)| (k, serde_json::Value::String(v)))
        .collect();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            on_signal.cancel();
        }
    });

    let outputs = if executor.memory().is_some() {
        executor.call_with_memory(&cancel, &inputs).await?
    } else {
        executor.call(&cancel, &inputs).await?
    };

    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

fn build_memory(
    config: &AppConfig,
) -> Result<Option<Arc<dyn ConversationMemory>>, Box<dyn std::error::Error>> {
    match config.memory_backend()? {
        MemoryBackend::None => Ok(None),
        MemoryBackend::Buffer => Ok(Some(Arc::new(buffer_memory(&config.memory)))),
    }
}

fn buffer_memory(config: &MemoryConfig) -> BufferMemory {
    let memory = BufferMemory::new()
        .with_prefixes(config.human_prefix.clone(), config.ai_prefix.clone())
        .with_output_key(config.output_key.clone());
    match &config.input_key {
        Some(key) => memory.with_input_key(key.clone()),
        None => memory,
    }
}
