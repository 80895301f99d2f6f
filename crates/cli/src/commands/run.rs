//! `reactloop run`: replay a scripted model through the ReAct loop.

use reactloop_agent::{
    CancelHandle, ChannelSink, Collaborators, LifecycleSink, ReactEngine, WindowCompactor,
};
use reactloop_config::{ConfigError, LoopConfig, LoopConfigUpdate};
use reactloop_core::agent::RunResult;
use reactloop_core::provider::ModelCaller;
use reactloop_core::step::{Phase, Step, StepAction};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::builtin_tools::BuiltinTools;
use crate::replay::ReplayModel;

/// Flags of the `run` subcommand.
pub struct RunOptions {
    pub script: PathBuf,
    pub max_iterations: Option<u32>,
    pub stream: bool,
    pub verbose: bool,
    pub events: bool,
    pub json: bool,
}

pub async fn run(message: &str, options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = LoopConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let model = ReplayModel::load(&options.script)?;

    let cancel = CancelHandle::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            warn!("Interrupted; stopping after the current step");
            on_interrupt.cancel();
        }
    });

    let result = execute(config, &model, message, &options, cancel).await?;
    if model.remaining() > 0 {
        debug!(unused = model.remaining(), "Script has unused responses");
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(answer) = &result.final_answer {
        println!("{answer}");
    }

    if !options.events && !options.json {
        eprintln!(
            "  ({} iterations, {} steps, ~{} tokens)",
            result.total_iterations,
            result.steps.len(),
            result.total_tokens
        );
    }

    if !result.success {
        return Err(result.error.unwrap_or_default().into());
    }
    Ok(())
}

/// Build an engine from `config` plus the command-line overrides and run it
/// once with the built-in tools.
async fn execute(
    config: LoopConfig,
    model: &dyn ModelCaller,
    message: &str,
    options: &RunOptions,
    cancel: CancelHandle,
) -> Result<RunResult, ConfigError> {
    let engine = ReactEngine::new(config);
    engine.update_config(overrides(&engine.config(), options))?;

    let config = engine.config();
    let tools = BuiltinTools;
    let compactor = WindowCompactor::new(config.compaction.max_tokens);
    let collaborators = Collaborators::new(model, &tools, &compactor);

    let result = if options.events {
        run_with_event_stream(&engine, message, collaborators, cancel).await
    } else {
        let sink = TranscriptSink::default();
        engine
            .run_with_cancel(message, &[], collaborators, &sink, cancel)
            .await
    };
    Ok(result)
}

fn overrides(config: &LoopConfig, options: &RunOptions) -> LoopConfigUpdate {
    LoopConfigUpdate {
        max_iterations: options.max_iterations,
        enable_streaming: options.stream.then_some(true),
        verbose: options.verbose.then_some(true),
        tools: config.tools.is_empty().then(BuiltinTools::descriptors),
        ..LoopConfigUpdate::default()
    }
}

/// Run while printing every lifecycle event as one JSON line on stdout.
async fn run_with_event_stream(
    engine: &ReactEngine,
    message: &str,
    collaborators: Collaborators<'_>,
    cancel: CancelHandle,
) -> RunResult {
    let (sink, mut rx) = ChannelSink::new();

    let run = async move {
        let result = engine
            .run_with_cancel(message, &[], collaborators, &sink, cancel)
            .await;
        drop(sink);
        result
    };
    let print = async {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(event = event.event_type(), error = %e, "Failed to encode event"),
            }
        }
    };

    let (result, ()) = tokio::join!(run, print);
    result
}

/// Human-readable transcript on stderr.
#[derive(Default)]
struct TranscriptSink {
    /// Chunks were printed for the current thought
    streamed: AtomicBool,
}

impl LifecycleSink for TranscriptSink {
    fn on_phase_change(&self, phase: Phase) {
        debug!(%phase, "Phase");
    }

    fn on_step(&self, step: &Step) {
        debug!(step_id = %step.id, phase = %step.phase, "Step");
    }

    fn on_chunk(&self, chunk: &str) {
        if !self.streamed.swap(true, Ordering::Relaxed) {
            eprint!("  Thought > ");
        }
        eprint!("{chunk}");
        let _ = std::io::stderr().flush();
    }

    fn on_thought(&self, thought: &str) {
        if self.streamed.swap(false, Ordering::Relaxed) {
            eprintln!();
            return;
        }
        for line in thought.lines() {
            eprintln!("  Thought > {line}");
        }
    }

    fn on_action(&self, action: &StepAction) {
        eprintln!(
            "  Action  > {}({})",
            action.tool_name,
            serde_json::Value::Object(action.input.clone())
        );
    }

    fn on_observation(&self, observation: &str) {
        let mut shown: String = observation.chars().take(200).collect();
        if shown.len() < observation.len() {
            shown.push('…');
        }
        eprintln!("  Observe > {shown}");
    }

    fn on_error(&self, error: &str) {
        eprintln!("  [Error] {error}");
    }
}
