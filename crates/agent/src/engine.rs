//! ReAct engine: Thought → Action → Observation loop.
//!
//! The engine drives a model through rounds of thinking and tool use until
//! it answers without requesting a tool, the run is cancelled, or the
//! iteration cap is hit. It owns no model, tools, or compactor: each run is
//! handed a set of [`Collaborators`].
//!
//! # Iteration
//!
//! 1. Stop if cancelled; stop if the cap is reached
//! 2. Compact a copy of the history for the model call and take its token
//!    estimate; the full history is kept and only ever appended to
//! 3. Record a placeholder thinking step, call the model
//! 4. Fill in the thought; append the assistant message
//! 5. No tool requests → completed. Otherwise, for each request in order:
//!    record an acting step, run the tool, record an observing step and
//!    append the tool message
//! 6. Re-estimate tokens over the full history and go round again
//!
//! Tool failures and malformed arguments are fed back to the model; model
//! and compaction failures, cancellation and the cap end the run. Whatever
//! happens, [`ReactEngine::run`] resolves to a [`RunResult`].

use reactloop_config::{ConfigError, LoopConfig, LoopConfigUpdate};
use reactloop_core::agent::RunResult;
use reactloop_core::compaction::HistoryCompactor;
use reactloop_core::error::{AgentError, Result};
use reactloop_core::message::Message;
use reactloop_core::provider::{ChunkSink, ModelCaller};
use reactloop_core::step::{Phase, Step};
use reactloop_core::token;
use reactloop_core::tool::{ToolExecutor, ToolRequest};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::cancel::CancelHandle;
use crate::lifecycle::{LifecycleSink, NoopSink, StreamBuffer};
use crate::prompt;
use crate::recorder::StepRecorder;
use crate::state::AgentState;

/// The three capabilities a run needs from its environment.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub model: &'a dyn ModelCaller,
    pub tools: &'a dyn ToolExecutor,
    pub compactor: &'a dyn HistoryCompactor,
}

impl<'a> Collaborators<'a> {
    pub fn new(
        model: &'a dyn ModelCaller,
        tools: &'a dyn ToolExecutor,
        compactor: &'a dyn HistoryCompactor,
    ) -> Self {
        Self {
            model,
            tools,
            compactor,
        }
    }
}

/// The run currently owned by an engine.
struct ActiveRun {
    id: u64,
    cancel: CancelHandle,
    state: AgentState,
}

/// Everything one run threads through its helpers.
struct RunContext<'a> {
    id: u64,
    config: &'a LoopConfig,
    collaborators: Collaborators<'a>,
    sink: &'a dyn LifecycleSink,
    cancel: &'a CancelHandle,
}

/// Drives ReAct runs. One engine runs at most one run at a time; callers
/// check [`ReactEngine::is_running`] before starting another.
pub struct ReactEngine {
    config: RwLock<LoopConfig>,
    recorder: StepRecorder,
    active: Mutex<Option<ActiveRun>>,
    next_run_id: AtomicU64,
}

impl ReactEngine {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config: RwLock::new(config),
            recorder: StepRecorder::new(),
            active: Mutex::new(None),
            next_run_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> LoopConfig {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Merge `update` into the configuration. Takes effect from the next run.
    pub fn update_config(&self, update: LoopConfigUpdate) -> std::result::Result<(), ConfigError> {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        config.merge(update)?;
        debug!(max_iterations = config.max_iterations, tools = config.tools.len(), "Engine configuration updated");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|run| run.state.running && !run.cancel.is_cancelled())
    }

    /// Snapshot of the active run's state, if a run is in progress.
    pub fn state(&self) -> Option<AgentState> {
        self.lock_active().as_ref().map(|run| run.state.clone())
    }

    /// Cancellation handle of the active run, for stopping it from elsewhere.
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.lock_active().as_ref().map(|run| run.cancel.clone())
    }

    /// Ask the active run to stop. It finishes any model or tool call in
    /// flight and starts nothing new. No-op when idle.
    pub fn stop(&self) {
        let mut active = self.lock_active();
        if let Some(run) = active.as_mut() {
            info!(run_id = run.id, iteration = run.state.iteration, "Stop requested");
            run.cancel.cancel();
            run.state.running = false;
        }
    }

    /// Discard the active run's state, cancelling it if it is still going.
    pub fn reset(&self) {
        if let Some(run) = self.lock_active().take() {
            run.cancel.cancel();
            debug!(run_id = run.id, "Engine reset");
        }
    }

    /// Run the loop for `user_utterance` without observing events.
    pub async fn run(
        &self,
        user_utterance: &str,
        prior_messages: &[Message],
        collaborators: Collaborators<'_>,
    ) -> RunResult {
        self.run_with_sink(user_utterance, prior_messages, collaborators, &NoopSink)
            .await
    }

    /// Run the loop, reporting lifecycle events to `sink`.
    pub async fn run_with_sink(
        &self,
        user_utterance: &str,
        prior_messages: &[Message],
        collaborators: Collaborators<'_>,
        sink: &dyn LifecycleSink,
    ) -> RunResult {
        self.run_with_cancel(
            user_utterance,
            prior_messages,
            collaborators,
            sink,
            CancelHandle::new(),
        )
        .await
    }

    /// Run the loop with a caller-supplied cancellation handle.
    ///
    /// Cancelling `cancel` has the same effect as [`ReactEngine::stop`].
    pub async fn run_with_cancel(
        &self,
        user_utterance: &str,
        prior_messages: &[Message],
        collaborators: Collaborators<'_>,
        sink: &dyn LifecycleSink,
        cancel: CancelHandle,
    ) -> RunResult {
        if user_utterance.trim().is_empty() {
            let message = AgentError::EmptyInput.to_string();
            warn!("Rejected run with empty user message");
            let result = RunResult::failure(message.as_str(), Vec::new(), 0, 0);
            sink.on_error(&message);
            sink.on_complete(&result);
            return result;
        }

        let config = self.config();
        let base = config
            .system_prompt
            .as_deref()
            .unwrap_or(prompt::DEFAULT_SYSTEM_PROMPT);
        let system_prompt = prompt::build_system_prompt(base, &config.tools);
        let history = prompt::build_initial_history(&system_prompt, prior_messages, user_utterance);
        let mut state = AgentState::new(config.max_iterations, history);

        let ctx = RunContext {
            id: self.activate(&cancel, &state),
            config: &config,
            collaborators,
            sink,
            cancel: &cancel,
        };

        info!(
            run_id = ctx.id,
            max_iterations = config.max_iterations,
            tools = config.tools.len(),
            tool_tokens = token::estimate_tools_tokens(&config.tools),
            prior_messages = prior_messages.len(),
            "ReAct run starting"
        );
        sink.on_phase_change(Phase::Thinking);

        let result = match self.drive(&ctx, &mut state).await {
            Ok(answer) => {
                info!(
                    run_id = ctx.id,
                    iterations = state.iteration,
                    steps = state.steps.len(),
                    tokens = state.total_tokens,
                    "ReAct run completed"
                );
                RunResult::success(
                    answer,
                    state.steps.clone(),
                    state.iteration,
                    state.total_tokens,
                )
            }
            Err(err) => {
                let message = err.to_string();
                warn!(run_id = ctx.id, iteration = state.iteration, error = %message, "ReAct run failed");
                if state.fail(&message) {
                    sink.on_phase_change(Phase::Error);
                }
                sink.on_error(&message);
                RunResult::failure(
                    message,
                    state.steps.clone(),
                    state.iteration,
                    state.total_tokens,
                )
            }
        };

        self.deactivate(ctx.id);
        sink.on_complete(&result);
        result
    }

    /// The loop proper. Returns the final answer; every `Err` ends the run.
    async fn drive(&self, ctx: &RunContext<'_>, state: &mut AgentState) -> Result<String> {
        loop {
            if ctx.cancel.is_cancelled() {
                warn!(run_id = ctx.id, iteration = state.iteration, "ReAct run cancelled");
                return Err(AgentError::Cancelled);
            }

            if !state.begin_iteration() {
                warn!(run_id = ctx.id, "ReAct: max iterations reached ({})", state.max_iterations);
                return Err(AgentError::MaxIterations(state.max_iterations));
            }

            debug!(run_id = ctx.id, iteration = state.iteration, "ReAct iteration");

            // ── Compact ──
            // `state.messages` stays the full history; the model sees the compacted view.
            let context = ctx
                .collaborators
                .compactor
                .compact(state.messages.clone())
                .await?;
            state.total_tokens = context.token_estimate;
            if context.messages.len() < state.messages.len() {
                debug!(
                    run_id = ctx.id,
                    full = state.messages.len(),
                    compacted = context.messages.len(),
                    "History compacted for model call"
                );
            }

            // ── Think ──
            let thinking = self.emit_step(ctx, state, self.recorder.thinking());

            let stream = ctx.config.enable_streaming.then(|| StreamBuffer::new(ctx.sink));
            let response = ctx
                .collaborators
                .model
                .call(
                    &context.messages,
                    &ctx.config.tools,
                    stream.as_ref().map(|s| s as &dyn ChunkSink),
                )
                .await
                .map_err(|e| {
                    if ctx.cancel.is_cancelled() {
                        AgentError::Cancelled
                    } else {
                        AgentError::Model(e)
                    }
                })?;

            if let Some(usage) = response.usage {
                debug!(
                    run_id = ctx.id,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    "Model usage"
                );
            }

            let thought = match stream {
                Some(buffer) if response.content.is_empty() => buffer.into_text(),
                _ => response.content,
            };
            state.fill_thought(thinking, &thought)?;
            ctx.sink.on_thought(&thought);

            let requests = response.tool_requests;
            state.push_message(Message::assistant_with_requests(
                thought.as_str(),
                requests.clone(),
            ));

            // ── Final answer ──
            if requests.is_empty() {
                self.set_phase(ctx, state, Phase::Completed)?;
                return Ok(thought);
            }

            // ── Act / Observe ──
            debug!(run_id = ctx.id, tool_count = requests.len(), "Executing tool requests");
            for (i, request) in requests.iter().enumerate() {
                if ctx.cancel.is_cancelled() {
                    warn!(run_id = ctx.id, skipped = requests.len() - i, "Cancelled before tool call");
                    return Err(AgentError::Cancelled);
                }
                self.act(ctx, state, request).await?;
            }

            state.total_tokens = token::estimate_messages_tokens(&state.messages);
            self.set_phase(ctx, state, Phase::Thinking)?;
        }
    }

    /// Execute one tool request: acting step, tool call, observing step,
    /// tool message.
    async fn act(
        &self,
        ctx: &RunContext<'_>,
        state: &mut AgentState,
        request: &ToolRequest,
    ) -> Result<()> {
        let input = request.parse_arguments();

        self.set_phase(ctx, state, Phase::Acting)?;
        let acting = self.recorder.acting(&request.name, &request.id, input.clone());
        let idx = self.emit_step(ctx, state, acting);
        let action = state.steps[idx]
            .action
            .clone()
            .ok_or_else(|| AgentError::Internal("acting step without action".into()))?;
        ctx.sink.on_action(&action);

        self.set_phase(ctx, state, Phase::Observing)?;
        let start = std::time::Instant::now();
        let observation = match ctx
            .collaborators
            .tools
            .execute(&request.name, Value::Object(input))
            .await
        {
            Ok(output) => {
                debug!(
                    tool = %request.name,
                    call_id = %request.id,
                    elapsed = ?start.elapsed(),
                    "Tool executed"
                );
                output
            }
            Err(e) => {
                warn!(tool = %request.name, call_id = %request.id, error = %e, "Tool execution failed");
                format!("Tool '{}' failed: {e}", request.name)
            }
        };

        self.emit_step(ctx, state, self.recorder.observing(action, observation.as_str()));
        ctx.sink.on_observation(&observation);
        state.push_message(Message::tool_result(&request.id, &request.name, observation));
        Ok(())
    }

    /// Record `step`, report it, and return its index.
    fn emit_step(&self, ctx: &RunContext<'_>, state: &mut AgentState, step: Step) -> usize {
        if ctx.config.verbose {
            info!(run_id = ctx.id, step_id = %step.id, phase = %step.phase, iteration = state.iteration, "Step recorded");
        } else {
            debug!(run_id = ctx.id, step_id = %step.id, phase = %step.phase, iteration = state.iteration, "Step recorded");
        }
        let idx = state.record(step);
        ctx.sink.on_step(&state.steps[idx]);
        self.publish(ctx.id, state);
        idx
    }

    /// Transition and, when the phase changed, report it.
    fn set_phase(&self, ctx: &RunContext<'_>, state: &mut AgentState, phase: Phase) -> Result<()> {
        if state.transition(phase)? {
            ctx.sink.on_phase_change(phase);
            self.publish(ctx.id, state);
        }
        Ok(())
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn activate(&self, cancel: &CancelHandle, state: &AgentState) -> u64 {
        let id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let mut active = self.lock_active();
        if let Some(previous) = active.as_ref() {
            warn!(previous = previous.id, run_id = id, "Starting a run while another is active");
        }
        *active = Some(ActiveRun {
            id,
            cancel: cancel.clone(),
            state: state.clone(),
        });
        id
    }

    /// Mirror the run's state into the engine so `state()` can see it.
    fn publish(&self, id: u64, state: &AgentState) {
        let mut active = self.lock_active();
        if let Some(run) = active.as_mut().filter(|run| run.id == id) {
            let running = state.running && !run.cancel.is_cancelled();
            run.state = state.clone();
            run.state.running = running;
        }
    }

    fn deactivate(&self, id: u64) {
        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|run| run.id == id) {
            *active = None;
        }
    }
}

impl Default for ReactEngine {
    fn default() -> Self {
        Self::new(LoopConfig::default())
    }
}
