#![deny(missing_docs)]
//! Trace spans and atomic counters for the orchestration core.
//!
//! `TraceSink` doubles as a `layer0::Hook` (so it composes with guardrail
//! and redaction hooks through the same `HookRegistry` pipeline) and as a
//! direct collaborator the executor calls for node/tool-level spans and
//! counters that have no hook point of their own.

use async_trait::async_trait;
use layer0::hook::{Hook, HookAction, HookContext, HookPoint};
use layer0::error::HookError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ALL_POINTS: &[HookPoint] = &[
    HookPoint::PreInference,
    HookPoint::PostInference,
    HookPoint::PreToolUse,
    HookPoint::PostToolUse,
    HookPoint::ExitCheck,
];

/// Plain atomic counters, multi-writer safe without external locking.
#[derive(Debug, Default)]
struct Counters {
    tasks_created: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_cancelled: AtomicU64,
    revision_rounds: AtomicU64,
    hook_failures: AtomicU64,
    active_tasks: AtomicI64,
    active_streams: AtomicI64,
}

/// Per-task trace context. Carries the correlation id so span fields are
/// consistent across every record emitted for one task; holds no
/// behaviour of its own.
#[derive(Debug, Clone)]
pub struct TraceContext {
    /// Task id this context was opened for.
    pub task_id: String,
    /// Correlation id propagated to every A2A message for this task.
    pub correlation_id: String,
}

/// Trace & metrics sink (C2).
///
/// `detailed` gates whether full prompt/response text is recorded in
/// spans, or only a length and a non-cryptographic hash (content here is
/// not secret, so `DefaultHasher` is sufficient — this is for log
/// correlation, not integrity).
pub struct TraceSink {
    counters: Arc<Counters>,
    detailed: bool,
}

impl TraceSink {
    /// Build a sink. `detailed = false` redacts prompt/response bodies
    /// down to length + hash in emitted spans.
    pub fn new(detailed: bool) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            detailed,
        }
    }

    /// Open a trace context for a task, allocating its correlation id.
    pub fn new_trace(&self, task_id: &str, correlation_id: &str) -> TraceContext {
        self.counters.tasks_created.fetch_add(1, Ordering::Relaxed);
        self.counters.active_tasks.fetch_add(1, Ordering::Relaxed);
        tracing::info_span!("orchestration.task", task_id, correlation_id).in_scope(|| {
            tracing::info!("task opened");
        });
        TraceContext {
            task_id: task_id.to_string(),
            correlation_id: correlation_id.to_string(),
        }
    }

    /// Record an LLM call. `prompt`/`response` are redacted to length+hash
    /// unless `detailed` was set at construction.
    pub fn trace_llm_call(
        &self,
        ctx: &TraceContext,
        model: &str,
        prompt: &str,
        response: &str,
        latency: Duration,
    ) {
        let _span = tracing::info_span!(
            "orchestration.llm_call",
            task_id = %ctx.task_id,
            correlation_id = %ctx.correlation_id,
            model,
            latency_ms = latency.as_millis() as u64,
        )
        .entered();
        if self.detailed {
            tracing::info!(prompt, response, "llm call completed");
        } else {
            tracing::info!(
                prompt_len = prompt.len(),
                prompt_hash = hash_str(prompt),
                response_len = response.len(),
                response_hash = hash_str(response),
                "llm call completed"
            );
        }
    }

    /// Record a tool call, successful or not.
    pub fn trace_tool_call(
        &self,
        ctx: &TraceContext,
        tool_name: &str,
        args: &serde_json::Value,
        result: Result<&serde_json::Value, &str>,
        latency: Duration,
    ) {
        let _span = tracing::info_span!(
            "orchestration.tool_call",
            task_id = %ctx.task_id,
            correlation_id = %ctx.correlation_id,
            tool_name,
            latency_ms = latency.as_millis() as u64,
        )
        .entered();
        match result {
            Ok(value) => {
                if self.detailed {
                    tracing::info!(?args, ?value, "tool call ok");
                } else {
                    tracing::info!("tool call ok");
                }
            }
            Err(message) => tracing::warn!(message, "tool call failed"),
        }
    }

    /// Task creation counter (also bumped by `new_trace`).
    pub fn record_task_created(&self) {
        self.counters.tasks_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Task terminal-status counters; also decrements `active_tasks`.
    pub fn record_task_completed(&self, status: &str) {
        self.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
        match status {
            "completed" => self.counters.tasks_completed.fetch_add(1, Ordering::Relaxed),
            "cancelled" => self.counters.tasks_cancelled.fetch_add(1, Ordering::Relaxed),
            _ => self.counters.tasks_failed.fetch_add(1, Ordering::Relaxed),
        };
        tracing::info!(status, "task completed");
    }

    /// Per-(node,status) step duration.
    pub fn record_step_duration(&self, node: &str, status: &str, duration: Duration) {
        tracing::info!(node, status, duration_ms = duration.as_millis() as u64, "step complete");
    }

    /// Per-(agent,status) call counter.
    pub fn record_agent_call(&self, agent: &str, status: &str) {
        tracing::info!(agent, status, "agent call");
    }

    /// Per-(agent,tool,status) call counter.
    pub fn record_tool_call_counter(&self, agent: &str, tool: &str, status: &str) {
        tracing::info!(agent, tool, status, "tool call recorded");
    }

    /// Compliance score gauge (paper workflow).
    pub fn record_compliance_score(&self, score: f64) {
        tracing::info!(score, "compliance score");
    }

    /// Revision round counter (paper workflow).
    pub fn record_revision_round(&self) {
        self.counters.revision_rounds.fetch_add(1, Ordering::Relaxed);
        tracing::info!("revision round");
    }

    /// References-count gauge (paper workflow).
    pub fn record_references_count(&self, count: usize) {
        tracing::info!(count, "references count");
    }

    /// Manuscript word-count gauge (paper workflow).
    pub fn record_manuscript_word_count(&self, count: usize) {
        tracing::info!(count, "manuscript word count");
    }

    /// Increment the active-stream gauge; callers decrement on drain.
    pub fn stream_opened(&self) {
        self.counters.active_streams.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement the active-stream gauge.
    pub fn stream_closed(&self) {
        self.counters.active_streams.fetch_sub(1, Ordering::Relaxed);
    }

    /// Snapshot of current counter values, for tests and admin inspection.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            tasks_created: self.counters.tasks_created.load(Ordering::Relaxed),
            tasks_completed: self.counters.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.counters.tasks_failed.load(Ordering::Relaxed),
            tasks_cancelled: self.counters.tasks_cancelled.load(Ordering::Relaxed),
            revision_rounds: self.counters.revision_rounds.load(Ordering::Relaxed),
            hook_failures: self.counters.hook_failures.load(Ordering::Relaxed),
            active_tasks: self.counters.active_tasks.load(Ordering::Relaxed),
            active_streams: self.counters.active_streams.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`TraceSink`]'s counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Total tasks created.
    pub tasks_created: u64,
    /// Total tasks that reached `completed`.
    pub tasks_completed: u64,
    /// Total tasks that reached `failed`.
    pub tasks_failed: u64,
    /// Total tasks that reached `cancelled`.
    pub tasks_cancelled: u64,
    /// Total revision-loop rounds taken across all paper tasks.
    pub revision_rounds: u64,
    /// Total hook dispatch errors swallowed.
    pub hook_failures: u64,
    /// Currently in-flight tasks.
    pub active_tasks: i64,
    /// Currently open streams.
    pub active_streams: i64,
}

fn hash_str(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl Hook for TraceSink {
    fn points(&self) -> &[HookPoint] {
        ALL_POINTS
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        match ctx.point {
            HookPoint::PreInference => {
                tracing::debug!(turns = ctx.turns_completed, "pre-inference");
            }
            HookPoint::PostInference => {
                tracing::info!(
                    tokens_used = ctx.tokens_used,
                    cost = %ctx.cost,
                    "post-inference"
                );
            }
            HookPoint::PreToolUse => {
                tracing::debug!(tool = ?ctx.tool_name, "pre-tool-use");
            }
            HookPoint::PostToolUse => {
                tracing::info!(tool = ?ctx.tool_name, "post-tool-use");
            }
            HookPoint::ExitCheck => {
                tracing::debug!(elapsed = %ctx.elapsed, "exit-check");
            }
        }
        Ok(HookAction::Continue)
    }
}
