#![deny(missing_docs)]
//! Graph Executor (C7): drives the Router -> Node -> Router loop, enforces
//! step and consecutive-failure budgets, persists A2A messages, and emits
//! an ordered stream of typed chunks. [`revision_controller`] (C8) and
//! [`stream`] (C9) live alongside it as the two collaborators it drives
//! directly.

mod revision_controller;
pub mod store;
pub mod stream;

pub use revision_controller::advance as revision_advance;
pub use store::{A2aStore, StateBackedA2aStore, StoreError};
pub use stream::Chunk;

use async_trait::async_trait;
use meridian_a2a::{request, response, A2aMetrics, ErrorKind, Status, TypedError, SUPERVISOR};
use meridian_router::Router;
use meridian_state::{StateDelta, TaskState, END};
use meridian_trace::TraceSink;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Which workflow's node registry and router are in play. Determines
/// whether the revision controller is consulted after each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    /// Supervisor routing to `learning` / `productivity` / `utility`.
    Chat,
    /// Staged `literature -> stats -> writer -> compliance` pipeline.
    Paper,
}

/// What one node invocation produced: a state delta plus the A2A leg's
/// outcome fields. The executor builds the full `A2aMessage` (id,
/// timestamps, correlation id) around this.
#[derive(Debug, Clone)]
pub struct NodeOutcome {
    /// Delta to merge into task state.
    pub delta: StateDelta,
    /// Outcome status for the A2A response leg.
    pub status: Status,
    /// Typed error, present iff `status` is error-like.
    pub error: Option<TypedError>,
    /// Opaque output payload to attach to the A2A response, for
    /// persistence/inspection.
    pub output: Option<serde_json::Value>,
}

/// A single addressable step in the orchestration graph.
///
/// Agent-node implementations (`meridian-chat-agents`, `meridian-paper-agents`)
/// adapt a `layer0::Operator`-based ReAct loop to this graph-level contract:
/// `Operator` governs one node's internal reasoning loop, `Node` is what the
/// executor dispatches to and merges a delta back from.
#[async_trait]
pub trait Node: Send + Sync {
    /// Run this node against an immutable view of task state.
    async fn invoke(&self, state: &TaskState, correlation_id: &str) -> NodeOutcome;
}

/// Name-keyed collection of nodes for one workflow.
pub type NodeRegistry = HashMap<String, Arc<dyn Node>>;

/// Errors the executor itself can surface (distinct from a node's own
/// `NodeOutcome::error`, which is expected, recoverable-or-not domain
/// failure).
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The router selected a name with no registered node.
    #[error("no node registered for {0:?}")]
    UnknownNode(String),
}

/// Terminal status of one executor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    /// Router reached `END`, or idempotent resume found nothing to do.
    Completed,
    /// Step budget or consecutive-failure bound exhausted, or an unknown
    /// node was selected.
    Failed,
    /// Cancellation was observed.
    Cancelled,
}

impl TerminalStatus {
    fn as_str(self) -> &'static str {
        match self {
            TerminalStatus::Completed => "completed",
            TerminalStatus::Failed => "failed",
            TerminalStatus::Cancelled => "cancelled",
        }
    }
}

/// Final state and status of one `run()` invocation.
#[derive(Debug, Clone)]
pub struct ExecutorOutcome {
    /// Task state at termination.
    pub state: TaskState,
    /// Why the run terminated.
    pub status: TerminalStatus,
}

/// Tunables bounding one task's execution. Defaults match the design's
/// concurrency & resource model.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Upper bound on total node invocations per task.
    pub step_budget: u32,
    /// Terminate after this many consecutive failing node invocations.
    pub consecutive_failure_bound: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_budget: 40,
            consecutive_failure_bound: 3,
        }
    }
}

/// The graph executor (C7).
pub struct Executor {
    nodes: NodeRegistry,
    router: Arc<dyn Router>,
    store: Arc<dyn A2aStore>,
    trace: Arc<TraceSink>,
    config: ExecutorConfig,
}

fn intent_for(node_name: &str) -> &'static str {
    match node_name {
        "literature" => "search_literature",
        "stats" => "analyze_stats",
        "writer" => "write_section",
        "compliance" => "check_compliance",
        "learning" => "save_learning",
        "productivity" => "manage_task",
        "utility" => "handle_request",
        _ => "invoke_agent",
    }
}

fn is_error_status(status: Status) -> bool {
    !matches!(status, Status::Ok | Status::Partial)
}

impl Executor {
    /// Assemble an executor from its collaborators.
    pub fn new(
        nodes: NodeRegistry,
        router: Arc<dyn Router>,
        store: Arc<dyn A2aStore>,
        trace: Arc<TraceSink>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            nodes,
            router,
            store,
            trace,
            config,
        }
    }

    /// Synchronous entry point: drives the loop to a terminal state and
    /// returns the final state.
    pub async fn run(
        &self,
        task_id: &str,
        workflow: WorkflowKind,
        state: TaskState,
        cancellation: CancellationToken,
    ) -> ExecutorOutcome {
        self.run_inner(task_id, workflow, state, cancellation, None)
            .await
    }

    /// Streaming entry point: returns immediately with a bounded receiver
    /// of ordered chunks; the loop runs in a background task. `self` must
    /// be wrapped in `Arc` since the loop outlives this call.
    pub fn stream(
        self: Arc<Self>,
        task_id: String,
        workflow: WorkflowKind,
        state: TaskState,
        cancellation: CancellationToken,
    ) -> mpsc::Receiver<Chunk> {
        let (tx, rx) = mpsc::channel(stream::CHANNEL_DEPTH);
        self.trace.stream_opened();
        let trace = self.trace.clone();
        tokio::spawn(async move {
            let _ = self
                .run_inner(&task_id, workflow, state, cancellation, Some(tx))
                .await;
            trace.stream_closed();
        });
        rx
    }

    async fn run_inner(
        &self,
        task_id: &str,
        workflow: WorkflowKind,
        mut state: TaskState,
        cancellation: CancellationToken,
        chunk_tx: Option<mpsc::Sender<Chunk>>,
    ) -> ExecutorOutcome {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        self.trace.new_trace(task_id, &correlation_id);

        if let Some(tx) = &chunk_tx {
            let _ = tx
                .send(Chunk::Start {
                    task_id: task_id.to_string(),
                    correlation_id: correlation_id.clone(),
                })
                .await;
        }

        let mut steps: u32 = 0;
        let mut consecutive_failures: u32 = 0;

        let status = loop {
            if cancellation.is_cancelled() {
                break TerminalStatus::Cancelled;
            }

            let next = self.router.next(&state).await;
            if next == END {
                break TerminalStatus::Completed;
            }
            if steps >= self.config.step_budget {
                break TerminalStatus::Failed;
            }

            let Some(node) = self.nodes.get(&next).cloned() else {
                tracing::warn!(node = %next, "executor: unknown node selected by router");
                break TerminalStatus::Failed;
            };

            let req = request(
                SUPERVISOR,
                &next,
                intent_for(&next),
                serde_json::to_value(&state).unwrap_or(serde_json::Value::Null),
                Some(correlation_id.clone()),
            );

            let start = Instant::now();
            let outcome = tokio::select! {
                _ = cancellation.cancelled() => None,
                outcome = node.invoke(&state, &correlation_id) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                break TerminalStatus::Cancelled;
            };
            let duration = start.elapsed();

            let metrics = A2aMetrics::from_duration(duration, 0);
            let resp = response(
                &req,
                outcome.status,
                outcome.output.clone(),
                outcome.error.clone(),
                Some(metrics),
            );

            if let Err(e) = self.store.write(task_id, &resp).await {
                tracing::warn!(error = %e, "executor: a2a persistence failed, continuing");
            }

            let artifact_summary: Vec<String> = outcome.delta.artifacts.keys().cloned().collect();
            self.trace
                .record_step_duration(&next, status_label(outcome.status), duration);
            self.trace.record_agent_call(&next, status_label(outcome.status));

            outcome.delta.apply(&mut state, &next);
            steps += 1;

            if let Some(tx) = &chunk_tx {
                let _ = tx
                    .send(Chunk::Data {
                        node: next.clone(),
                        artifact_summary: serde_json::json!({ "keys": artifact_summary }),
                    })
                    .await;
            }

            if is_error_status(outcome.status) {
                let retryable = outcome
                    .error
                    .as_ref()
                    .map(|e| e.retryable)
                    .unwrap_or(false);
                if let Some(err) = &outcome.error {
                    if let Some(tx) = &chunk_tx {
                        let _ = tx
                            .send(Chunk::Error {
                                kind: format!("{:?}", err.kind),
                                message: err.message.clone(),
                            })
                            .await;
                    }
                }
                // A non-retryable escape ends the task immediately; only
                // retryable failures (e.g. repeated timeouts) accumulate
                // against the consecutive-failure bound below.
                if !retryable {
                    break TerminalStatus::Failed;
                }
                consecutive_failures += 1;
            } else {
                consecutive_failures = 0;
            }

            if consecutive_failures >= self.config.consecutive_failure_bound {
                break TerminalStatus::Failed;
            }

            // Consult the revision controller after every paper-workflow
            // step, per distilled step 2i. `advance` is idempotent across
            // repeat calls: it only acts on a `compliance_report` artifact,
            // and clears that artifact itself when it loops back, so it
            // can't re-fire on the steps between one `compliance` run and
            // the next.
            if workflow == WorkflowKind::Paper {
                revision_controller::advance(&mut state);
            }
        };

        self.trace.record_task_completed(status.as_str());
        if let Some(tx) = &chunk_tx {
            let _ = tx
                .send(Chunk::Done {
                    status: status.as_str().to_string(),
                })
                .await;
        }

        ExecutorOutcome { state, status }
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Ok => "ok",
        Status::Partial => "partial",
        Status::Error => "error",
        Status::Timeout => "timeout",
        Status::ValidationError => "validation_error",
        Status::ToolError => "tool_error",
    }
}
