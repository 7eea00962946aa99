//! Adapts a `layer0::Operator` (the ReAct agent node, C4) to the graph
//! executor's [`meridian_executor::Node`] contract (C7). `Operator`
//! governs one node's internal reasoning loop; `Node` is what the
//! executor dispatches to and merges a [`meridian_state::StateDelta`]
//! back from.

use async_trait::async_trait;
use layer0::content::Content;
use layer0::error::{OperatorError, StateError};
use layer0::id::SessionId;
use layer0::operator::{ExitReason, Operator, OperatorConfig, OperatorInput, TriggerType};
use layer0::scope::Scope;
use layer0::state::{SearchResult, StateReader};
use meridian_a2a::{ErrorKind, Status, TypedError};
use meridian_executor::{Node, NodeOutcome};
use meridian_state::{MessageRole, StateDelta, StateMessage, TaskState};
use meridian_turn::types::{ContentPart, ProviderMessage, Role};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-call conversation history, keyed by an ephemeral session id (one
/// per node invocation). `Operator::execute` reads history through this
/// during context assembly; the graph executor itself owns the durable
/// record (the A2A log and `TaskState`), so entries here live only for
/// the duration of one `invoke` call.
pub struct HistoryStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl HistoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn put(&self, session: &str, messages: &[ProviderMessage]) {
        let value = serde_json::to_value(messages).unwrap_or(serde_json::Value::Null);
        self.entries.lock().unwrap().insert(session.to_string(), value);
    }

    fn take(&self, session: &str) {
        self.entries.lock().unwrap().remove(session);
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

const SESSION_PREFIX: &str = "session:";

#[async_trait]
impl StateReader for HistoryStore {
    async fn read(
        &self,
        scope: &Scope,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StateError> {
        if key != "messages" {
            return Ok(None);
        }
        let Scope::Custom(raw) = scope else {
            return Ok(None);
        };
        let Some(session) = raw.strip_prefix(SESSION_PREFIX) else {
            return Ok(None);
        };
        Ok(self.entries.lock().unwrap().get(session).cloned())
    }

    async fn list(&self, _scope: &Scope, _prefix: &str) -> Result<Vec<String>, StateError> {
        Ok(Vec::new())
    }

    async fn search(
        &self,
        _scope: &Scope,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<SearchResult>, StateError> {
        Ok(Vec::new())
    }
}

/// Converts a `TaskState` message log into the provider's internal
/// message shape. Tool results have no dedicated provider role, so (as
/// `meridian-op-react`'s own loop does) they ride in as a user-role
/// message carrying `ToolResult` parts.
pub fn state_messages_to_provider(messages: &[StateMessage]) -> Vec<ProviderMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            MessageRole::System => ProviderMessage {
                role: Role::System,
                content: vec![ContentPart::Text {
                    text: m.content.clone(),
                }],
            },
            MessageRole::User => ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::Text {
                    text: m.content.clone(),
                }],
            },
            MessageRole::Tool => ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::ToolResult {
                    tool_use_id: m.tool_call_id.clone().unwrap_or_default(),
                    content: m.content.clone(),
                    is_error: false,
                }],
            },
            MessageRole::Assistant => {
                let mut parts = Vec::new();
                if !m.content.is_empty() {
                    parts.push(ContentPart::Text {
                        text: m.content.clone(),
                    });
                }
                for call in &m.tool_calls {
                    parts.push(ContentPart::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.arguments.clone(),
                    });
                }
                ProviderMessage {
                    role: Role::Assistant,
                    content: parts,
                }
            }
        })
        .collect()
}

fn content_text(content: &Content) -> String {
    match content {
        Content::Text(t) => t.clone(),
        Content::Blocks(blocks) => {
            let parts: Vec<&str> = blocks
                .iter()
                .filter_map(|b| match b {
                    layer0::content::ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            parts.join("\n")
        }
        _ => String::new(),
    }
}

fn exit_reason_to_status(reason: &ExitReason) -> (Status, Option<TypedError>) {
    match reason {
        ExitReason::Complete => (Status::Ok, None),
        ExitReason::ObserverHalt { reason } => (
            Status::Partial,
            Some(TypedError::with_retryable(ErrorKind::Unknown, reason.clone(), false)),
        ),
        ExitReason::MaxTurns | ExitReason::BudgetExhausted | ExitReason::CircuitBreaker => (
            Status::Timeout,
            Some(TypedError::new(ErrorKind::Timeout, format!("{reason:?}"))),
        ),
        ExitReason::Timeout => (
            Status::Timeout,
            Some(TypedError::new(ErrorKind::Timeout, "operator wall-clock timeout")),
        ),
        ExitReason::Error => (
            Status::Error,
            Some(TypedError::with_retryable(ErrorKind::Unknown, "operator execution error", false)),
        ),
        ExitReason::Custom(label) => (
            Status::Error,
            Some(TypedError::with_retryable(ErrorKind::Unknown, label.clone(), false)),
        ),
    }
}

fn operator_error_to_status(err: &OperatorError) -> (Status, TypedError) {
    match err {
        OperatorError::Model(msg) => (
            Status::Error,
            TypedError::with_retryable(ErrorKind::LlmError, msg.clone(), false),
        ),
        OperatorError::Tool { tool, message } => (
            Status::ToolError,
            TypedError::with_retryable(ErrorKind::ToolError, format!("{tool}: {message}"), false),
        ),
        OperatorError::ContextAssembly(msg) => (
            Status::Error,
            TypedError::with_retryable(ErrorKind::Unknown, msg.clone(), false),
        ),
        OperatorError::Retryable(msg) => (
            Status::Timeout,
            TypedError::with_retryable(ErrorKind::Timeout, msg.clone(), true),
        ),
        OperatorError::NonRetryable(msg) => (
            Status::Error,
            TypedError::with_retryable(ErrorKind::Unknown, msg.clone(), false),
        ),
        OperatorError::Other(msg) => (
            Status::Error,
            TypedError::with_retryable(ErrorKind::Unknown, msg.to_string(), false),
        ),
    }
}

/// Adapts one `Operator` into a graph-executor `Node`: runs the wrapped
/// ReAct loop, then translates `OperatorOutput` into a `StateDelta`,
/// converting untyped JSON artifacts into the typed `ArtifactValue` the
/// rest of the system (revision controller, router artifact checks)
/// consumes via [`crate::tools::to_artifact_value`].
pub struct OperatorNode<O: Operator> {
    operator: O,
    history: Arc<HistoryStore>,
    default_max_turns: u32,
}

impl<O: Operator> OperatorNode<O> {
    /// Wrap an operator together with the same `HistoryStore` it was built
    /// with as its `StateReader` (so writes made here are visible to the
    /// operator's own context assembly). `default_max_turns` overrides the
    /// agent node's step budget (spec default: 8 tool-call rounds).
    pub fn new(operator: O, history: Arc<HistoryStore>, default_max_turns: u32) -> Self {
        Self {
            operator,
            history,
            default_max_turns,
        }
    }
}

#[async_trait]
impl<O: Operator> Node for OperatorNode<O> {
    async fn invoke(&self, state: &TaskState, correlation_id: &str) -> NodeOutcome {
        let last_user = state
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let history = state_messages_to_provider(&state.messages);
        self.history.put(correlation_id, &history);

        let input = OperatorInput {
            message: Content::Text(last_user),
            trigger: TriggerType::Task,
            session: Some(SessionId::new(correlation_id)),
            config: Some(OperatorConfig {
                max_turns: Some(self.default_max_turns),
                ..Default::default()
            }),
            metadata: serde_json::Value::Null,
        };

        let result = self.operator.execute(input).await;
        self.history.take(correlation_id);

        match result {
            Ok(output) => {
                let (status, error) = exit_reason_to_status(&output.exit_reason);
                let message_text = content_text(&output.message);
                let mut delta = StateDelta {
                    new_messages: vec![StateMessage::text(MessageRole::Assistant, message_text)],
                    next_agent: output.next_agent.clone(),
                    error: error.as_ref().map(|e| e.message.clone()),
                    ..Default::default()
                };
                for (key, value) in output.artifacts {
                    let artifact = crate::tools::to_artifact_value(&key, value);
                    delta.artifacts.insert(key, artifact);
                }
                NodeOutcome {
                    delta,
                    status,
                    error,
                    output: serde_json::to_value(&output.metadata).ok(),
                }
            }
            Err(err) => {
                let (status, typed) = operator_error_to_status(&err);
                NodeOutcome {
                    delta: StateDelta {
                        error: Some(typed.message.clone()),
                        ..Default::default()
                    },
                    status,
                    error: Some(typed),
                    output: None,
                }
            }
        }
    }
}
