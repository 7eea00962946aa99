#![deny(missing_docs)]
//! Task state: the mutable record the graph executor owns exclusively.
//!
//! Nodes never see `TaskState` directly — they receive an immutable view
//! and return a [`StateDelta`]; only the executor merges a delta back in,
//! via [`StateDelta::apply`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role tag on a state message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Original task input.
    User,
    /// Model output.
    Assistant,
    /// Tool result fed back into context.
    Tool,
    /// System/instruction content.
    System,
}

/// A tool call the model requested, carried on an `assistant` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDescriptor {
    /// Id correlating this call to its eventual `tool` message.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Arguments as passed to the tool.
    pub arguments: serde_json::Value,
}

/// One entry in `TaskState::messages`.
///
/// `messages` is append-only: no entry is ever deleted or edited once
/// merged into state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    /// Role tag.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
    /// Present on `assistant` messages that requested tool calls.
    pub tool_calls: Vec<ToolCallDescriptor>,
    /// Present on `tool` messages; must match a prior `assistant` call id.
    pub tool_call_id: Option<String>,
}

impl StateMessage {
    /// Build a plain user/assistant/system message with no tool-call
    /// descriptors.
    pub fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Build an assistant message carrying tool-call descriptors.
    pub fn assistant_tool_calls(calls: Vec<ToolCallDescriptor>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: String::new(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// Build a tool-result message answering a prior call id.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A bibliographic reference produced by the `literature` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Title of the source.
    pub title: String,
    /// Author list, as given by the source.
    pub authors: Vec<String>,
    /// Publication year, if known.
    pub year: Option<u32>,
    /// Source identifier (DOI, PMID, URL — opaque to the core).
    pub source: String,
}

/// Statistical analysis output produced by the `stats` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Prose summary of the analysis.
    pub summary: String,
    /// Named figures/tables produced (opaque references, not rendered here).
    pub figures: Vec<String>,
}

/// Compliance verdict produced by the `compliance` stage; drives the
/// revision loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Whether the writer must revise and resubmit.
    pub needs_revision: bool,
    /// Named items that failed review, if any.
    pub failed_items: Vec<String>,
    /// Overall compliance score in `[0.0, 1.0]`.
    pub score: f64,
}

/// A typed artifact payload. Keys are workflow-specific strings
/// (`references`, `stats_report`, `manuscript_sections`,
/// `compliance_report`); the variant set is closed per those known keys,
/// with `Json` as an escape hatch for anything else a node writes.
// Adjacently tagged, not internally tagged: `References`/`Json` wrap a
// `Vec`/bare `Value` respectively, neither of which can carry a merged-in
// "kind" field the way a struct variant can.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ArtifactValue {
    /// `references` — literature search results.
    References(Vec<Reference>),
    /// `stats_report` — statistical analysis output.
    StatsReport(StatsReport),
    /// `manuscript_sections` — section name to prose body.
    ManuscriptSections(HashMap<String, String>),
    /// `compliance_report` — the latest compliance verdict.
    ComplianceReport(ComplianceReport),
    /// Anything not covered by the named variants above.
    Json(serde_json::Value),
}

/// Per-step error descriptor recorded in `TaskState::errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepError {
    /// Node that produced the error.
    pub node: String,
    /// Human-readable detail.
    pub message: String,
}

/// The mutable record associated with one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    /// Append-only ordered message log.
    pub messages: Vec<StateMessage>,
    /// Artifact name to typed payload.
    pub artifacts: HashMap<String, ArtifactValue>,
    /// Name of the last-executed node, or `"start"` before any node runs.
    pub current_step: String,
    /// Routing target chosen by a node or the router; cleared once consumed.
    pub next_agent: Option<String>,
    /// Revision loopback count so far (paper workflow only).
    pub revision_round: u32,
    /// Upper bound on `revision_round`.
    pub max_revisions: u32,
    /// Accumulated per-step error descriptors.
    pub errors: Vec<StepError>,
}

/// Sentinel `next_agent`/routing value meaning "terminate".
pub const END: &str = "END";

/// Sentinel `current_step` value before any node has executed.
pub const START: &str = "start";

impl TaskState {
    /// Build a fresh state for a task, with bounded revisions and an empty
    /// message/artifact set.
    pub fn new(max_revisions: u32) -> Self {
        Self {
            messages: Vec::new(),
            artifacts: HashMap::new(),
            current_step: START.to_string(),
            next_agent: None,
            revision_round: 0,
            max_revisions,
            errors: Vec::new(),
        }
    }

    /// Seed state with an initial user message.
    pub fn with_initial_message(max_revisions: u32, input: impl Into<String>) -> Self {
        let mut state = Self::new(max_revisions);
        state
            .messages
            .push(StateMessage::text(MessageRole::User, input));
        state
    }

    /// Whether the router should treat this task as terminal.
    pub fn is_terminal(&self) -> bool {
        self.next_agent.as_deref() == Some(END)
    }

    /// Validate the invariants that must hold at every observation point:
    /// every `tool` message answers a prior `assistant` tool-call id, and
    /// `revision_round` never exceeds `max_revisions`.
    pub fn validate_invariants(&self) -> Result<(), String> {
        if self.revision_round > self.max_revisions {
            return Err(format!(
                "revision_round {} exceeds max_revisions {}",
                self.revision_round, self.max_revisions
            ));
        }
        let mut known_ids: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for message in &self.messages {
            for call in &message.tool_calls {
                known_ids.insert(call.id.as_str());
            }
            if message.role == MessageRole::Tool {
                match &message.tool_call_id {
                    Some(id) if known_ids.contains(id.as_str()) => {}
                    Some(id) => return Err(format!("orphan tool message for call id {id}")),
                    None => return Err("tool message missing tool_call_id".to_string()),
                }
            }
        }
        Ok(())
    }
}

/// What a node returns after one invocation: never a full state, only the
/// portion it changed. The executor applies it via [`StateDelta::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    /// Messages to append, in emission order.
    pub new_messages: Vec<StateMessage>,
    /// Artifact keys to overwrite; keys absent here are left untouched.
    pub artifacts: HashMap<String, ArtifactValue>,
    /// Routing target the node suggests, if any.
    pub next_agent: Option<String>,
    /// Error descriptor, if the node's invocation failed or was partial.
    pub error: Option<String>,
}

impl StateDelta {
    /// Merge this delta into `state` as if produced by `node_name`:
    /// appends messages, overwrites named artifact keys, sets
    /// `current_step`, sets (or clears) `next_agent`, and appends any
    /// error. `revision_round` is untouched — only the revision controller
    /// updates it.
    pub fn apply(self, state: &mut TaskState, node_name: &str) {
        state.messages.extend(self.new_messages);
        for (key, value) in self.artifacts {
            state.artifacts.insert(key, value);
        }
        state.current_step = node_name.to_string();
        state.next_agent = self.next_agent;
        if let Some(message) = self.error {
            state.errors.push(StepError {
                node: node_name.to_string(),
                message,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_at_sentinel_step() {
        let state = TaskState::new(3);
        assert_eq!(state.current_step, START);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn with_initial_message_seeds_one_user_message() {
        let state = TaskState::with_initial_message(3, "hello");
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, MessageRole::User);
    }

    #[test]
    fn delta_apply_appends_messages_and_sets_current_step() {
        let mut state = TaskState::new(3);
        let delta = StateDelta {
            new_messages: vec![StateMessage::text(MessageRole::Assistant, "hi")],
            ..Default::default()
        };
        delta.apply(&mut state, "utility");
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.current_step, "utility");
    }

    #[test]
    fn delta_apply_overwrites_named_artifacts_and_preserves_others() {
        let mut state = TaskState::new(3);
        state.artifacts.insert(
            "references".to_string(),
            ArtifactValue::References(vec![]),
        );
        state.artifacts.insert(
            "stats_report".to_string(),
            ArtifactValue::StatsReport(StatsReport {
                summary: "old".into(),
                figures: vec![],
            }),
        );
        let mut new_artifacts = HashMap::new();
        new_artifacts.insert(
            "stats_report".to_string(),
            ArtifactValue::StatsReport(StatsReport {
                summary: "new".into(),
                figures: vec![],
            }),
        );
        let delta = StateDelta {
            artifacts: new_artifacts,
            ..Default::default()
        };
        delta.apply(&mut state, "stats");
        assert!(state.artifacts.contains_key("references"));
        match &state.artifacts["stats_report"] {
            ArtifactValue::StatsReport(r) => assert_eq!(r.summary, "new"),
            other => panic!("unexpected artifact: {other:?}"),
        }
    }

    #[test]
    fn delta_apply_sets_next_agent() {
        let mut state = TaskState::new(3);
        let delta = StateDelta {
            next_agent: Some("writer".to_string()),
            ..Default::default()
        };
        delta.apply(&mut state, "literature");
        assert_eq!(state.next_agent.as_deref(), Some("writer"));
    }

    #[test]
    fn delta_apply_clears_next_agent_when_none() {
        let mut state = TaskState::new(3);
        state.next_agent = Some("stats".to_string());
        let delta = StateDelta::default();
        delta.apply(&mut state, "stats");
        assert_eq!(state.next_agent, None);
    }

    #[test]
    fn delta_apply_records_error() {
        let mut state = TaskState::new(3);
        let delta = StateDelta {
            error: Some("pubmed unreachable".to_string()),
            ..Default::default()
        };
        delta.apply(&mut state, "literature");
        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].node, "literature");
    }

    #[test]
    fn is_terminal_when_next_agent_is_end_sentinel() {
        let mut state = TaskState::new(3);
        state.next_agent = Some(END.to_string());
        assert!(state.is_terminal());
    }

    #[test]
    fn validate_invariants_rejects_orphan_tool_message() {
        let mut state = TaskState::new(3);
        state
            .messages
            .push(StateMessage::tool_result("call-1", "result"));
        assert!(state.validate_invariants().is_err());
    }

    #[test]
    fn validate_invariants_accepts_matched_tool_call() {
        let mut state = TaskState::new(3);
        state
            .messages
            .push(StateMessage::assistant_tool_calls(vec![ToolCallDescriptor {
                id: "call-1".into(),
                name: "lookup".into(),
                arguments: serde_json::json!({}),
            }]));
        state
            .messages
            .push(StateMessage::tool_result("call-1", "result"));
        assert!(state.validate_invariants().is_ok());
    }

    #[test]
    fn validate_invariants_rejects_revision_round_over_max() {
        let mut state = TaskState::new(1);
        state.revision_round = 2;
        assert!(state.validate_invariants().is_err());
    }

    #[test]
    fn artifact_value_round_trips_through_json() {
        let value = ArtifactValue::ComplianceReport(ComplianceReport {
            needs_revision: true,
            failed_items: vec!["citations".to_string()],
            score: 0.62,
        });
        let json = serde_json::to_value(&value).unwrap();
        let back: ArtifactValue = serde_json::from_value(json).unwrap();
        assert_eq!(value, back);
    }
}
