#![deny(missing_docs)]
//! Supervisor router (C6): decides the next node from current state.
//!
//! Two strategies share the [`Router`] trait: [`ChatRouter`] (LLM-classified
//! domain routing with loop protection) and [`PaperRouter`] (fixed staged
//! progression keyed on artifact presence).

use async_trait::async_trait;
use meridian_state::{ArtifactValue, TaskState, END};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

/// Decides the next node (or [`meridian_state::END`]) from current state.
#[async_trait]
pub trait Router: Send + Sync {
    /// Compute the next routing target.
    async fn next(&self, state: &TaskState) -> String;
}

/// The three chat sub-agent domains a user message can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatDomain {
    /// Saving/recalling facts the user wants remembered.
    Learning,
    /// Task/reminder/scheduling style requests.
    Productivity,
    /// Anything else — the default fallback domain.
    Utility,
}

impl ChatDomain {
    fn as_node_name(self) -> &'static str {
        match self {
            ChatDomain::Learning => "learning",
            ChatDomain::Productivity => "productivity",
            ChatDomain::Utility => "utility",
        }
    }
}

/// Classifies a user message into a [`ChatDomain`].
///
/// Grounded on a short, structured LLM call in the full system; this
/// crate treats it as an injected collaborator so routing logic stays
/// independent of any particular model provider. Implementations should
/// return `None` on anything the classifier can't confidently place —
/// the router defaults unparseable classifications to `Utility`.
#[async_trait]
pub trait ChatClassifier: Send + Sync {
    /// Classify the given message text.
    async fn classify(&self, message: &str) -> Option<ChatDomain>;
}

/// Router for the `chat` workflow: classifies the latest user message into
/// one of three sub-agent domains, with loop protection.
pub struct ChatRouter {
    classifier: std::sync::Arc<dyn ChatClassifier>,
    sub_agents: [&'static str; 3],
    seen_message_hashes: Mutex<HashMap<u64, u32>>,
}

impl ChatRouter {
    /// Build a router around the given classifier collaborator.
    pub fn new(classifier: std::sync::Arc<dyn ChatClassifier>) -> Self {
        Self {
            classifier,
            sub_agents: ["learning", "productivity", "utility"],
            seen_message_hashes: Mutex::new(HashMap::new()),
        }
    }

    fn last_user_message(state: &TaskState) -> Option<&str> {
        state
            .messages
            .iter()
            .rev()
            .find(|m| m.role == meridian_state::MessageRole::User)
            .map(|m| m.content.as_str())
    }

    fn hash_message(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }
}

#[async_trait]
impl Router for ChatRouter {
    async fn next(&self, state: &TaskState) -> String {
        // Rule 1: the last message is a tool-call-free assistant turn from
        // a sub-agent that already ran — the conversation is answered.
        if let Some(last) = state.messages.last() {
            if last.role == meridian_state::MessageRole::Assistant
                && last.tool_calls.is_empty()
                && self.sub_agents.contains(&state.current_step.as_str())
            {
                return END.to_string();
            }
        }

        let Some(user_message) = Self::last_user_message(state) else {
            return END.to_string();
        };

        // Rule 4: force END once the same message has already been routed
        // against twice, to prevent routing loops.
        let hash = Self::hash_message(user_message);
        let count = {
            let mut seen = self.seen_message_hashes.lock().unwrap();
            let entry = seen.entry(hash).or_insert(0);
            *entry += 1;
            *entry
        };
        if count > 2 {
            return END.to_string();
        }

        let domain = self
            .classifier
            .classify(user_message)
            .await
            .unwrap_or(ChatDomain::Utility);
        domain.as_node_name().to_string()
    }
}

const PAPER_STAGES: [(&str, &str); 4] = [
    ("literature", "references"),
    ("stats", "stats_report"),
    ("writer", "manuscript_sections"),
    ("compliance", "compliance_report"),
];

/// Minimum reference count required before `literature` is considered
/// sufficient; below this the stage is retried once with an enlarged
/// query budget, tracked by `PaperRouter` itself.
pub const MIN_REFERENCES: usize = 10;

/// Router for the `paper` workflow: fixed staged progression
/// (`literature → stats → writer → compliance`), driven by which
/// artifact is already present and non-empty. Tracks one thing besides
/// state: whether it has already retried an under-count `literature`
/// pass, so that retry only ever fires once.
#[derive(Debug)]
pub struct PaperRouter {
    literature_retried: Mutex<bool>,
}

impl Default for PaperRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperRouter {
    /// Build a paper router.
    pub fn new() -> Self {
        Self {
            literature_retried: Mutex::new(false),
        }
    }

    fn artifact_present(state: &TaskState, key: &str) -> bool {
        match state.artifacts.get(key) {
            None => false,
            Some(ArtifactValue::References(refs)) => !refs.is_empty(),
            Some(ArtifactValue::ManuscriptSections(sections)) => !sections.is_empty(),
            Some(ArtifactValue::StatsReport(_)) => true,
            Some(ArtifactValue::ComplianceReport(_)) => true,
            Some(ArtifactValue::Json(value)) => !value.is_null(),
        }
    }
}

#[async_trait]
impl Router for PaperRouter {
    async fn next(&self, state: &TaskState) -> String {
        // A node (or the revision controller) may have already suggested
        // a target for this round; the router only fills in the gap.
        if let Some(target) = &state.next_agent {
            return target.clone();
        }

        // Edge case: `literature` finished but came in under the minimum
        // reference count. Retry it once with the same node (its own
        // system prompt is what enlarges the query budget); accept
        // whatever it returns on the second pass rather than retrying
        // forever.
        if let Some(ArtifactValue::References(refs)) = state.artifacts.get("references") {
            if refs.len() < MIN_REFERENCES {
                let mut retried = self.literature_retried.lock().unwrap();
                if !*retried {
                    *retried = true;
                    return "literature".to_string();
                }
            }
        }

        for (node, artifact_key) in PAPER_STAGES {
            if !Self::artifact_present(state, artifact_key) {
                return node.to_string();
            }
        }
        END.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::{MessageRole, StateMessage};
    use std::sync::Arc;

    struct FixedClassifier(Option<ChatDomain>);

    #[async_trait]
    impl ChatClassifier for FixedClassifier {
        async fn classify(&self, _message: &str) -> Option<ChatDomain> {
            self.0
        }
    }

    fn state_with_user_message(text: &str) -> TaskState {
        TaskState::with_initial_message(3, text)
    }

    fn ten_references() -> Vec<meridian_state::Reference> {
        (0..MIN_REFERENCES)
            .map(|i| meridian_state::Reference {
                title: format!("t{i}"),
                authors: vec![],
                year: None,
                source: format!("s{i}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn chat_router_routes_to_classified_domain() {
        let router = ChatRouter::new(Arc::new(FixedClassifier(Some(ChatDomain::Learning))));
        let state = state_with_user_message("remember this word");
        assert_eq!(router.next(&state).await, "learning");
    }

    #[tokio::test]
    async fn chat_router_defaults_to_utility_on_unclassifiable_input() {
        let router = ChatRouter::new(Arc::new(FixedClassifier(None)));
        let state = state_with_user_message("???");
        assert_eq!(router.next(&state).await, "utility");
    }

    #[tokio::test]
    async fn chat_router_ends_after_subagent_answers_without_tool_calls() {
        let router = ChatRouter::new(Arc::new(FixedClassifier(Some(ChatDomain::Utility))));
        let mut state = state_with_user_message("what time is it");
        state.current_step = "utility".to_string();
        state
            .messages
            .push(StateMessage::text(MessageRole::Assistant, "It's 3pm."));
        assert_eq!(router.next(&state).await, "END");
    }

    #[tokio::test]
    async fn chat_router_forces_end_on_repeated_identical_message() {
        let router = ChatRouter::new(Arc::new(FixedClassifier(Some(ChatDomain::Utility))));
        let state = state_with_user_message("loop me");
        assert_eq!(router.next(&state).await, "utility");
        assert_eq!(router.next(&state).await, "utility");
        assert_eq!(router.next(&state).await, "END");
    }

    #[tokio::test]
    async fn paper_router_starts_at_literature() {
        let router = PaperRouter::new();
        let state = TaskState::new(3);
        assert_eq!(router.next(&state).await, "literature");
    }

    #[tokio::test]
    async fn paper_router_advances_through_stages() {
        let router = PaperRouter::new();
        let mut state = TaskState::new(3);
        state.artifacts.insert(
            "references".to_string(),
            ArtifactValue::References(vec![]),
        );
        // empty references is under MIN_REFERENCES too, so this is the
        // one free retry rather than "not present" progression.
        assert_eq!(router.next(&state).await, "literature");

        state.artifacts.insert(
            "references".to_string(),
            ArtifactValue::References(ten_references()),
        );
        assert_eq!(router.next(&state).await, "stats");
    }

    #[tokio::test]
    async fn paper_router_retries_literature_once_when_under_minimum_references() {
        let router = PaperRouter::new();
        let mut state = TaskState::new(3);
        let one_reference = vec![meridian_state::Reference {
            title: "t".into(),
            authors: vec![],
            year: None,
            source: "s".into(),
        }];
        state
            .artifacts
            .insert("references".to_string(), ArtifactValue::References(one_reference.clone()));

        // Under MIN_REFERENCES: retried once...
        assert_eq!(router.next(&state).await, "literature");
        // ...but a second under-count result is accepted, not retried again.
        assert_eq!(router.next(&state).await, "stats");
    }

    #[tokio::test]
    async fn paper_router_ends_once_all_stages_present() {
        let router = PaperRouter::new();
        let mut state = TaskState::new(3);
        state.artifacts.insert(
            "references".to_string(),
            ArtifactValue::References(ten_references()),
        );
        state.artifacts.insert(
            "stats_report".to_string(),
            ArtifactValue::StatsReport(meridian_state::StatsReport {
                summary: "s".into(),
                figures: vec![],
            }),
        );
        let mut sections = HashMap::new();
        sections.insert("abstract".to_string(), "...".to_string());
        state
            .artifacts
            .insert("manuscript_sections".to_string(), ArtifactValue::ManuscriptSections(sections));
        state.artifacts.insert(
            "compliance_report".to_string(),
            ArtifactValue::ComplianceReport(meridian_state::ComplianceReport {
                needs_revision: false,
                failed_items: vec![],
                score: 1.0,
            }),
        );
        assert_eq!(router.next(&state).await, "END");
    }

    #[tokio::test]
    async fn paper_router_respects_preset_next_agent() {
        let router = PaperRouter::new();
        let mut state = TaskState::new(3);
        state.next_agent = Some("writer".to_string());
        assert_eq!(router.next(&state).await, "writer");
    }
}
