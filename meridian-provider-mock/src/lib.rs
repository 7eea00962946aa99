#![deny(missing_docs)]
//! A deterministic, scripted `Provider` implementation.
//!
//! No vendor LLM integration ships in this workspace (out of scope per the
//! core's purpose); `ScriptedProvider` is the one `Provider` implementation
//! here, driving agents and end-to-end tests with a pre-recorded sequence
//! of responses rather than a real model call.

use meridian_turn::provider::{Provider, ProviderError};
use meridian_turn::types::{ContentPart, ProviderRequest, ProviderResponse, StopReason, TokenUsage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted, deterministic `Provider`. Each call to `complete` pops the
/// next response off the front of the queue; calling past the end of the
/// script is a test-author error and panics immediately rather than
/// silently looping or blocking.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Build a provider that replays `responses` in order, one per call.
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for ScriptedProvider {
    fn complete(
        &self,
        _request: ProviderRequest,
    ) -> impl std::future::Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let popped = self.responses.lock().unwrap().pop_front();
        async move {
            popped.ok_or_else(|| {
                ProviderError::Other("ScriptedProvider exhausted its script".into())
            })
        }
    }
}

/// Build a final, tool-call-free response with plain text content.
pub fn text_response(text: impl Into<String>) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::Text { text: text.into() }],
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage::default(),
        model: "mock".to_string(),
        cost: None,
        truncated: None,
    }
}

/// Build a response requesting exactly one tool call.
pub fn tool_call_response(
    id: impl Into<String>,
    name: impl Into<String>,
    input: serde_json::Value,
) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }],
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage::default(),
        model: "mock".to_string(),
        cost: None,
        truncated: None,
    }
}

/// Build a response requesting several tool calls in one turn, executed
/// sequentially in the order given.
pub fn multi_tool_call_response(calls: Vec<(String, String, serde_json::Value)>) -> ProviderResponse {
    ProviderResponse {
        content: calls
            .into_iter()
            .map(|(id, name, input)| ContentPart::ToolUse { id, name, input })
            .collect(),
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage::default(),
        model: "mock".to_string(),
        cost: None,
        truncated: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_turn::types::{ProviderMessage, Role};

    fn empty_request() -> ProviderRequest {
        ProviderRequest {
            model: None,
            messages: vec![ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::Text { text: "hi".into() }],
            }],
            tools: vec![],
            max_tokens: None,
            temperature: None,
            system: None,
            extra: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn replays_responses_in_order() {
        let provider = ScriptedProvider::new(vec![
            text_response("first"),
            text_response("second"),
        ]);
        let first = provider.complete(empty_request()).await.unwrap();
        let second = provider.complete(empty_request()).await.unwrap();
        assert_eq!(first.content, vec![ContentPart::Text { text: "first".into() }]);
        assert_eq!(second.content, vec![ContentPart::Text { text: "second".into() }]);
    }

    #[tokio::test]
    async fn tracks_call_count() {
        let provider = ScriptedProvider::new(vec![text_response("a")]);
        assert_eq!(provider.call_count(), 0);
        provider.complete(empty_request()).await.unwrap();
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_script_returns_error() {
        let provider = ScriptedProvider::new(vec![]);
        let result = provider.complete(empty_request()).await;
        assert!(result.is_err());
    }

    #[test]
    fn tool_call_response_sets_tool_use_stop_reason() {
        let response = tool_call_response("id1", "lookup", serde_json::json!({"q": "x"}));
        assert_eq!(response.stop_reason, StopReason::ToolUse);
    }

    #[test]
    fn multi_tool_call_response_preserves_order() {
        let response = multi_tool_call_response(vec![
            ("a".into(), "one".into(), serde_json::json!({})),
            ("b".into(), "two".into(), serde_json::json!({})),
        ]);
        match &response.content[0] {
            ContentPart::ToolUse { name, .. } => assert_eq!(name, "one"),
            _ => panic!("expected tool use"),
        }
        match &response.content[1] {
            ContentPart::ToolUse { name, .. } => assert_eq!(name, "two"),
            _ => panic!("expected tool use"),
        }
    }
}
