#![deny(missing_docs)]
//! Agent-to-agent message contract.
//!
//! `A2aMessage` is the immutable record persisted once per node completion.
//! This crate is pure data: construction helpers (`request`/`response`) and
//! the closed error taxonomy, no behaviour.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire protocol version. Only one variant today; closed enum so a future
/// `V2` is a compile-time-visible addition everywhere messages are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    /// `a2a.v1`.
    #[serde(rename = "a2a.v1")]
    V1,
}

/// Outcome of one node invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Completed normally.
    Ok,
    /// Completed with partial results (e.g. round budget exhausted).
    Partial,
    /// Unrecovered error; see `A2aMessage::error`.
    Error,
    /// A time budget elapsed.
    Timeout,
    /// Malformed input or tool arguments.
    ValidationError,
    /// A tool callable raised and the error was not recovered in-loop.
    ToolError,
}

/// Stable, closed error classification fixing the retry table of the
/// design's error handling section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed inputs or tool arguments. Never retryable.
    ValidationError,
    /// Tool callable raised. Not retryable at the LLM level.
    ToolError,
    /// LLM transport/format failure. Retryability depends on the provider's
    /// own signal, carried separately on `TypedError::retryable`.
    LlmError,
    /// A time budget elapsed. Retryable up to the node's round budget.
    Timeout,
    /// Invariant violation or unclassified failure. Never retryable.
    Unknown,
}

impl ErrorKind {
    /// Whether this class of error is retryable in isolation, ignoring any
    /// provider-specific override carried on `TypedError::retryable`.
    pub fn default_retryable(self) -> bool {
        matches!(self, ErrorKind::Timeout)
    }
}

/// A typed, structured error attached to a failed or partial A2A exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedError {
    /// Closed classification.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
    /// Whether the caller should retry. Defaults to `kind.default_retryable()`
    /// but providers may override (e.g. a rate-limited `LlmError` is
    /// retryable even though `LlmError` has no fixed default).
    pub retryable: bool,
}

impl TypedError {
    /// Build a typed error, defaulting `retryable` from `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.default_retryable(),
        }
    }

    /// Build a typed error with an explicit retryability override.
    pub fn with_retryable(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }
}

/// Latency/token accounting for one A2A exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct A2aMetrics {
    /// Wall-clock latency of the node invocation, in milliseconds.
    pub latency_ms: u64,
    /// Input tokens consumed, if known.
    pub tokens_in: Option<u32>,
    /// Output tokens produced, if known.
    pub tokens_out: Option<u32>,
    /// Number of tool calls made during this invocation.
    pub tool_call_count: u32,
}

impl A2aMetrics {
    /// Build metrics from a measured duration, leaving token counts unset.
    pub fn from_duration(duration: Duration, tool_call_count: u32) -> Self {
        Self {
            latency_ms: duration.as_millis() as u64,
            tokens_in: None,
            tokens_out: None,
            tool_call_count,
        }
    }
}

/// Immutable record of one inter-agent exchange.
///
/// Constructed via [`request`] for the supervisor-to-node leg and
/// [`response`] for the node-to-supervisor leg; never mutated after
/// construction.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2aMessage {
    /// Protocol version.
    pub protocol: Protocol,
    /// Process-unique message id.
    pub id: String,
    /// Task-scoped id propagated to every message for one task.
    pub correlation_id: Option<String>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Originating node name (or the distinguished supervisor sender).
    pub sender: String,
    /// Destination node name (or the distinguished supervisor receiver).
    pub receiver: String,
    /// Short tag describing why the call was made (e.g. `route_request`,
    /// `write_section`, `check_compliance`).
    pub intent: String,
    /// Outcome of the exchange.
    pub status: Status,
    /// Opaque structured payload the node was asked to process.
    pub input: serde_json::Value,
    /// Opaque structured payload produced, if any.
    pub output: Option<serde_json::Value>,
    /// Typed error, present iff `status` is an error-like variant.
    pub error: Option<TypedError>,
    /// Latency/token accounting, filled in on the response leg.
    pub metrics: Option<A2aMetrics>,
}

/// The distinguished sender/receiver name for the supervisor.
pub const SUPERVISOR: &str = "supervisor";

/// Build the supervisor-to-node request leg of an exchange.
pub fn request(
    sender: &str,
    receiver: &str,
    intent: &str,
    input: serde_json::Value,
    correlation_id: Option<String>,
) -> A2aMessage {
    A2aMessage {
        protocol: Protocol::V1,
        id: uuid::Uuid::new_v4().to_string(),
        correlation_id,
        timestamp: Utc::now(),
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        intent: intent.to_string(),
        status: Status::Ok,
        input,
        output: None,
        error: None,
        metrics: None,
    }
}

/// Build the node-to-supervisor response leg, mirroring the fields of the
/// request that provoked it (sender/receiver are swapped).
pub fn response(
    from_request: &A2aMessage,
    status: Status,
    output: Option<serde_json::Value>,
    error: Option<TypedError>,
    metrics: Option<A2aMetrics>,
) -> A2aMessage {
    A2aMessage {
        protocol: Protocol::V1,
        id: uuid::Uuid::new_v4().to_string(),
        correlation_id: from_request.correlation_id.clone(),
        timestamp: Utc::now(),
        sender: from_request.receiver.clone(),
        receiver: from_request.sender.clone(),
        intent: from_request.intent.clone(),
        status,
        input: from_request.input.clone(),
        output,
        error,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_sets_protocol_and_ids() {
        let msg = request(
            SUPERVISOR,
            "utility",
            "route_request",
            json!({"text": "hi"}),
            Some("corr-1".into()),
        );
        assert_eq!(msg.protocol, Protocol::V1);
        assert_eq!(msg.sender, SUPERVISOR);
        assert_eq!(msg.receiver, "utility");
        assert_eq!(msg.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(msg.status, Status::Ok);
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn response_swaps_sender_and_receiver() {
        let req = request(SUPERVISOR, "utility", "route_request", json!({}), None);
        let resp = response(&req, Status::Ok, Some(json!({"ok": true})), None, None);
        assert_eq!(resp.sender, "utility");
        assert_eq!(resp.receiver, SUPERVISOR);
        assert_eq!(resp.intent, "route_request");
    }

    #[test]
    fn response_preserves_correlation_id() {
        let req = request(
            SUPERVISOR,
            "writer",
            "write_section",
            json!({}),
            Some("corr-42".into()),
        );
        let resp = response(&req, Status::Ok, None, None, None);
        assert_eq!(resp.correlation_id.as_deref(), Some("corr-42"));
    }

    #[test]
    fn each_message_gets_a_unique_id() {
        let req = request(SUPERVISOR, "utility", "route_request", json!({}), None);
        let resp = response(&req, Status::Ok, None, None, None);
        assert_ne!(req.id, resp.id);
    }

    #[test]
    fn timeout_is_retryable_by_default() {
        let err = TypedError::new(ErrorKind::Timeout, "deadline exceeded");
        assert!(err.retryable);
    }

    #[test]
    fn validation_error_is_not_retryable_by_default() {
        let err = TypedError::new(ErrorKind::ValidationError, "bad args");
        assert!(!err.retryable);
    }

    #[test]
    fn retryable_override_wins_over_default() {
        let err = TypedError::with_retryable(ErrorKind::LlmError, "rate limited", true);
        assert!(err.retryable);
    }

    #[test]
    fn metrics_from_duration_leaves_tokens_unset() {
        let metrics = A2aMetrics::from_duration(Duration::from_millis(250), 2);
        assert_eq!(metrics.latency_ms, 250);
        assert_eq!(metrics.tokens_in, None);
        assert_eq!(metrics.tool_call_count, 2);
    }

    #[test]
    fn message_serializes_with_expected_shape() {
        let req = request(SUPERVISOR, "utility", "route_request", json!({"a": 1}), None);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["protocol"], json!("a2a.v1"));
        assert_eq!(value["status"], json!("ok"));
    }

    #[test]
    fn error_status_round_trips() {
        let req = request(SUPERVISOR, "writer", "write_section", json!({}), None);
        let err = TypedError::new(ErrorKind::ToolError, "pubmed fetch failed");
        let resp = response(&req, Status::Error, None, Some(err.clone()), None);
        let value = serde_json::to_value(&resp).unwrap();
        let back: A2aMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back.status, Status::Error);
        assert_eq!(back.error.unwrap().kind, ErrorKind::ToolError);
    }
}
