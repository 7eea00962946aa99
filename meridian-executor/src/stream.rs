//! Stream Adapter (C9): converts executor events into an ordered, typed
//! chunk sequence delivered over a bounded channel.

use serde::Serialize;

/// Depth of the bounded channel `stream()` delivers chunks over. A slow
/// consumer throttles the producing task rather than buffering unboundedly.
pub const CHANNEL_DEPTH: usize = 16;

/// One item in an executor's output stream.
///
/// Ordering guarantees: `Start` is always first, `Done` is always last
/// and is the only terminal chunk; `Token` chunks between two `Data`
/// chunks belong to the node that produced the later `Data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    /// Emitted exactly once, first.
    Start {
        /// Task identifier.
        task_id: String,
        /// Correlation id propagated to every A2A message for this task.
        correlation_id: String,
    },
    /// A partial LLM output fragment. Only emitted when the underlying
    /// call itself streams; ordering within one node is preserved.
    Token {
        /// Node currently executing.
        node: String,
        /// UTF-8 text fragment.
        text: String,
    },
    /// Emitted when a node completes.
    Data {
        /// Node that completed.
        node: String,
        /// Summary of artifacts the node produced or touched.
        artifact_summary: serde_json::Value,
    },
    /// Carries a failure that does not necessarily end the stream.
    Error {
        /// Short machine-readable tag.
        kind: String,
        /// Human-readable detail.
        message: String,
    },
    /// Emitted exactly once, last.
    Done {
        /// Final task status (`completed`, `failed`, `cancelled`).
        status: String,
    },
}

impl Chunk {
    /// Whether this chunk must be the last one in a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Chunk::Done { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_done_is_terminal() {
        assert!(!Chunk::Start {
            task_id: "t".into(),
            correlation_id: "c".into()
        }
        .is_terminal());
        assert!(Chunk::Done {
            status: "completed".into()
        }
        .is_terminal());
    }

    #[test]
    fn serializes_with_type_tag() {
        let chunk = Chunk::Data {
            node: "utility".into(),
            artifact_summary: serde_json::json!({"keys": []}),
        };
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["type"], serde_json::json!("data"));
        assert_eq!(value["node"], serde_json::json!("utility"));
    }

    #[test]
    fn done_serializes_with_status() {
        let chunk = Chunk::Done {
            status: "cancelled".into(),
        };
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["type"], serde_json::json!("done"));
        assert_eq!(value["status"], serde_json::json!("cancelled"));
    }
}
