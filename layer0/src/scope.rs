//! Scoping for the state store — which namespace a key lives in.

use crate::id::TaskId;
use serde::{Deserialize, Serialize};

/// A namespace a StateStore key lives in.
///
/// Scopes partition storage so the A2A persistence collaborator, the
/// prompt template cache, and any other state-store user never collide on
/// bare string keys.
#[non_exhaustive]
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scope {
    /// Data belonging to a single task (A2A messages, partial artifacts).
    Task(TaskId),
    /// Data shared across all tasks (prompt template cache, global config).
    Global,
    /// Implementation-defined scope, for extensions this protocol doesn't
    /// need to understand.
    Custom(String),
}
