//! A2A message persistence, backed by any `layer0::StateStore`.

use async_trait::async_trait;
use layer0::scope::Scope;
use layer0::state::StateStore;
use layer0::TaskId;
use meridian_a2a::A2aMessage;
use std::sync::Arc;

/// Errors from the A2A persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying `StateStore` failed.
    #[error("state store error: {0}")]
    Backend(String),
    /// A stored record failed to deserialize back into `A2aMessage`.
    #[error("corrupt a2a record: {0}")]
    Corrupt(String),
}

/// Durable A2A message log for one task, queried by admin/inspection
/// tooling (never by the core executor's own control flow).
#[async_trait]
pub trait A2aStore: Send + Sync {
    /// Persist one message. Must be durable once this returns `Ok`.
    async fn write(&self, task_id: &str, message: &A2aMessage) -> Result<(), StoreError>;

    /// List all messages for a task, ordered by timestamp.
    async fn list_by_task(&self, task_id: &str) -> Result<Vec<A2aMessage>, StoreError>;
}

fn message_key(message: &A2aMessage) -> String {
    format!("a2a:{}", message.id)
}

/// `A2aStore` implementation backed by a `layer0::StateStore` (the
/// in-memory `meridian-state-memory` store by default, or the durable
/// `meridian-state-fs` store for persistence across restarts).
pub struct StateBackedA2aStore {
    inner: Arc<dyn StateStore>,
}

impl StateBackedA2aStore {
    /// Wrap a `StateStore` backend.
    pub fn new(inner: Arc<dyn StateStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl A2aStore for StateBackedA2aStore {
    async fn write(&self, task_id: &str, message: &A2aMessage) -> Result<(), StoreError> {
        let scope = Scope::Task(TaskId::new(task_id));
        let value =
            serde_json::to_value(message).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.inner
            .write(&scope, &message_key(message), value)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn list_by_task(&self, task_id: &str) -> Result<Vec<A2aMessage>, StoreError> {
        let scope = Scope::Task(TaskId::new(task_id));
        let keys = self
            .inner
            .list(&scope, "a2a:")
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut messages = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self
                .inner
                .read(&scope, &key)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            if let Some(value) = value {
                let message: A2aMessage =
                    serde_json::from_value(value).map_err(|e| StoreError::Corrupt(e.to_string()))?;
                messages.push(message);
            }
        }
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }
}
