//! # layer0 — Protocol traits for composable agentic AI systems
//!
//! This crate defines the protocol boundaries that compose to form an
//! agentic orchestration system: one reasoning step per agent (Operator),
//! how state persists across steps (StateStore), and the cross-cutting
//! hook interface used for observation and intervention.
//!
//! ## The Protocols
//!
//! | Protocol | Trait | What it does |
//! |----------|-------|-------------|
//! | ① Operator | [`Operator`] | What one agent does per cycle |
//! | ② State | [`StateStore`] | How data persists across turns |
//!
//! ## The Interfaces
//!
//! | Interface | Types | What it does |
//! |-----------|-------|-------------|
//! | ③ Hooks | [`Hook`], [`HookPoint`], [`HookAction`] | Observation + intervention |
//!
//! ## Design Principle
//!
//! Every protocol trait is operation-defined, not mechanism-defined.
//! [`Operator::execute`] means "cause this agent to process one cycle" —
//! not "make an API call" or "run a subprocess." This is what makes
//! implementations swappable: an in-process loop, a function call, and a
//! future system that doesn't exist yet all implement the same trait.
//!
//! ## Dependency Notes
//!
//! This crate depends on `serde_json::Value` for extension data fields
//! (metadata, tool inputs, custom payloads). This is an intentional choice:
//! JSON is the universal interchange format for agentic systems, and
//! `serde_json::Value` is the de facto standard in the Rust ecosystem.
//! The alternative (generic `T: Serialize`) would complicate trait object
//! safety without practical benefit.
//!
//! ## Future: Native Async Traits
//!
//! Protocol traits currently use `async-trait` (heap-allocated futures).
//! When Rust stabilizes `async fn in dyn Trait` with `Send` bounds, these
//! traits will migrate to native async. This will be a breaking change in
//! a minor version bump before v1.0.

#![deny(missing_docs)]

pub mod content;
pub mod duration;
pub mod error;
pub mod hook;
pub mod id;
pub mod operator;
pub mod scope;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use content::{Content, ContentBlock};
pub use duration::DurationMs;
pub use error::{HookError, OperatorError, StateError};
pub use hook::{Hook, HookAction, HookContext, HookPoint};
pub use id::{AgentId, CorrelationId, ScopeId, SessionId, TaskId, WorkflowId};
pub use operator::{
    ExitReason, Operator, OperatorConfig, OperatorInput, OperatorMetadata, OperatorOutput,
    ToolCallRecord, TriggerType,
};
pub use scope::Scope;
pub use state::{SearchResult, StateReader, StateStore};
