#![deny(missing_docs)]
//! # meridian — umbrella crate
//!
//! A single import surface for the multi-agent orchestration core: the
//! A2A message contract (C1), ReAct agent nodes (C4), the task state
//! machine (C5), the supervisor router (C6), and the graph executor
//! (C7), plus the concrete `chat` and `paper` sub-agent sets built on
//! top of them. Re-exports each piece behind a feature flag, plus a
//! `prelude` for the happy path.

#[cfg(feature = "a2a")]
pub use meridian_a2a;
#[cfg(feature = "chat-agents")]
pub use meridian_chat_agents;
#[cfg(feature = "core")]
pub use meridian_context;
#[cfg(feature = "executor")]
pub use meridian_executor;
#[cfg(feature = "hooks")]
pub use meridian_hooks;
#[cfg(feature = "op-react")]
pub use meridian_op_react;
#[cfg(feature = "op-single-shot")]
pub use meridian_op_single_shot;
#[cfg(feature = "paper-agents")]
pub use meridian_paper_agents;
#[cfg(feature = "provider-mock")]
pub use meridian_provider_mock;
#[cfg(feature = "router")]
pub use meridian_router;
#[cfg(feature = "state")]
pub use meridian_state;
#[cfg(feature = "state-fs")]
pub use meridian_state_fs;
#[cfg(feature = "state-memory")]
pub use meridian_state_memory;
#[cfg(feature = "core")]
pub use meridian_tool;
#[cfg(feature = "executor")]
pub use meridian_trace;
#[cfg(feature = "core")]
pub use meridian_turn;
#[cfg(feature = "core")]
pub use layer0;

/// Happy-path imports for composing meridian systems.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use layer0::{
        AgentId, Content, ContentBlock, ExitReason, Hook, HookAction, HookContext, HookPoint,
        Operator, OperatorConfig, OperatorInput, OperatorOutput, Scope, SessionId, StateReader,
        StateStore, WorkflowId,
    };

    #[cfg(feature = "hooks")]
    pub use meridian_hooks::HookRegistry;

    #[cfg(feature = "core")]
    pub use meridian_tool::{ToolDyn, ToolError, ToolRegistry};

    #[cfg(feature = "core")]
    pub use meridian_turn::provider::{Provider, ProviderError};

    #[cfg(feature = "op-react")]
    pub use meridian_op_react::{ReactConfig, ReactOperator};

    #[cfg(feature = "op-single-shot")]
    pub use meridian_op_single_shot::{SingleShotConfig, SingleShotOperator};

    #[cfg(feature = "state-memory")]
    pub use meridian_state_memory::MemoryStore;

    #[cfg(feature = "state-fs")]
    pub use meridian_state_fs::FsStore;

    #[cfg(feature = "a2a")]
    pub use meridian_a2a::{ErrorKind, Protocol, Status, TypedError};

    #[cfg(feature = "state")]
    pub use meridian_state::{
        ArtifactValue, MessageRole, StateDelta, StateMessage, TaskState, END, START,
    };

    #[cfg(feature = "router")]
    pub use meridian_router::{ChatClassifier, ChatDomain, ChatRouter, PaperRouter, Router};

    #[cfg(feature = "executor")]
    pub use meridian_executor::{
        A2aStore, Executor, ExecutorConfig, ExecutorOutcome, Node, NodeOutcome, NodeRegistry,
        TerminalStatus, WorkflowKind,
    };

    #[cfg(feature = "chat-agents")]
    pub use meridian_chat_agents::{
        learning_node, productivity_node, utility_node, SingleShotClassifier,
    };

    #[cfg(feature = "paper-agents")]
    pub use meridian_paper_agents::{
        compliance_node, literature_node, stats_node, writer_node,
    };
}
