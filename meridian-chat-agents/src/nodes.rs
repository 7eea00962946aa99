//! Constructors for the three chat sub-agent nodes (`learning`,
//! `productivity`, `utility`), each a `ReactOperator` wired with its own
//! tool set and wrapped for the graph executor via [`crate::adapter::OperatorNode`].

use crate::adapter::{HistoryStore, OperatorNode};
use crate::tools::{DateTimeTool, ManageTaskTool, SaveLearningTool};
use meridian_hooks::HookRegistry;
use meridian_op_react::{ReactConfig, ReactOperator};
use meridian_tool::ToolRegistry;
use meridian_turn::context::NoCompaction;
use meridian_turn::provider::Provider;
use std::sync::Arc;

/// Agent-node step budget: bounded tool-call rounds per invocation.
const DEFAULT_MAX_TURNS: u32 = 8;

fn build_operator<P: Provider + 'static>(
    provider: P,
    system_prompt: &str,
    tools: ToolRegistry,
) -> (ReactOperator<P>, Arc<HistoryStore>) {
    let history = Arc::new(HistoryStore::new());
    let config = ReactConfig {
        system_prompt: system_prompt.to_string(),
        default_max_turns: DEFAULT_MAX_TURNS,
        ..Default::default()
    };
    let operator = ReactOperator::new(
        provider,
        tools,
        Box::new(NoCompaction),
        HookRegistry::new(),
        history.clone(),
        config,
    );
    (operator, history)
}

/// Build the `learning` sub-agent: English/tech learning, Q&A, saved
/// learning records (`save_learning`).
pub fn learning_node<P: Provider + 'static>(provider: P) -> OperatorNode<ReactOperator<P>> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(SaveLearningTool));
    let (operator, history) = build_operator(
        provider,
        "You are the learning sub-agent of a personal secretary. Answer \
         questions, explain topics, and use save_learning only when the user \
         explicitly asks you to save or remember something.",
        tools,
    );
    OperatorNode::new(operator, history, DEFAULT_MAX_TURNS)
}

/// Build the `productivity` sub-agent: task/reminder tracking
/// (`manage_task`).
pub fn productivity_node<P: Provider + 'static>(provider: P) -> OperatorNode<ReactOperator<P>> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(ManageTaskTool));
    let (operator, history) = build_operator(
        provider,
        "You are the productivity sub-agent of a personal secretary. Track, \
         complete, and list tasks and reminders using manage_task.",
        tools,
    );
    OperatorNode::new(operator, history, DEFAULT_MAX_TURNS)
}

/// Build the `utility` sub-agent: general requests, date/time lookups
/// (`get_current_datetime`). The supervisor's default for unclassifiable
/// input.
pub fn utility_node<P: Provider + 'static>(provider: P) -> OperatorNode<ReactOperator<P>> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(DateTimeTool));
    let (operator, history) = build_operator(
        provider,
        "You are the utility sub-agent of a personal secretary, handling \
         general requests that don't fit learning or productivity, \
         including date/time lookups via get_current_datetime.",
        tools,
    );
    OperatorNode::new(operator, history, DEFAULT_MAX_TURNS)
}
