//! Constructors for the four paper sub-agent nodes (`literature`, `stats`,
//! `writer`, `compliance`), each a `ReactOperator` wired with its own tool
//! set and wrapped for the graph executor via [`crate::adapter::OperatorNode`].

use crate::adapter::{HistoryStore, OperatorNode};
use crate::tools::{AnalyzeStatsTool, CheckComplianceTool, SearchLiteratureTool, WriteSectionTool};
use meridian_hooks::HookRegistry;
use meridian_op_react::{ReactConfig, ReactOperator};
use meridian_tool::ToolRegistry;
use meridian_turn::context::NoCompaction;
use meridian_turn::provider::Provider;
use std::sync::Arc;

/// Agent-node step budget: bounded tool-call rounds per invocation. Set
/// above the chat sub-agents' default since `literature` may need several
/// `search_literature` rounds to clear the minimum reference count before
/// emitting its artifact, all within one node invocation.
const DEFAULT_MAX_TURNS: u32 = 12;

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

/// Minimum reference count the `literature` node's system prompt asks the
/// model to clear before finishing, matching the paper workflow's
/// minimum-references edge case.
pub const MIN_REFERENCES: usize = 10;

/// Build the `literature` sub-agent: gathers sources via
/// `search_literature` and emits a `references` artifact.
pub fn literature_node<P: Provider + 'static>(provider: P) -> OperatorNode<ReactOperator<P>> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(SearchLiteratureTool));
    let prompt = format!(
        "You are the literature sub-agent of a medical paper writing pipeline. \
         Use search_literature to gather sources for the research question, \
         calling it again with a larger max_results if fewer than {MIN_REFERENCES} \
         records come back. When you have at least {MIN_REFERENCES} records, call \
         set_artifact with key \"references\" and the combined list of records."
    );
    let (operator, history) = build_operator(provider, &prompt, tools);
    OperatorNode::new(operator, history, DEFAULT_MAX_TURNS)
}

/// Build the `stats` sub-agent: runs statistical procedures via
/// `analyze_stats` and emits a `stats_report` artifact.
pub fn stats_node<P: Provider + 'static>(provider: P) -> OperatorNode<ReactOperator<P>> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(AnalyzeStatsTool));
    let (operator, history) = build_operator(
        provider,
        "You are the stats sub-agent of a medical paper writing pipeline. Use \
         analyze_stats to run the procedures the research question calls for, \
         then call set_artifact with key \"stats_report\" and an object with \
         summary and figures fields.",
        tools,
    );
    OperatorNode::new(operator, history, DEFAULT_MAX_TURNS)
}

/// Build the `writer` sub-agent: drafts manuscript sections via
/// `write_section` and emits a `manuscript_sections` artifact.
pub fn writer_node<P: Provider + 'static>(provider: P) -> OperatorNode<ReactOperator<P>> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(WriteSectionTool));
    let (operator, history) = build_operator(
        provider,
        "You are the writer sub-agent of a medical paper writing pipeline. Use \
         write_section for each of abstract, introduction, methods, results, and \
         discussion, drawing on the references and stats report already in \
         context. If the conversation includes failed compliance items, revise \
         only those sections. Call set_artifact with key \"manuscript_sections\" \
         and an object mapping each section name to its drafted text.",
        tools,
    );
    OperatorNode::new(operator, history, DEFAULT_MAX_TURNS)
}

/// Build the `compliance` sub-agent: checks the manuscript against its
/// paper type's reporting checklist via `check_compliance` and emits a
/// `compliance_report` artifact.
pub fn compliance_node<P: Provider + 'static>(provider: P) -> OperatorNode<ReactOperator<P>> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(CheckComplianceTool));
    let (operator, history) = build_operator(
        provider,
        "You are the compliance sub-agent of a medical paper writing pipeline. \
         Use check_compliance against the manuscript sections already drafted, \
         then call set_artifact with key \"compliance_report\" and an object \
         with needs_revision, failed_items, and score fields.",
        tools,
    );
    OperatorNode::new(operator, history, DEFAULT_MAX_TURNS)
}
