#![deny(missing_docs)]
//! ReAct operator — model + tools in a reasoning loop.
//!
//! Implements `layer0::Operator` by running the Reason-Act-Observe cycle:
//! assemble context → call model → execute tools → repeat until done.

use async_trait::async_trait;
use layer0::content::Content;
use layer0::duration::DurationMs;
use layer0::error::OperatorError;
use layer0::hook::{HookAction, HookContext, HookPoint};
use layer0::operator::{
    ExitReason, Operator, OperatorInput, OperatorMetadata, OperatorOutput, ToolCallRecord,
};
use layer0::scope::Scope;
use meridian_hooks::HookRegistry;
use meridian_tool::ToolRegistry;
use meridian_turn::context::ContextStrategy;
use meridian_turn::convert::{content_to_user_message, parts_to_content};
use meridian_turn::provider::Provider;
use meridian_turn::types::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Static configuration for a ReactOperator instance.
pub struct ReactConfig {
    /// Base system prompt.
    pub system_prompt: String,
    /// Default model identifier.
    pub default_model: String,
    /// Default max tokens per response.
    pub default_max_tokens: u32,
    /// Default max turns before stopping.
    pub default_max_turns: u32,
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            default_model: String::new(),
            default_max_tokens: 4096,
            default_max_turns: 10,
        }
    }
}

/// Names of tools this operator intercepts itself rather than dispatching
/// to the registry: they write directly into `OperatorOutput`.
const ARTIFACT_TOOL_NAMES: &[&str] = &["set_artifact", "suggest_next_agent"];

/// Resolved configuration merging defaults with per-request overrides.
struct ResolvedConfig {
    model: Option<String>,
    system: String,
    max_turns: u32,
    max_cost: Option<Decimal>,
    max_duration: Option<DurationMs>,
    allowed_tools: Option<Vec<String>>,
    max_tokens: u32,
}

/// A full-featured Operator implementation with a ReAct loop.
///
/// Generic over `P: Provider` (not object-safe). The object-safe boundary
/// is `layer0::Operator`, which `ReactOperator<P>` implements via `#[async_trait]`.
pub struct ReactOperator<P: Provider> {
    provider: P,
    tools: ToolRegistry,
    context_strategy: Box<dyn ContextStrategy>,
    hooks: HookRegistry,
    state_reader: Arc<dyn layer0::StateReader>,
    config: ReactConfig,
}

impl<P: Provider> ReactOperator<P> {
    /// Create a new ReactOperator with all dependencies.
    pub fn new(
        provider: P,
        tools: ToolRegistry,
        context_strategy: Box<dyn ContextStrategy>,
        hooks: HookRegistry,
        state_reader: Arc<dyn layer0::StateReader>,
        config: ReactConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            context_strategy,
            hooks,
            state_reader,
            config,
        }
    }

    fn resolve_config(&self, input: &OperatorInput) -> ResolvedConfig {
        let tc = input.config.as_ref();
        let system = match tc.and_then(|c| c.system_addendum.as_ref()) {
            Some(addendum) => format!("{}\n{}", self.config.system_prompt, addendum),
            None => self.config.system_prompt.clone(),
        };
        ResolvedConfig {
            model: tc.and_then(|c| c.model.clone()).or_else(|| {
                if self.config.default_model.is_empty() {
                    None
                } else {
                    Some(self.config.default_model.clone())
                }
            }),
            system,
            max_turns: tc
                .and_then(|c| c.max_turns)
                .unwrap_or(self.config.default_max_turns),
            max_cost: tc.and_then(|c| c.max_cost),
            max_duration: tc.and_then(|c| c.max_duration),
            allowed_tools: tc.and_then(|c| c.allowed_tools.clone()),
            max_tokens: self.config.default_max_tokens,
        }
    }

    fn build_tool_schemas(&self, config: &ResolvedConfig) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .iter()
            .map(|tool| ToolSchema {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();

        schemas.extend(artifact_tool_schemas());

        // Filter by allowed_tools if specified
        if let Some(allowed) = &config.allowed_tools {
            schemas.retain(|s| allowed.contains(&s.name));
        }

        schemas
    }

    async fn assemble_context(
        &self,
        input: &OperatorInput,
    ) -> Result<Vec<ProviderMessage>, OperatorError> {
        let mut messages = Vec::new();

        // Read history from state if a session is present
        if let Some(session) = &input.session {
            let scope = Scope::Custom(format!("session:{}", session.as_str()));
            match self.state_reader.read(&scope, "messages").await {
                Ok(Some(history)) => {
                    if let Ok(history_messages) =
                        serde_json::from_value::<Vec<ProviderMessage>>(history)
                    {
                        messages = history_messages;
                    }
                }
                Ok(None) => {} // No history yet
                Err(_) => {}   // State read errors are non-fatal
            }
        }

        // Add the new user message
        messages.push(content_to_user_message(&input.message));

        Ok(messages)
    }

    /// Intercept `set_artifact`/`suggest_next_agent` tool calls before they
    /// reach the registry, writing directly into the running output state.
    fn try_as_artifact_write(
        &self,
        name: &str,
        input: &serde_json::Value,
        artifacts: &mut HashMap<String, serde_json::Value>,
        next_agent: &mut Option<String>,
    ) -> bool {
        match name {
            "set_artifact" => {
                let Some(key) = input.get("key").and_then(|k| k.as_str()) else {
                    return false;
                };
                let value = input.get("value").cloned().unwrap_or(serde_json::Value::Null);
                artifacts.insert(key.to_string(), value);
                true
            }
            "suggest_next_agent" => {
                let Some(agent) = input.get("agent").and_then(|a| a.as_str()) else {
                    return false;
                };
                *next_agent = Some(agent.to_string());
                true
            }
            _ => false,
        }
    }

    fn build_metadata(
        &self,
        tokens_in: u64,
        tokens_out: u64,
        cost: Decimal,
        turns_used: u32,
        tools_called: Vec<ToolCallRecord>,
        duration: DurationMs,
    ) -> OperatorMetadata {
        let mut meta = OperatorMetadata::default();
        meta.tokens_in = tokens_in;
        meta.tokens_out = tokens_out;
        meta.cost = cost;
        meta.turns_used = turns_used;
        meta.tools_called = tools_called;
        meta.duration = duration;
        meta
    }

    fn make_output(
        message: Content,
        exit_reason: ExitReason,
        metadata: OperatorMetadata,
        artifacts: HashMap<String, serde_json::Value>,
        next_agent: Option<String>,
    ) -> OperatorOutput {
        let mut output = OperatorOutput::new(message, exit_reason);
        output.metadata = metadata;
        output.artifacts = artifacts;
        output.next_agent = next_agent;
        output
    }

    fn build_hook_context(
        &self,
        point: HookPoint,
        tokens_in: u64,
        tokens_out: u64,
        cost: Decimal,
        turns_completed: u32,
        elapsed: DurationMs,
    ) -> HookContext {
        let mut ctx = HookContext::new(point);
        ctx.tokens_used = tokens_in + tokens_out;
        ctx.cost = cost;
        ctx.turns_completed = turns_completed;
        ctx.elapsed = elapsed;
        ctx
    }
}

#[async_trait]
impl<P: Provider + 'static> Operator for ReactOperator<P> {
    async fn execute(&self, input: OperatorInput) -> Result<OperatorOutput, OperatorError> {
        let start = Instant::now();
        let config = self.resolve_config(&input);
        let mut messages = self.assemble_context(&input).await?;
        let tools = self.build_tool_schemas(&config);

        let mut total_tokens_in: u64 = 0;
        let mut total_tokens_out: u64 = 0;
        let mut total_cost = Decimal::ZERO;
        let mut turns_used: u32 = 0;
        let mut tool_records: Vec<ToolCallRecord> = vec![];
        let mut artifacts: HashMap<String, serde_json::Value> = HashMap::new();
        let mut next_agent: Option<String> = None;
        let mut last_content: Vec<ContentPart> = vec![];

        loop {
            turns_used += 1;

            // 1. Hook: PreInference
            let hook_ctx = self.build_hook_context(
                HookPoint::PreInference,
                total_tokens_in,
                total_tokens_out,
                total_cost,
                turns_used - 1,
                DurationMs::from(start.elapsed()),
            );
            if let HookAction::Halt { reason } = self.hooks.dispatch(&hook_ctx).await {
                return Ok(Self::make_output(
                    parts_to_content(&last_content),
                    ExitReason::ObserverHalt { reason },
                    self.build_metadata(
                        total_tokens_in,
                        total_tokens_out,
                        total_cost,
                        turns_used,
                        tool_records,
                        DurationMs::from(start.elapsed()),
                    ),
                    artifacts,
                    next_agent,
                ));
            }

            // 2. Build ProviderRequest
            let request = ProviderRequest {
                model: config.model.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                max_tokens: Some(config.max_tokens),
                temperature: None,
                system: Some(config.system.clone()),
                extra: input.metadata.clone(),
            };

            // 3. Call provider
            let response = self.provider.complete(request).await.map_err(|e| {
                if e.is_retryable() {
                    OperatorError::Retryable(e.to_string())
                } else {
                    OperatorError::Model(e.to_string())
                }
            })?;

            // 4. Hook: PostInference
            let mut hook_ctx = self.build_hook_context(
                HookPoint::PostInference,
                total_tokens_in + response.usage.input_tokens,
                total_tokens_out + response.usage.output_tokens,
                total_cost + response.cost.unwrap_or(Decimal::ZERO),
                turns_used,
                DurationMs::from(start.elapsed()),
            );
            hook_ctx.model_output = Some(parts_to_content(&response.content));
            if let HookAction::Halt { reason } = self.hooks.dispatch(&hook_ctx).await {
                return Ok(Self::make_output(
                    parts_to_content(&response.content),
                    ExitReason::ObserverHalt { reason },
                    self.build_metadata(
                        total_tokens_in + response.usage.input_tokens,
                        total_tokens_out + response.usage.output_tokens,
                        total_cost + response.cost.unwrap_or(Decimal::ZERO),
                        turns_used,
                        tool_records,
                        DurationMs::from(start.elapsed()),
                    ),
                    artifacts,
                    next_agent,
                ));
            }

            // 5. Aggregate tokens + cost
            total_tokens_in += response.usage.input_tokens;
            total_tokens_out += response.usage.output_tokens;
            if let Some(cost) = response.cost {
                total_cost += cost;
            }

            last_content.clone_from(&response.content);

            // 6. Check StopReason
            match response.stop_reason {
                StopReason::MaxTokens => {
                    return Err(OperatorError::Model("output truncated (max_tokens)".into()));
                }
                StopReason::ContentFilter => {
                    return Err(OperatorError::Model("content filtered".into()));
                }
                StopReason::EndTurn => {
                    return Ok(Self::make_output(
                        parts_to_content(&response.content),
                        ExitReason::Complete,
                        self.build_metadata(
                            total_tokens_in,
                            total_tokens_out,
                            total_cost,
                            turns_used,
                            tool_records,
                            DurationMs::from(start.elapsed()),
                        ),
                        artifacts,
                        next_agent,
                    ));
                }
                StopReason::ToolUse => {
                    // Continue to tool execution below
                }
            }

            // 7. Tool execution
            // Add assistant message to context
            messages.push(ProviderMessage {
                role: Role::Assistant,
                content: response.content.clone(),
            });

            let tool_uses: Vec<(String, String, serde_json::Value)> = response
                .content
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ToolUse { id, name, input } => {
                        Some((id.clone(), name.clone(), input.clone()))
                    }
                    _ => None,
                })
                .collect();

            let mut tool_results = Vec::new();

            for (id, name, tool_input) in tool_uses {
                // a. Check artifact-writing tool
                if ARTIFACT_TOOL_NAMES.contains(&name.as_str()) {
                    let recorded = self.try_as_artifact_write(
                        &name,
                        &tool_input,
                        &mut artifacts,
                        &mut next_agent,
                    );
                    tool_results.push(ContentPart::ToolResult {
                        tool_use_id: id,
                        content: if recorded {
                            format!("{name} recorded.")
                        } else {
                            format!("{name} ignored: missing required field.")
                        },
                        is_error: !recorded,
                    });
                    tool_records.push(ToolCallRecord::new(&name, DurationMs::ZERO, recorded));
                    continue;
                }

                // b. Hook: PreToolUse
                let mut actual_input = tool_input.clone();
                let mut hook_ctx = HookContext::new(HookPoint::PreToolUse);
                hook_ctx.tool_name = Some(name.clone());
                hook_ctx.tool_input = Some(tool_input.clone());
                hook_ctx.tokens_used = total_tokens_in + total_tokens_out;
                hook_ctx.cost = total_cost;
                hook_ctx.turns_completed = turns_used;
                hook_ctx.elapsed = DurationMs::from(start.elapsed());

                match self.hooks.dispatch(&hook_ctx).await {
                    HookAction::Halt { reason } => {
                        return Ok(Self::make_output(
                            parts_to_content(&last_content),
                            ExitReason::ObserverHalt { reason },
                            self.build_metadata(
                                total_tokens_in,
                                total_tokens_out,
                                total_cost,
                                turns_used,
                                tool_records,
                                DurationMs::from(start.elapsed()),
                            ),
                            artifacts,
                            next_agent,
                        ));
                    }
                    HookAction::SkipTool { reason } => {
                        tool_results.push(ContentPart::ToolResult {
                            tool_use_id: id,
                            content: format!("Skipped: {reason}"),
                            is_error: false,
                        });
                        tool_records.push(ToolCallRecord::new(&name, DurationMs::ZERO, false));
                        continue;
                    }
                    HookAction::ModifyToolInput { new_input } => {
                        actual_input = new_input;
                    }
                    HookAction::Continue => {}
                    // Handle non_exhaustive
                    _ => {}
                }

                // c. Execute tool
                let tool_start = Instant::now();
                let result = match self.tools.get(&name) {
                    Some(tool) => tool.call(actual_input).await,
                    None => Err(meridian_tool::ToolError::NotFound(name.clone())),
                };
                let tool_duration = DurationMs::from(tool_start.elapsed());

                let (mut result_content, is_error, success) = match result {
                    Ok(value) => (
                        serde_json::to_string(&value).unwrap_or_default(),
                        false,
                        true,
                    ),
                    Err(e) => (e.to_string(), true, false),
                };

                // d. Hook: PostToolUse
                let mut hook_ctx = HookContext::new(HookPoint::PostToolUse);
                hook_ctx.tool_name = Some(name.clone());
                hook_ctx.tool_result = Some(result_content.clone());
                hook_ctx.tokens_used = total_tokens_in + total_tokens_out;
                hook_ctx.cost = total_cost;
                hook_ctx.turns_completed = turns_used;
                hook_ctx.elapsed = DurationMs::from(start.elapsed());

                match self.hooks.dispatch(&hook_ctx).await {
                    HookAction::Halt { reason } => {
                        return Ok(Self::make_output(
                            parts_to_content(&last_content),
                            ExitReason::ObserverHalt { reason },
                            self.build_metadata(
                                total_tokens_in,
                                total_tokens_out,
                                total_cost,
                                turns_used,
                                tool_records,
                                DurationMs::from(start.elapsed()),
                            ),
                            artifacts,
                            next_agent,
                        ));
                    }
                    HookAction::ModifyToolOutput { new_output } => {
                        // Replace tool result content before it flows into model context.
                        // HookRegistry short-circuits on first non-Continue, so only one
                        // hook's ModifyToolOutput can be returned per dispatch.
                        result_content = new_output.to_string();
                    }
                    _ => {} // Continue, SkipTool, ModifyToolInput are no-ops at PostToolUse
                }

                // e. Backfill result
                tool_results.push(ContentPart::ToolResult {
                    tool_use_id: id,
                    content: result_content,
                    is_error,
                });

                // f. Record
                tool_records.push(ToolCallRecord::new(name, tool_duration, success));
            }

            // Add tool results as user message
            messages.push(ProviderMessage {
                role: Role::User,
                content: tool_results,
            });

            // 8. Check limits
            if turns_used >= config.max_turns {
                return Ok(Self::make_output(
                    parts_to_content(&last_content),
                    ExitReason::MaxTurns,
                    self.build_metadata(
                        total_tokens_in,
                        total_tokens_out,
                        total_cost,
                        turns_used,
                        tool_records,
                        DurationMs::from(start.elapsed()),
                    ),
                    artifacts,
                    next_agent,
                ));
            }

            if let Some(max_cost) = &config.max_cost {
                if total_cost >= *max_cost {
                    return Ok(Self::make_output(
                        parts_to_content(&last_content),
                        ExitReason::BudgetExhausted,
                        self.build_metadata(
                            total_tokens_in,
                            total_tokens_out,
                            total_cost,
                            turns_used,
                            tool_records,
                            DurationMs::from(start.elapsed()),
                        ),
                        artifacts,
                        next_agent,
                    ));
                }
            }

            if let Some(max_duration) = &config.max_duration {
                if start.elapsed() >= max_duration.to_std() {
                    return Ok(Self::make_output(
                        parts_to_content(&last_content),
                        ExitReason::Timeout,
                        self.build_metadata(
                            total_tokens_in,
                            total_tokens_out,
                            total_cost,
                            turns_used,
                            tool_records,
                            DurationMs::from(start.elapsed()),
                        ),
                        artifacts,
                        next_agent,
                    ));
                }
            }

            // 9. Hook: ExitCheck
            let hook_ctx = self.build_hook_context(
                HookPoint::ExitCheck,
                total_tokens_in,
                total_tokens_out,
                total_cost,
                turns_used,
                DurationMs::from(start.elapsed()),
            );
            if let HookAction::Halt { reason } = self.hooks.dispatch(&hook_ctx).await {
                return Ok(Self::make_output(
                    parts_to_content(&last_content),
                    ExitReason::ObserverHalt { reason },
                    self.build_metadata(
                        total_tokens_in,
                        total_tokens_out,
                        total_cost,
                        turns_used,
                        tool_records,
                        DurationMs::from(start.elapsed()),
                    ),
                    artifacts,
                    next_agent,
                ));
            }

            // 10. Context compaction
            let limit = config.max_tokens as usize * 4;
            if self.context_strategy.should_compact(&messages, limit) {
                messages = self.context_strategy.compact(messages);
            }

            // 11. Loop repeats
        }
    }
}

/// Schemas for the artifact-writing tools every ReAct node exposes.
fn artifact_tool_schemas() -> Vec<ToolSchema> {
    vec![
        ToolSchema {
            name: "set_artifact".into(),
            description: "Record a task artifact produced this turn.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string", "description": "Artifact key, e.g. 'references' or 'stats_report'"},
                    "value": {"description": "Artifact value"}
                },
                "required": ["key", "value"]
            }),
        },
        ToolSchema {
            name: "suggest_next_agent".into(),
            description: "Suggest which agent the router should dispatch to next.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "agent": {"type": "string", "description": "Name of the suggested next agent"}
                },
                "required": ["agent"]
            }),
        },
    ]
}
