//! Shared turn-level defaults.

/// Static defaults for a turn: base prompt, model, and loop bounds.
///
/// Per-request overrides come from `OperatorInput.config` (layer0's `OperatorConfig`).
/// This struct holds the defaults those overrides fall back to.
pub struct TurnConfig {
    /// Base system prompt for this turn implementation.
    pub system_prompt: String,

    /// Default model identifier.
    pub default_model: String,

    /// Default maximum output tokens per provider call.
    pub default_max_tokens: u32,

    /// Default maximum ReAct loop iterations.
    pub default_max_turns: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".into(),
            default_model: String::new(),
            default_max_tokens: 4096,
            default_max_turns: 25,
        }
    }
}
