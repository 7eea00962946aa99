//! A production [`ChatClassifier`] built on the single-call operator.
//!
//! Grounded on `meridian-op-single-shot`, the one existing "ask the model
//! one constrained question" building block: a classifier just needs a
//! system prompt that names the three domains and a one-line parse of the
//! reply, not a full ReAct loop.

use async_trait::async_trait;
use layer0::content::Content;
use layer0::operator::{Operator, OperatorInput, TriggerType};
use meridian_op_single_shot::{SingleShotConfig, SingleShotOperator};
use meridian_router::{ChatClassifier, ChatDomain};
use meridian_turn::provider::Provider;

const SYSTEM_PROMPT: &str = "Classify the user's message into exactly one \
of: learning, productivity, utility. \"learning\" is for saving or recalling \
a fact, word, or note the user wants remembered. \"productivity\" is for \
tasks, reminders, or scheduling. \"utility\" is everything else. Respond \
with a single word: learning, productivity, or utility.";

/// Classifies chat messages with one unparsed model call.
pub struct SingleShotClassifier<P: Provider> {
    operator: SingleShotOperator<P>,
}

impl<P: Provider + 'static> SingleShotClassifier<P> {
    /// Build a classifier around the given provider.
    pub fn new(provider: P) -> Self {
        let config = SingleShotConfig {
            system_prompt: SYSTEM_PROMPT.to_string(),
            ..Default::default()
        };
        Self {
            operator: SingleShotOperator::new(provider, config),
        }
    }
}

#[async_trait]
impl<P: Provider + 'static> ChatClassifier for SingleShotClassifier<P> {
    async fn classify(&self, message: &str) -> Option<ChatDomain> {
        let input = OperatorInput::new(Content::text(message), TriggerType::User);
        let output = self.operator.execute(input).await.ok()?;
        let text = output.message.as_text()?.to_lowercase();
        if text.contains("learning") {
            Some(ChatDomain::Learning)
        } else if text.contains("productivity") {
            Some(ChatDomain::Productivity)
        } else if text.contains("utility") {
            Some(ChatDomain::Utility)
        } else {
            None
        }
    }
}
