use std::sync::Arc;

use async_trait::async_trait;
use mi_coach_core::conversation::ConversationMessage;
use mi_coach_core::prompts::{HARM_PROMPT, HARM_RESPONSE, MI_CHECK_PROMPT, MI_CHECK_RESPONSE};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::model::{ChatModel, CompletionRequest, ModelError, ResponseFormat, TranscriptItem};

pub const HARM_GUARDRAIL: &str = "harm";
pub const MI_CHECK_GUARDRAIL: &str = "mi_check";

const HARM_VERDICT_FORMAT: &str = "\n# Output\nRespond only with a JSON object: \
     {\"is_harm\": true or false, \"reasoning\": \"one sentence\"}.";

const MI_CHECK_VERDICT_FORMAT: &str = "\n# Output\nRespond only with a JSON object: \
     {\"is_not_mi\": true or false, \"reasoning\": \"one sentence\"}.";

/// Outcome of one guardrail evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailResult {
    pub guardrail: &'static str,
    pub tripwire_triggered: bool,
    /// Canned reply that replaces the agent's output when the tripwire fires
    pub output_info: String,
}

/// A policy check run against the conversation before the agent answers.
#[async_trait]
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate(
        &self,
        conversation: &[ConversationMessage],
    ) -> Result<GuardrailResult, ModelError>;
}

#[derive(Debug, Deserialize)]
struct HarmVerdict {
    is_harm: bool,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct MiCheckVerdict {
    is_not_mi: bool,
    #[serde(default)]
    reasoning: String,
}

/// Flags risk of self-harm or harm to others, including indirect references,
/// requests for examples or information, and academic framing.
pub struct HarmGuardrail {
    model: Arc<dyn ChatModel>,
}

impl HarmGuardrail {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Guardrail for HarmGuardrail {
    fn name(&self) -> &'static str {
        HARM_GUARDRAIL
    }

    async fn evaluate(
        &self,
        conversation: &[ConversationMessage],
    ) -> Result<GuardrailResult, ModelError> {
        let verdict: HarmVerdict =
            classify(self.model.as_ref(), HARM_PROMPT, HARM_VERDICT_FORMAT, conversation).await?;
        tracing::debug!(
            guardrail = HARM_GUARDRAIL,
            tripped = verdict.is_harm,
            reasoning = %verdict.reasoning,
            "guardrail verdict"
        );
        Ok(GuardrailResult {
            guardrail: HARM_GUARDRAIL,
            tripwire_triggered: verdict.is_harm,
            output_info: HARM_RESPONSE.to_string(),
        })
    }
}

/// Flags conversations drifting away from motivational-interviewing topics.
/// Closing remarks, friendliness, and talk about tracked activity or sleep
/// data are on topic.
pub struct OnTopicGuardrail {
    model: Arc<dyn ChatModel>,
}

impl OnTopicGuardrail {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Guardrail for OnTopicGuardrail {
    fn name(&self) -> &'static str {
        MI_CHECK_GUARDRAIL
    }

    async fn evaluate(
        &self,
        conversation: &[ConversationMessage],
    ) -> Result<GuardrailResult, ModelError> {
        let verdict: MiCheckVerdict = classify(
            self.model.as_ref(),
            MI_CHECK_PROMPT,
            MI_CHECK_VERDICT_FORMAT,
            conversation,
        )
        .await?;
        tracing::debug!(
            guardrail = MI_CHECK_GUARDRAIL,
            tripped = verdict.is_not_mi,
            reasoning = %verdict.reasoning,
            "guardrail verdict"
        );
        Ok(GuardrailResult {
            guardrail: MI_CHECK_GUARDRAIL,
            tripwire_triggered: verdict.is_not_mi,
            output_info: MI_CHECK_RESPONSE.to_string(),
        })
    }
}

async fn classify<V: DeserializeOwned>(
    model: &dyn ChatModel,
    prompt: &str,
    verdict_format: &str,
    conversation: &[ConversationMessage],
) -> Result<V, ModelError> {
    let completion = model
        .complete(CompletionRequest {
            instructions: format!("{prompt}{verdict_format}"),
            transcript: TranscriptItem::from_messages(conversation),
            tools: Vec::new(),
            response_format: ResponseFormat::JsonObject,
        })
        .await?;

    let content = completion
        .content
        .ok_or_else(|| ModelError::InvalidResponse("classifier returned no content".into()))?;
    serde_json::from_str(&content)
        .map_err(|e| ModelError::InvalidResponse(format!("classifier verdict: {e}")))
}
