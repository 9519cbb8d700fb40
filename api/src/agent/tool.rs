use std::sync::Arc;

use async_trait::async_trait;
use mi_coach_core::conversation::ConversationMessage;
use serde::Deserialize;
use serde_json::json;

use super::Agent;
use super::model::{CompletionRequest, ModelError, ResponseFormat, ToolSpec, TranscriptItem};

pub const SENSING_TOOL_NAME: &str = "sensing_expert";

/// A function the primary agent may call while composing its reply.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Run the tool with the model-provided JSON arguments.
    async fn call(&self, arguments: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Deserialize)]
struct AgentToolInput {
    input: String,
}

/// Exposes a sub-agent as a tool taking `{ "input": string }`.
///
/// The wrapped agent answers in a single completion; it is built without
/// guardrails or tools of its own.
pub struct AgentTool {
    name: String,
    description: String,
    agent: Arc<Agent>,
}

impl AgentTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, agent: Agent) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent: Arc::new(agent),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "What you need from this expert"
                    }
                },
                "required": ["input"],
                "additionalProperties": false
            }),
        }
    }

    async fn call(&self, arguments: &str) -> Result<String, ModelError> {
        let args: AgentToolInput = serde_json::from_str(arguments).map_err(|e| {
            ModelError::InvalidResponse(format!("{} arguments: {e}", self.name))
        })?;

        tracing::debug!(tool = %self.name, agent = %self.agent.name, "invoking agent tool");

        let completion = self
            .agent
            .model
            .complete(CompletionRequest {
                instructions: self.agent.instructions.clone(),
                transcript: vec![TranscriptItem::Message(ConversationMessage::user(
                    args.input,
                ))],
                tools: Vec::new(),
                response_format: ResponseFormat::Text,
            })
            .await?;

        completion
            .content
            .ok_or_else(|| ModelError::InvalidResponse(format!("{} returned no text", self.name)))
    }
}
