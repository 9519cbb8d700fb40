//! Azure OpenAI chat-completions binding.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::model::{
    ChatModel, Completion, CompletionRequest, ModelError, ResponseFormat, ToolCall, ToolSpec,
    TranscriptItem,
};
use crate::config::ModelBinding;

const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct AzureOpenAiModel {
    binding: ModelBinding,
    client: reqwest::Client,
}

impl AzureOpenAiModel {
    pub fn new(binding: ModelBinding) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        Ok(Self { binding, client })
    }

    fn chat_url(&self) -> Result<String, ModelError> {
        let endpoint = self
            .binding
            .endpoint
            .as_deref()
            .ok_or_else(|| ModelError::Configuration("AZURE_OPENAI_ENDPOINT is not set".into()))?;
        Ok(format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            self.binding.deployment,
            self.binding.api_version
        ))
    }
}

#[async_trait]
impl ChatModel for AzureOpenAiModel {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
        let url = self.chat_url()?;
        let api_key = self
            .binding
            .api_key
            .as_deref()
            .ok_or_else(|| ModelError::Configuration("AZURE_OPENAI_API_KEY is not set".into()))?;

        tracing::debug!(
            deployment = %self.binding.deployment,
            transcript_len = request.transcript.len(),
            tools = request.tools.len(),
            "chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", api_key)
            .json(&build_body(&request))
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), text));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(format!("body is not JSON: {e}")))?;
        parse_completion(&body)
    }
}

fn classify_failure(status: u16, body: String) -> ModelError {
    if status == 400 {
        ModelError::Rejected { message: body }
    } else {
        ModelError::Provider {
            status,
            message: body,
        }
    }
}

fn build_body(request: &CompletionRequest) -> Value {
    let mut messages = vec![json!({
        "role": "system",
        "content": request.instructions,
    })];
    messages.extend(request.transcript.iter().map(transcript_item_to_openai));

    let mut body = json!({ "messages": messages });
    if !request.tools.is_empty() {
        body["tools"] = Value::Array(request.tools.iter().map(tool_to_openai).collect());
    }
    if request.response_format == ResponseFormat::JsonObject {
        body["response_format"] = json!({ "type": "json_object" });
    }
    body
}

fn transcript_item_to_openai(item: &TranscriptItem) -> Value {
    match item {
        TranscriptItem::Message(msg) => json!({
            "role": msg.role.as_str(),
            "content": msg.content,
        }),
        TranscriptItem::ToolCalls(calls) => json!({
            "role": "assistant",
            "content": Value::Null,
            "tool_calls": calls
                .iter()
                .map(|call| json!({
                    "id": call.id,
                    "type": "function",
                    "function": { "name": call.name, "arguments": call.arguments },
                }))
                .collect::<Vec<_>>(),
        }),
        TranscriptItem::ToolResult { call_id, content } => json!({
            "role": "tool",
            "tool_call_id": call_id,
            "content": content,
        }),
    }
}

fn tool_to_openai(tool: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

fn parse_completion(body: &Value) -> Result<Completion, ModelError> {
    let message = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| ModelError::InvalidResponse("no message in first choice".into()))?;

    let content = message
        .get("content")
        .and_then(|v| v.as_str())
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let tool_calls = message
        .get("tool_calls")
        .and_then(|v| v.as_array())
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let function = call.get("function")?;
                    Some(ToolCall {
                        id: call.get("id")?.as_str()?.to_string(),
                        name: function.get("name")?.as_str()?.to_string(),
                        arguments: function
                            .get("arguments")
                            .and_then(|v| v.as_str())
                            .unwrap_or("{}")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Completion {
        content,
        tool_calls,
    })
}
