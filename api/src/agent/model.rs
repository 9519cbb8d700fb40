use async_trait::async_trait;
use mi_coach_core::conversation::ConversationMessage;
use thiserror::Error;

/// Failures reported by a model binding.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider refused the call outright (HTTP 400). Azure's content
    /// filter answers this way, so callers treat it as a safety signal.
    #[error("model provider rejected the request: {message}")]
    Rejected { message: String },
    #[error("model provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("model transport failure: {0}")]
    Transport(String),
    #[error("model returned an unusable response: {0}")]
    InvalidResponse(String),
    /// Credentials or endpoint missing. Surfaces on first call, not at build time.
    #[error("model binding is not configured: {0}")]
    Configuration(String),
}

/// A function call the model asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model
    pub arguments: String,
}

/// A callable function advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object
    pub parameters: serde_json::Value,
}

/// One entry of the transcript sent to the model. Superset of the
/// client-visible history: tool traffic only exists inside a run.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptItem {
    Message(ConversationMessage),
    ToolCalls(Vec<ToolCall>),
    ToolResult { call_id: String, content: String },
}

impl TranscriptItem {
    pub fn from_messages(messages: &[ConversationMessage]) -> Vec<Self> {
        messages.iter().cloned().map(Self::Message).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub instructions: String,
    pub transcript: Vec<TranscriptItem>,
    pub tools: Vec<ToolSpec>,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// A language-model binding. Agents hold one and never look inside it.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError>;
}
