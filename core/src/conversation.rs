use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::health::HealthData;

/// Who authored a message in the conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the ordered conversation history sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Which guardrails and tools an agent instance is built with.
///
/// `Default` mirrors the wire defaults: both guardrails on, sensing off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityRequest {
    pub use_harm_guardrail: bool,
    pub use_mi_check_guardrail: bool,
    pub use_sensing_agent: bool,
}

impl CapabilityRequest {
    /// No guardrails and no tools. The only configuration that is shared
    /// across requests.
    pub const NONE: Self = Self {
        use_harm_guardrail: false,
        use_mi_check_guardrail: false,
        use_sensing_agent: false,
    };

    /// True when any guardrail or tool is requested.
    pub fn requests_any(&self) -> bool {
        self.use_harm_guardrail || self.use_mi_check_guardrail || self.use_sensing_agent
    }
}

impl Default for CapabilityRequest {
    fn default() -> Self {
        Self {
            use_harm_guardrail: true,
            use_mi_check_guardrail: true,
            use_sensing_agent: false,
        }
    }
}

/// Body of `POST /v1/chat`.
///
/// `messages` is optional at the type level so that its absence can be
/// reported as a missing field instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Full conversation so far, oldest first
    #[serde(default)]
    pub messages: Option<Vec<ConversationMessage>>,
    /// Run the self-harm classifier before answering (default: true)
    #[serde(default = "default_true")]
    pub use_harm_guardrail: bool,
    /// Run the on-topic classifier before answering (default: true)
    #[serde(default = "default_true")]
    pub use_mi_check_guardrail: bool,
    /// Give the counsellor access to the sensing expert tool (default: false)
    #[serde(default)]
    pub use_sensing_agent: bool,
    /// Device metrics to summarize into the conversation
    #[serde(default)]
    pub health_data: Option<HealthData>,
    /// Replaces the sensing expert's instructions for this request only
    #[serde(default)]
    pub sensing_prompt: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ChatRequest {
    pub const REQUIRED_FIELDS: &'static [&'static str] = &["messages"];

    pub fn capabilities(&self) -> CapabilityRequest {
        CapabilityRequest {
            use_harm_guardrail: self.use_harm_guardrail,
            use_mi_check_guardrail: self.use_mi_check_guardrail,
            use_sensing_agent: self.use_sensing_agent,
        }
    }

    /// Names of required fields absent from this request, in declaration order.
    pub fn missing_fields(&self) -> Vec<String> {
        Self::REQUIRED_FIELDS
            .iter()
            .filter(|field| match **field {
                "messages" => self.messages.is_none(),
                _ => false,
            })
            .map(|field| field.to_string())
            .collect()
    }
}

/// Successful reply: either the counsellor's answer or a guardrail's canned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}

/// Failure reply for `POST /v1/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatErrorResponse {
    pub error: String,
    /// Required request fields that were absent (omitted when empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}
