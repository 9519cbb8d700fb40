//! Test doubles shared by the agent module tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mi_coach_core::conversation::CapabilityRequest;
use mi_coach_core::prompts::{HARM_PROMPT, MI_CHECK_PROMPT};

use super::Agent;
use super::builder::{AgentBuilder, AgentFactory};
use super::model::{ChatModel, Completion, CompletionRequest, ModelError};

/// Answers classifier prompts with fixed verdicts and everything else with
/// a fixed reply.
pub struct FakeModel {
    pub harm: bool,
    pub off_topic: bool,
    pub reject: bool,
    pub reply: String,
    pub calls: AtomicUsize,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            harm: false,
            off_topic: false,
            reject: false,
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(ModelError::Rejected {
                message: "content_filter".to_string(),
            });
        }

        let content = if request.instructions.starts_with(HARM_PROMPT) {
            format!(r#"{{"is_harm": {}, "reasoning": "scripted"}}"#, self.harm)
        } else if request.instructions.starts_with(MI_CHECK_PROMPT) {
            format!(r#"{{"is_not_mi": {}, "reasoning": "scripted"}}"#, self.off_topic)
        } else {
            self.reply.clone()
        };

        Ok(Completion {
            content: Some(content),
            tool_calls: Vec::new(),
        })
    }
}

/// Wraps the real builder and counts how often it is asked to build.
pub struct CountingFactory {
    inner: AgentBuilder,
    builds: AtomicUsize,
}

impl CountingFactory {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            inner: AgentBuilder::new(model),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl AgentFactory for CountingFactory {
    fn build(&self, capabilities: CapabilityRequest, sensing_prompt: Option<&str>) -> Agent {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.inner.build(capabilities, sensing_prompt)
    }
}
