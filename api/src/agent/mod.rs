//! Counsellor agent: construction, caching, guarded execution, and the
//! chat-request handler that ties them together.
//!
//! Request flow:
//! 1. `handler::ConversationHandler` validates the payload and appends the
//!    health-data context message.
//! 2. `cache::AgentCache` hands out the shared guardrail-free agent or asks
//!    `builder::AgentBuilder` for a fresh one.
//! 3. `runner::Runner` evaluates input guardrails, then drives the model and
//!    any tool calls to a final answer.

pub mod builder;
pub mod cache;
pub mod guardrail;
pub mod handler;
pub mod model;
pub mod openai;
pub mod runner;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::sync::Arc;

use guardrail::Guardrail;
use model::ChatModel;
use tool::Tool;

/// A configured conversational policy. Immutable once built; shared as `Arc<Agent>`.
pub struct Agent {
    pub name: String,
    pub instructions: String,
    pub model: Arc<dyn ChatModel>,
    /// Evaluated in order; the first tripped result wins
    pub input_guardrails: Vec<Arc<dyn Guardrail>>,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model,
            input_guardrails: Vec::new(),
            tools: Vec::new(),
        }
    }

    pub fn with_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.input_guardrails.push(guardrail);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.spec().name == name)
    }

    pub fn guardrail_names(&self) -> Vec<&'static str> {
        self.input_guardrails.iter().map(|g| g.name()).collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.spec().name).collect()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("input_guardrails", &self.guardrail_names())
            .field("tools", &self.tool_names())
            .finish_non_exhaustive()
    }
}
