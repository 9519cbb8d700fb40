use std::sync::Arc;

use mi_coach_core::conversation::CapabilityRequest;
use mi_coach_core::prompts::{
    MI_PROMPT, SENSING_MI_ADDITIONS, SENSING_PROMPT, SENSING_TOOL_DESCRIPTION,
};

use super::Agent;
use super::guardrail::{HarmGuardrail, OnTopicGuardrail};
use super::model::ChatModel;
use super::tool::{AgentTool, SENSING_TOOL_NAME};

pub const MI_AGENT_NAME: &str = "MI Agent";
pub const SENSING_AGENT_NAME: &str = "Sensing Agent";

/// Produces agents for a capability set. Construction only: implementations
/// must not call the model.
pub trait AgentFactory: Send + Sync {
    fn build(&self, capabilities: CapabilityRequest, sensing_prompt: Option<&str>) -> Agent;
}

/// Builds the counsellor agent, its guardrails, and the optional sensing expert,
/// all bound to the same model.
pub struct AgentBuilder {
    model: Arc<dyn ChatModel>,
}

impl AgentBuilder {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

impl AgentFactory for AgentBuilder {
    fn build(&self, capabilities: CapabilityRequest, sensing_prompt: Option<&str>) -> Agent {
        let mut instructions = MI_PROMPT.to_string();
        if capabilities.use_sensing_agent {
            instructions.push_str(SENSING_MI_ADDITIONS);
        }

        let mut agent = Agent::new(MI_AGENT_NAME, instructions, self.model.clone());

        // Order decides which canned reply wins when several trip.
        if capabilities.use_harm_guardrail {
            agent = agent.with_guardrail(Arc::new(HarmGuardrail::new(self.model.clone())));
        }
        if capabilities.use_mi_check_guardrail {
            agent = agent.with_guardrail(Arc::new(OnTopicGuardrail::new(self.model.clone())));
        }

        if capabilities.use_sensing_agent {
            let sensing_instructions = sensing_prompt
                .map(str::trim)
                .filter(|prompt| !prompt.is_empty())
                .unwrap_or(SENSING_PROMPT);
            let sensing_agent =
                Agent::new(SENSING_AGENT_NAME, sensing_instructions, self.model.clone());
            agent = agent.with_tool(Arc::new(AgentTool::new(
                SENSING_TOOL_NAME,
                SENSING_TOOL_DESCRIPTION,
                sensing_agent,
            )));
        }

        agent
    }
}
