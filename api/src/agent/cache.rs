use std::sync::Arc;

use mi_coach_core::conversation::CapabilityRequest;
use thiserror::Error;
use tokio::sync::RwLock;

use super::Agent;
use super::builder::AgentFactory;

/// Wiring defect discovered at request time. Never a client error.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no agent builder registered with the agent cache")]
    BuilderNotRegistered,
}

/// Hands out agents for a capability set.
///
/// Only the guardrail-free, tool-free agent is shared; it is built lazily on
/// first use and kept for the life of the cache. Every other configuration is
/// built fresh per request and never stored.
pub struct AgentCache {
    factory: Option<Arc<dyn AgentFactory>>,
    default_agent: RwLock<Option<Arc<Agent>>>,
}

impl AgentCache {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            factory: Some(factory),
            default_agent: RwLock::new(None),
        }
    }

    /// A cache with no builder wired in. Every lookup fails with
    /// [`ConfigurationError::BuilderNotRegistered`].
    pub fn unconfigured() -> Self {
        Self {
            factory: None,
            default_agent: RwLock::new(None),
        }
    }

    pub async fn get_or_create(
        &self,
        capabilities: CapabilityRequest,
        sensing_prompt: Option<&str>,
    ) -> Result<Arc<Agent>, ConfigurationError> {
        let factory = self
            .factory
            .as_ref()
            .ok_or(ConfigurationError::BuilderNotRegistered)?;

        if capabilities.requests_any() {
            tracing::debug!(
                use_harm_guardrail = capabilities.use_harm_guardrail,
                use_mi_check_guardrail = capabilities.use_mi_check_guardrail,
                use_sensing_agent = capabilities.use_sensing_agent,
                "building fresh agent"
            );
            return Ok(Arc::new(factory.build(capabilities, sensing_prompt)));
        }

        if let Some(agent) = self.default_agent.read().await.as_ref() {
            return Ok(agent.clone());
        }

        // The lock is not held while building: two cold requests may both
        // build, and the later write wins. Agents are interchangeable.
        tracing::debug!("building and caching default agent");
        let agent = Arc::new(factory.build(CapabilityRequest::NONE, None));
        *self.default_agent.write().await = Some(agent.clone());
        Ok(agent)
    }

    #[cfg(test)]
    pub async fn is_populated(&self) -> bool {
        self.default_agent.read().await.is_some()
    }
}
