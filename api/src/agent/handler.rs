use std::sync::Arc;

use mi_coach_core::conversation::ChatRequest;
use mi_coach_core::prompts::HARM_RESPONSE;

use super::cache::{AgentCache, ConfigurationError};
use super::model::ModelError;
use super::runner::{AgentRunner, RunError};

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// What a chat request resolves to. Guardrail trips are ordinary replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Reply(String),
    MissingFields(Vec<String>),
    Failed(String),
}

/// Validates a chat payload, picks an agent, runs it, and folds every
/// run outcome into a [`ChatOutcome`].
pub struct ConversationHandler {
    cache: Arc<AgentCache>,
    runner: Arc<dyn AgentRunner>,
}

impl ConversationHandler {
    pub fn new(cache: Arc<AgentCache>, runner: Arc<dyn AgentRunner>) -> Self {
        Self { cache, runner }
    }

    /// Only wiring defects escape as `Err`; everything else becomes an outcome.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatOutcome, ConfigurationError> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Ok(ChatOutcome::MissingFields(missing));
        }

        let capabilities = request.capabilities();
        let ChatRequest {
            messages,
            health_data,
            sensing_prompt,
            ..
        } = request;
        let mut messages = messages.unwrap_or_default();
        if let Some(health) = health_data {
            messages.push(health.to_system_message());
        }

        let agent = self
            .cache
            .get_or_create(capabilities, sensing_prompt.as_deref())
            .await?;

        tracing::info!(
            agent = %agent.name,
            messages = messages.len(),
            guardrails = ?agent.guardrail_names(),
            "running chat turn"
        );

        let outcome = match self.runner.run(&agent, &messages).await {
            Ok(reply) => ChatOutcome::Reply(reply),
            Err(RunError::GuardrailTripped(result)) => ChatOutcome::Reply(result.output_info),
            Err(RunError::Model(ModelError::Rejected { message })) => {
                tracing::warn!(%message, "model provider rejected the request");
                ChatOutcome::Reply(HARM_RESPONSE.to_string())
            }
            Err(error) => {
                tracing::error!(error = %error, "chat turn failed");
                ChatOutcome::Failed(INTERNAL_ERROR_MESSAGE.to_string())
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mi_coach_core::conversation::{ConversationMessage, Role};
    use mi_coach_core::health::{HealthData, HeartRateRange};
    use mi_coach_core::prompts::MI_CHECK_RESPONSE;

    use super::*;
    use crate::agent::Agent;
    use crate::agent::runner::Runner;
    use crate::agent::testing::{CountingFactory, FakeModel};

    /// Records the messages it was given, then replies with a fixed result.
    struct StubRunner {
        seen: Mutex<Vec<Vec<ConversationMessage>>>,
        result: fn() -> Result<String, RunError>,
    }

    impl StubRunner {
        fn new(result: fn() -> Result<String, RunError>) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                result,
            })
        }
    }

    #[async_trait]
    impl AgentRunner for StubRunner {
        async fn run(
            &self,
            _agent: &Agent,
            messages: &[ConversationMessage],
        ) -> Result<String, RunError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            (self.result)()
        }
    }

    fn handler_with(
        model: FakeModel,
        runner: Arc<dyn AgentRunner>,
    ) -> (ConversationHandler, Arc<CountingFactory>) {
        let factory = Arc::new(CountingFactory::new(Arc::new(model)));
        let cache = Arc::new(AgentCache::new(factory.clone()));
        (ConversationHandler::new(cache, runner), factory)
    }

    fn request(messages: Vec<ConversationMessage>) -> ChatRequest {
        ChatRequest {
            messages: Some(messages),
            use_harm_guardrail: true,
            use_mi_check_guardrail: true,
            ..ChatRequest::default()
        }
    }

    #[tokio::test]
    async fn missing_messages_never_builds_an_agent() {
        let runner = StubRunner::new(|| Ok("unused".to_string()));
        let (handler, factory) = handler_with(FakeModel::replying("unused"), runner.clone());

        let outcome = handler.handle(ChatRequest::default()).await.unwrap();
        assert_eq!(
            outcome,
            ChatOutcome::MissingFields(vec!["messages".to_string()])
        );
        assert_eq!(factory.builds(), 0);
        assert!(runner.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_context_is_appended_after_the_last_message() {
        let runner = StubRunner::new(|| Ok("Tell me more.".to_string()));
        let (handler, _) = handler_with(FakeModel::replying("unused"), runner.clone());

        let mut req = request(vec![
            ConversationMessage::system("be kind"),
            ConversationMessage::user("I slept badly."),
        ]);
        req.health_data = Some(HealthData {
            body_fat_percentage: Some(23.5),
            heart_rate: Some(HeartRateRange {
                min: Some(54.0),
                max: Some(121.0),
            }),
            step_count: Some(8421.0),
            active_energy_kcal: Some(512.3),
            flights_climbed: None,
            sleep_hours: Some(6.5),
        });

        let outcome = handler.handle(req).await.unwrap();
        assert_eq!(outcome, ChatOutcome::Reply("Tell me more.".to_string()));

        let seen = runner.seen.lock().unwrap();
        let sent = &seen[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].content, "be kind");
        assert_eq!(sent[1].content, "I slept badly.");
        let context = &sent[2];
        assert_eq!(context.role, Role::System);
        let lines: Vec<&str> = context.content.lines().collect();
        assert!(lines.contains(&"Body fat percentage: 23.5%"));
        assert!(lines.contains(&"Step count: 8421 steps"));
        assert!(lines.contains(&"Sleep: 6.5 hours"));
        assert!(lines.contains(&"Flights climbed: N/A"));
    }

    #[tokio::test]
    async fn rejected_request_answers_with_harm_response() {
        let runner = StubRunner::new(|| {
            Err(RunError::Model(ModelError::Rejected {
                message: "content_filter".to_string(),
            }))
        });
        let (handler, _) = handler_with(FakeModel::replying("unused"), runner);

        let outcome = handler
            .handle(request(vec![ConversationMessage::user("hi")]))
            .await
            .unwrap();
        assert_eq!(outcome, ChatOutcome::Reply(HARM_RESPONSE.to_string()));
    }

    #[tokio::test]
    async fn other_failures_are_opaque() {
        let runner = StubRunner::new(|| {
            Err(RunError::Model(ModelError::Provider {
                status: 503,
                message: "deployment overloaded".to_string(),
            }))
        });
        let (handler, _) = handler_with(FakeModel::replying("unused"), runner);

        let outcome = handler
            .handle(request(vec![ConversationMessage::user("hi")]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ChatOutcome::Failed(INTERNAL_ERROR_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn harm_reply_wins_when_both_guardrails_trip() {
        let model = FakeModel {
            harm: true,
            off_topic: true,
            ..FakeModel::replying("should not be used")
        };
        let (handler, _) = handler_with(model, Arc::new(Runner::default()));

        let outcome = handler
            .handle(request(vec![ConversationMessage::user("tell me about bridges")]))
            .await
            .unwrap();
        assert_eq!(outcome, ChatOutcome::Reply(HARM_RESPONSE.to_string()));
    }

    #[tokio::test]
    async fn off_topic_reply_when_only_topic_guardrail_trips() {
        let model = FakeModel {
            off_topic: true,
            ..FakeModel::replying("should not be used")
        };
        let (handler, _) = handler_with(model, Arc::new(Runner::default()));

        let outcome = handler
            .handle(request(vec![ConversationMessage::user("what's 2+2?")]))
            .await
            .unwrap();
        assert_eq!(outcome, ChatOutcome::Reply(MI_CHECK_RESPONSE.to_string()));
    }

    #[tokio::test]
    async fn rejecting_model_end_to_end_yields_harm_response() {
        let model = FakeModel {
            reject: true,
            ..FakeModel::replying("unused")
        };
        let (handler, _) = handler_with(model, Arc::new(Runner::default()));

        let outcome = handler
            .handle(request(vec![ConversationMessage::user("hi")]))
            .await
            .unwrap();
        assert_eq!(outcome, ChatOutcome::Reply(HARM_RESPONSE.to_string()));
    }

    #[tokio::test]
    async fn unconfigured_cache_propagates() {
        let handler = ConversationHandler::new(
            Arc::new(AgentCache::unconfigured()),
            StubRunner::new(|| Ok("unused".to_string())),
        );
        let err = handler
            .handle(request(vec![ConversationMessage::user("hi")]))
            .await
            .expect_err("no builder wired");
        assert!(matches!(err, ConfigurationError::BuilderNotRegistered));
    }
}
