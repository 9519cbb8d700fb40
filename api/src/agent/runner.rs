use async_trait::async_trait;
use futures_util::future::join_all;
use mi_coach_core::conversation::ConversationMessage;
use thiserror::Error;

use super::Agent;
use super::guardrail::GuardrailResult;
use super::model::{CompletionRequest, ModelError, ResponseFormat, TranscriptItem};

const DEFAULT_MAX_TURNS: usize = 10;

#[derive(Debug, Error)]
pub enum RunError {
    /// A guardrail fired; its canned reply replaces the agent's output.
    #[error("guardrail '{}' tripped", .0.guardrail)]
    GuardrailTripped(GuardrailResult),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("agent '{agent}' gave no final answer within {max_turns} turns")]
    MaxTurnsExceeded { agent: String, max_turns: usize },
}

/// Executes an agent against a conversation until it produces a final answer.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, agent: &Agent, messages: &[ConversationMessage])
    -> Result<String, RunError>;
}

pub struct Runner {
    max_turns: usize,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl Runner {
    pub fn new(max_turns: usize) -> Self {
        Self { max_turns }
    }

    /// Evaluate every input guardrail concurrently, then report the first
    /// tripped one in configured order.
    async fn check_input_guardrails(
        &self,
        agent: &Agent,
        messages: &[ConversationMessage],
    ) -> Result<(), RunError> {
        let results = join_all(
            agent
                .input_guardrails
                .iter()
                .map(|guardrail| guardrail.evaluate(messages)),
        )
        .await;

        for result in results {
            let result = result?;
            if result.tripwire_triggered {
                tracing::warn!(
                    agent = %agent.name,
                    guardrail = result.guardrail,
                    "input guardrail tripped"
                );
                return Err(RunError::GuardrailTripped(result));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AgentRunner for Runner {
    async fn run(
        &self,
        agent: &Agent,
        messages: &[ConversationMessage],
    ) -> Result<String, RunError> {
        self.check_input_guardrails(agent, messages).await?;

        let tools: Vec<_> = agent.tools.iter().map(|tool| tool.spec()).collect();
        let mut transcript = TranscriptItem::from_messages(messages);

        for turn in 0..self.max_turns {
            let completion = agent
                .model
                .complete(CompletionRequest {
                    instructions: agent.instructions.clone(),
                    transcript: transcript.clone(),
                    tools: tools.clone(),
                    response_format: ResponseFormat::Text,
                })
                .await?;

            if completion.tool_calls.is_empty() {
                return completion.content.ok_or_else(|| {
                    ModelError::InvalidResponse("final answer had no text".into()).into()
                });
            }

            tracing::debug!(
                agent = %agent.name,
                turn,
                tool_calls = completion.tool_calls.len(),
                "model requested tools"
            );
            transcript.push(TranscriptItem::ToolCalls(completion.tool_calls.clone()));

            for call in completion.tool_calls {
                let content = match agent.tool(&call.name) {
                    // Bad arguments or an empty sub-agent answer go back to the
                    // model; provider failures still end the turn.
                    Some(tool) => match tool.call(&call.arguments).await {
                        Ok(output) => output,
                        Err(ModelError::InvalidResponse(detail)) => {
                            tracing::warn!(agent = %agent.name, tool = %call.name, %detail, "tool call failed");
                            format!("Error: tool '{}' failed: {detail}", call.name)
                        }
                        Err(other) => return Err(other.into()),
                    },
                    None => {
                        tracing::warn!(agent = %agent.name, tool = %call.name, "unknown tool requested");
                        format!("Error: no tool named '{}' is available.", call.name)
                    }
                };
                transcript.push(TranscriptItem::ToolResult {
                    call_id: call.id,
                    content,
                });
            }
        }

        Err(RunError::MaxTurnsExceeded {
            agent: agent.name.clone(),
            max_turns: self.max_turns,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::agent::guardrail::Guardrail;
    use crate::agent::model::{ChatModel, Completion, ToolCall};
    use crate::agent::tool::{AgentTool, SENSING_TOOL_NAME};

    struct FixedGuardrail {
        name: &'static str,
        trips: bool,
    }

    #[async_trait]
    impl Guardrail for FixedGuardrail {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn evaluate(
            &self,
            _conversation: &[ConversationMessage],
        ) -> Result<GuardrailResult, ModelError> {
            Ok(GuardrailResult {
                guardrail: self.name,
                tripwire_triggered: self.trips,
                output_info: format!("{} says stop", self.name),
            })
        }
    }

    /// Replays queued completions; records every request.
    #[derive(Default)]
    struct QueueModel {
        replies: Mutex<VecDeque<Completion>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl QueueModel {
        fn with(replies: Vec<Completion>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for QueueModel {
        async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.replies.lock().unwrap().pop_front().unwrap_or(Completion {
                content: Some("fallback".to_string()),
                tool_calls: Vec::new(),
            }))
        }
    }

    fn text(content: &str) -> Completion {
        Completion {
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
        }
    }

    fn tool_call(name: &str, arguments: &str) -> Completion {
        Completion {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }

    fn conversation() -> Vec<ConversationMessage> {
        vec![ConversationMessage::user("I keep skipping my walks.")]
    }

    #[tokio::test]
    async fn first_configured_guardrail_wins() {
        let model = QueueModel::with(vec![text("never used")]);
        let agent = Agent::new("MI Agent", "counsel", model.clone())
            .with_guardrail(Arc::new(FixedGuardrail {
                name: "first",
                trips: true,
            }))
            .with_guardrail(Arc::new(FixedGuardrail {
                name: "second",
                trips: true,
            }));

        let err = Runner::default()
            .run(&agent, &conversation())
            .await
            .expect_err("guardrail must trip");
        match err {
            RunError::GuardrailTripped(result) => {
                assert_eq!(result.guardrail, "first");
                assert_eq!(result.output_info, "first says stop");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_guardrail_trips_when_earlier_passes() {
        let model = QueueModel::with(vec![]);
        let agent = Agent::new("MI Agent", "counsel", model)
            .with_guardrail(Arc::new(FixedGuardrail {
                name: "first",
                trips: false,
            }))
            .with_guardrail(Arc::new(FixedGuardrail {
                name: "second",
                trips: true,
            }));

        let err = Runner::default().run(&agent, &conversation()).await.unwrap_err();
        assert!(matches!(err, RunError::GuardrailTripped(r) if r.guardrail == "second"));
    }

    #[tokio::test]
    async fn passing_guardrails_let_the_agent_answer() {
        let model = QueueModel::with(vec![text("What gets in the way of walking?")]);
        let agent = Agent::new("MI Agent", "counsel", model.clone()).with_guardrail(Arc::new(
            FixedGuardrail {
                name: "harm",
                trips: false,
            },
        ));

        let output = Runner::default().run(&agent, &conversation()).await.unwrap();
        assert_eq!(output, "What gets in the way of walking?");

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].instructions, "counsel");
        assert_eq!(requests[0].transcript.len(), 1);
    }

    #[tokio::test]
    async fn tool_results_are_fed_back_to_the_model() {
        let model = QueueModel::with(vec![
            tool_call(SENSING_TOOL_NAME, r#"{"input":"step trend"}"#),
            text("sensing summary"),
            text("Your steps dipped this week. What changed?"),
        ]);
        let sensing = Agent::new("Sensing Agent", "read the data", model.clone());
        let agent = Agent::new("MI Agent", "counsel", model.clone()).with_tool(Arc::new(
            AgentTool::new(SENSING_TOOL_NAME, "sensing", sensing),
        ));

        let output = Runner::default().run(&agent, &conversation()).await.unwrap();
        assert_eq!(output, "Your steps dipped this week. What changed?");

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[1].instructions, "read the data");
        let last = &requests[2].transcript;
        assert_eq!(last.len(), 3);
        assert_eq!(
            last[2],
            TranscriptItem::ToolResult {
                call_id: "call_1".to_string(),
                content: "sensing summary".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_tool_gets_error_result() {
        let model = QueueModel::with(vec![tool_call("weather", "{}"), text("Let's get back to you.")]);
        let agent = Agent::new("MI Agent", "counsel", model.clone());

        let output = Runner::default().run(&agent, &conversation()).await.unwrap();
        assert_eq!(output, "Let's get back to you.");
        let requests = model.requests.lock().unwrap();
        match &requests[1].transcript[2] {
            TranscriptItem::ToolResult { content, .. } => assert!(content.contains("weather")),
            other => panic!("unexpected transcript item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_tool_arguments_are_reported_back_to_the_model() {
        let model = QueueModel::with(vec![
            tool_call(SENSING_TOOL_NAME, r#"{"query":"sleep"}"#),
            text("How has your sleep felt lately?"),
        ]);
        let sensing = Agent::new("Sensing Agent", "read the data", model.clone());
        let agent = Agent::new("MI Agent", "counsel", model.clone()).with_tool(Arc::new(
            AgentTool::new(SENSING_TOOL_NAME, "sensing", sensing),
        ));

        let output = Runner::default().run(&agent, &conversation()).await.unwrap();
        assert_eq!(output, "How has your sleep felt lately?");

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        match &requests[1].transcript[2] {
            TranscriptItem::ToolResult { call_id, content } => {
                assert_eq!(call_id, "call_1");
                assert!(content.starts_with("Error:"));
                assert!(content.contains("input"));
            }
            other => panic!("unexpected transcript item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_failure_inside_a_tool_ends_the_turn() {
        struct RejectingSubModel;

        #[async_trait]
        impl ChatModel for RejectingSubModel {
            async fn complete(
                &self,
                _request: CompletionRequest,
            ) -> Result<Completion, ModelError> {
                Err(ModelError::Rejected {
                    message: "content_filter".to_string(),
                })
            }
        }

        let model = QueueModel::with(vec![tool_call(SENSING_TOOL_NAME, r#"{"input":"steps"}"#)]);
        let sensing = Agent::new("Sensing Agent", "read the data", Arc::new(RejectingSubModel));
        let agent = Agent::new("MI Agent", "counsel", model).with_tool(Arc::new(AgentTool::new(
            SENSING_TOOL_NAME,
            "sensing",
            sensing,
        )));

        let err = Runner::default().run(&agent, &conversation()).await.unwrap_err();
        assert!(matches!(err, RunError::Model(ModelError::Rejected { .. })));
    }

    #[tokio::test]
    async fn endless_tool_calls_hit_the_turn_limit() {
        let model = QueueModel::with(vec![
            tool_call("weather", "{}"),
            tool_call("weather", "{}"),
            tool_call("weather", "{}"),
        ]);
        let agent = Agent::new("MI Agent", "counsel", model);

        let err = Runner::new(2).run(&agent, &conversation()).await.unwrap_err();
        assert!(matches!(err, RunError::MaxTurnsExceeded { max_turns: 2, .. }));
    }
}
