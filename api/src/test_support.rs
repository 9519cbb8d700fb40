//! Router-level test fixtures: app state with a scripted runner and a pool
//! that never connects.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mi_coach_core::conversation::ConversationMessage;
use sqlx::postgres::PgPoolOptions;

use crate::agent::Agent;
use crate::agent::builder::AgentBuilder;
use crate::agent::cache::AgentCache;
use crate::agent::handler::ConversationHandler;
use crate::agent::runner::{AgentRunner, RunError};
use crate::agent::testing::FakeModel;
use crate::state::AppState;

pub struct StubRunner {
    reply: Option<String>,
    failure: Option<fn() -> RunError>,
}

impl StubRunner {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            failure: None,
        }
    }

    pub fn failing(failure: fn() -> RunError) -> Self {
        Self {
            reply: None,
            failure: Some(failure),
        }
    }
}

#[async_trait]
impl AgentRunner for StubRunner {
    async fn run(
        &self,
        _agent: &Agent,
        _messages: &[ConversationMessage],
    ) -> Result<String, RunError> {
        match (self.failure, &self.reply) {
            (Some(failure), _) => Err(failure()),
            (None, reply) => Ok(reply.clone().unwrap_or_default()),
        }
    }
}

pub fn state_with_runner(runner: Arc<dyn AgentRunner>) -> AppState {
    // Port 1 refuses connections, so any query fails fast.
    let db = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy("postgres://mi_coach@127.0.0.1:1/mi_coach")
        .expect("lazy pool should build");

    let model = Arc::new(FakeModel::replying("unused"));
    let cache = Arc::new(AgentCache::new(Arc::new(AgentBuilder::new(model))));
    AppState {
        db,
        conversations: Arc::new(ConversationHandler::new(cache, runner)),
    }
}

pub fn state_with_runner_reply(reply: &str) -> AppState {
    state_with_runner(Arc::new(StubRunner::replying(reply)))
}
