use std::sync::Arc;

use sqlx::PgPool;

use crate::agent::handler::ConversationHandler;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub conversations: Arc<ConversationHandler>,
}
