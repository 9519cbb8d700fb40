use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::Uri;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod agent;
mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use agent::builder::AgentBuilder;
use agent::cache::AgentCache;
use agent::handler::ConversationHandler;
use agent::openai::AzureOpenAiModel;
use agent::runner::Runner;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MI Coach API",
        version = "0.1.0",
        description = "Motivational-interviewing chat relay with safety and on-topic guardrails."
    ),
    paths(
        routes::health::root,
        routes::health::health_check,
        routes::chat::chat,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::health::RootResponse,
        mi_coach_core::error::ApiError,
        mi_coach_core::conversation::Role,
        mi_coach_core::conversation::ConversationMessage,
        mi_coach_core::conversation::ChatRequest,
        mi_coach_core::conversation::ChatResponse,
        mi_coach_core::conversation::ChatErrorResponse,
        mi_coach_core::health::HealthData,
        mi_coach_core::health::HeartRateRange,
    ))
)]
struct ApiDoc;

async fn not_found(uri: Uri) -> error::AppError {
    error::AppError::NotFound {
        path: uri.path().to_string(),
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mi_coach_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        port = config.port,
        cors_origins = ?config.cors_origins,
        model = ?config.model,
        "configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // One model binding shared by the counsellor, both guardrails and the
    // sensing expert.
    let model = Arc::new(
        AzureOpenAiModel::new(config.model.clone()).expect("Failed to build model client"),
    );
    let cache = Arc::new(AgentCache::new(Arc::new(AgentBuilder::new(model))));
    let conversations = Arc::new(ConversationHandler::new(cache, Arc::new(Runner::default())));

    let app_state = state::AppState {
        db: pool,
        conversations,
    };

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::chat::router().layer(middleware::rate_limit::chat_layer()))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::build_cors_layer(&config.cors_origins)),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("MI Coach API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
