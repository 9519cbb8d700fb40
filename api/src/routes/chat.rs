use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use mi_coach_core::conversation::{ChatErrorResponse, ChatRequest, ChatResponse};

use crate::agent::handler::ChatOutcome;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/chat", post(chat))
}

/// Run one counsellor turn over the supplied conversation.
///
/// Guardrail trips are not errors: the canned reply comes back as a normal
/// `200` response so the client renders it like any other message.
#[utoipa::path(
    post,
    path = "/v1/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Counsellor reply or guardrail response", body = ChatResponse),
        (status = 400, description = "Required fields missing", body = ChatErrorResponse),
        (status = 429, description = "Rate limited", body = mi_coach_core::error::ApiError),
        (status = 500, description = "Agent run failed", body = ChatErrorResponse)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    AppJson(req): AppJson<ChatRequest>,
) -> Result<Response, AppError> {
    let response = match state.conversations.handle(req).await? {
        ChatOutcome::Reply(response) => {
            (StatusCode::OK, Json(ChatResponse { response })).into_response()
        }
        ChatOutcome::MissingFields(missing_fields) => (
            StatusCode::BAD_REQUEST,
            Json(ChatErrorResponse {
                error: format!("Missing required fields: {}", missing_fields.join(", ")),
                missing_fields,
            }),
        )
            .into_response(),
        ChatOutcome::Failed(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ChatErrorResponse {
                error,
                missing_fields: Vec::new(),
            }),
        )
            .into_response(),
    };
    Ok(response)
}
