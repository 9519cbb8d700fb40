//! `AppJson<T>` replaces `axum::Json<T>` in handler signatures so that body
//! rejections come back as structured `AppError` JSON instead of axum's
//! plain-text 4xx responses.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Convert a `JsonRejection` to `AppError::Validation`, naming the offending
/// field when serde reports one.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field = field_from_serde_message(&body_text).unwrap_or_else(|| "body".to_string());

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field),
        received: None,
        docs_hint: Some(
            "Send a JSON object with a `messages` array of {role, content} entries. \
             See /swagger-ui for the full schema."
                .to_string(),
        ),
    }
}

/// Pull a field name out of serde's "missing field `x`" and
/// "unknown field `x`" messages.
fn field_from_serde_message(msg: &str) -> Option<String> {
    ["missing field `", "unknown field `"]
        .iter()
        .find_map(|marker| {
            let after = &msg[msg.find(marker)? + marker.len()..];
            let end = after.find('`')?;
            Some(after[..end].to_string())
        })
}
