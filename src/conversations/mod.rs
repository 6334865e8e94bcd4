mod list;
mod msg;

use axum::{routing::get, Router};
use uuid::Uuid;

use crate::{AppError, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/conversations", get(list::conversations))
        .route("/api/conversations/{conversation_id}", get(list::conversation))
        .route(
            "/api/conversations/{conversation_id}/messages",
            get(msg::messages).post(msg::send_msg),
        )
}

const NOT_FOUND: AppError = AppError::NotFound("Conversation not found or access denied");

/// Path ids that don't parse name no conversation the caller can see.
fn conversation_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| NOT_FOUND)
}
