use axum::{debug_handler, extract::State};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{
    db::{self, messages::Message},
    email::Mailer,
    extract::{Json, Path, Query},
    session::CurrentUser,
    ApiResponse, AppError, AppResult, AppState, PageQuery,
};

use super::{conversation_id, NOT_FOUND};

/// Newest page of a conversation, oldest first. Reading it marks what the
/// other participant sent as read.
#[debug_handler(state = AppState)]
pub(crate) async fn messages(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse> {
    let page = query.page(50, 100)?;
    let id = conversation_id(&id)?;
    if db::conversations::find_for_participant(&db_pool, id, user.id).await?.is_none() {
        return Err(NOT_FOUND);
    }

    let messages = db::messages::page(&db_pool, id, page.skip, page.limit).await?;
    let read = db::messages::mark_read(&db_pool, id, user.id).await?;
    if read > 0 {
        debug!("{} marked {read} message(s) read in {id}", user.id);
    }
    let total = db::messages::count(&db_pool, id).await?;

    Ok(ApiResponse::ok("Messages retrieved successfully").with_data(json!({
        "messages": messages,
        "pagination": page.pagination(total),
    })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessage {
    content: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn send_msg(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(mailer): State<Mailer>,
    CurrentUser(user): CurrentUser,
    Json(SendMessage { content }): Json<SendMessage>,
) -> AppResult<ApiResponse> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Message content cannot be empty"));
    }

    let id = conversation_id(&id)?;
    let Some(conversation) = db::conversations::find_for_participant(&db_pool, id, user.id).await? else {
        return Err(NOT_FOUND);
    };

    let other_id = conversation.other_participant(user.id);
    if !db::connections::are_connected(&db_pool, user.id, other_id).await? {
        return Err(AppError::Forbidden("Cannot send message - connection not established"));
    }

    let message = Message::new(id, user.id, content.to_owned());
    db::messages::insert(&db_pool, &message).await?;
    db::conversations::touch(&db_pool, id, message.timestamp).await?;
    info!("message {} sent in {id}", message.id);

    if let Some(receiver) = db::users::find_by_id(&db_pool, other_id).await? {
        mailer.send_new_message(&receiver, &user.name, &message.content, id).await;
    }

    Ok(ApiResponse::ok("Message sent successfully").with_data(json!({ "message": message })))
}
