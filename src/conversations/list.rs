use axum::{debug_handler, extract::State};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    db,
    extract::{Path, Query},
    session::CurrentUser,
    ApiResponse, AppResult, AppState, PageQuery,
};

use super::{conversation_id, NOT_FOUND};

#[debug_handler(state = AppState)]
pub(crate) async fn conversations(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse> {
    let page = query.page(10, 50)?;

    let conversations = db::conversations::list_details(&db_pool, user.id, page.skip, page.limit).await?;
    let total = db::conversations::count_active(&db_pool, user.id).await?;

    Ok(ApiResponse::ok("Conversations retrieved successfully").with_data(json!({
        "conversations": conversations,
        "pagination": page.pagination(total),
    })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn conversation(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
) -> AppResult<ApiResponse> {
    let id = conversation_id(&id)?;
    let Some(conversation) = db::conversations::detail(&db_pool, id, user.id).await? else {
        return Err(NOT_FOUND);
    };

    Ok(ApiResponse::ok("Conversation details retrieved successfully")
        .with_data(json!({ "conversation": conversation })))
}
