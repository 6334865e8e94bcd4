use axum::{debug_handler, extract::State};
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, extract::Path, session::CurrentUser, ApiResponse, AppError, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn my_profile(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
) -> AppResult<ApiResponse> {
    profile_of(&db_pool, user.id).await
}

/// Any user's profile. Ids that don't parse are simply unknown.
#[debug_handler(state = AppState)]
pub(crate) async fn user_profile(
    Path(user_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    _: CurrentUser,
) -> AppResult<ApiResponse> {
    let Ok(user_id) = Uuid::parse_str(&user_id) else {
        return Err(AppError::NotFound("Profile not found"));
    };
    profile_of(&db_pool, user_id).await
}

async fn profile_of(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<ApiResponse> {
    let Some(profile) = db::profiles::find_view_by_user(db_pool, user_id).await? else {
        return Err(AppError::NotFound("Profile not found"));
    };

    Ok(ApiResponse::ok("Profile retrieved successfully").with_data(json!({ "profile": profile })))
}
