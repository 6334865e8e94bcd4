use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{db, session::CurrentUser, ApiResponse, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn me(CurrentUser(user): CurrentUser) -> ApiResponse {
    ApiResponse::ok("User information retrieved").with_data(json!({ "user": user }))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OnboardingBody {
    pub(crate) name: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn complete_onboarding(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<OnboardingBody>, JsonRejection>,
) -> AppResult<ApiResponse> {
    // the body is optional, but a body that is there has to parse
    let body = match body {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => OnboardingBody::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let name = body
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty());

    db::users::complete_onboarding(&db_pool, user.id, name.as_deref()).await?;

    Ok(ApiResponse::ok("Onboarding completed successfully"))
}
