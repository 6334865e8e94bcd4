use axum::{debug_handler, extract::State};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{
    appresult::is_unique_violation,
    db::{self, connections::ConnectionRequest},
    email::Mailer,
    extract::Json,
    session::CurrentUser,
    ApiResponse, AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct SendRequest {
    receiver_id: String,
    message: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn send_request(
    State(db_pool): State<SqlitePool>,
    State(mailer): State<Mailer>,
    CurrentUser(user): CurrentUser,
    Json(SendRequest { receiver_id, message }): Json<SendRequest>,
) -> AppResult<ApiResponse> {
    const NO_RECEIVER: AppError = AppError::NotFound("User not found or profile not available");
    const DUPLICATE: AppError = AppError::BadRequest("Connection request already exists");

    let Ok(receiver_id) = Uuid::parse_str(receiver_id.trim()) else {
        return Err(NO_RECEIVER);
    };
    if receiver_id == user.id {
        return Err(AppError::BadRequest("You cannot send a connection request to yourself"));
    }

    let Some(receiver_profile) = db::profiles::find_by_user(&db_pool, receiver_id).await? else {
        return Err(NO_RECEIVER);
    };
    if !receiver_profile.is_open_for_connection {
        return Err(AppError::BadRequest("User is not open for connections"));
    }
    if db::connections::find_live_between(&db_pool, user.id, receiver_id).await?.is_some() {
        return Err(DUPLICATE);
    }

    let request = ConnectionRequest::new(user.id, receiver_id, message);
    match db::connections::insert(&db_pool, &request).await {
        Err(err) if is_unique_violation(&err) => return Err(DUPLICATE),
        other => other?,
    }
    info!("connection request {} from {} to {}", request.id, user.id, receiver_id);

    if let Some(receiver) = db::users::find_by_id(&db_pool, receiver_id).await? {
        let message = Some(request.message.trim()).filter(|message| !message.is_empty());
        mailer.send_connection_request(&receiver, &user.name, message).await;
    }

    Ok(ApiResponse::ok("Connection request sent successfully").with_data(json!({ "request": request })))
}
