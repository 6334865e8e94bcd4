use axum::{debug_handler, extract::State};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{self, connections::ConnectionStatus},
    email::Mailer,
    extract::{Json, Path},
    session::CurrentUser,
    ApiResponse, AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct Answer {
    status: ConnectionStatus,
}

/// The receiver answers a pending request. Accepting opens the pair's
/// conversation and lets the sender know.
#[debug_handler(state = AppState)]
pub(crate) async fn respond(
    Path(request_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(mailer): State<Mailer>,
    CurrentUser(user): CurrentUser,
    Json(Answer { status }): Json<Answer>,
) -> AppResult<ApiResponse> {
    const NOT_FOUND: AppError = AppError::NotFound("Connection request not found");
    const ANSWERED: AppError = AppError::BadRequest("Request has already been responded to");

    let Ok(request_id) = Uuid::parse_str(&request_id) else {
        return Err(NOT_FOUND);
    };
    let Some(mut request) = db::connections::find(&db_pool, request_id).await? else {
        return Err(NOT_FOUND);
    };

    if request.receiver_id != user.id {
        return Err(AppError::Forbidden("You can only respond to requests sent to you"));
    }
    if request.status != ConnectionStatus::Pending {
        return Err(ANSWERED);
    }
    if status == ConnectionStatus::Pending {
        return Err(AppError::BadRequest("A request cannot be answered with pending"));
    }

    let responded_at = db::now();
    if !db::connections::respond(&db_pool, request.id, status, responded_at).await? {
        return Err(ANSWERED);
    }
    request.status = status;
    request.responded_at = Some(responded_at);
    info!("connection request {} {}", request.id, status.as_str());

    if status == ConnectionStatus::Accepted {
        let opened = db::conversations::create_for_pair(&db_pool, request.sender_id, request.receiver_id).await?;
        if opened {
            info!("conversation opened between {} and {}", request.sender_id, request.receiver_id);
        }

        if let Some(sender) = db::users::find_by_id(&db_pool, request.sender_id).await? {
            mailer.send_connection_accepted(&sender, &user.name).await;
        }
    }

    Ok(
        ApiResponse::ok(format!("Connection request {} successfully", status.as_str()))
            .with_data(json!({ "request": request })),
    )
}
