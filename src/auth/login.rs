use axum::{
    debug_handler,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse},
};
use rand::{distr::Alphanumeric, Rng};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::{
    config::Config,
    db::{self, users::User},
    session::{session_cookie, SESSION_ID_HEADER},
    ApiResponse, AppError, AppResult, AppState,
};

use super::SessionService;

const DEV_EMAIL: &str = "dev@localhost.com";
const DEV_PICTURE: &str = "https://ui-avatars.com/api/?name=Dev+User";

#[debug_handler(state = AppState)]
pub(crate) async fn session(
    State(db_pool): State<SqlitePool>,
    State(sessions): State<SessionService>,
    State(config): State<Arc<Config>>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let Some(session_id) = headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    else {
        return Err(AppError::BadRequest("Session ID required in X-Session-ID header"));
    };

    let Some(data) = sessions.fetch(session_id).await else {
        return Err(AppError::Unauthorized("Invalid session ID"));
    };

    let (user, created) =
        db::users::get_or_create(&db_pool, &data.email, &data.name, data.picture.as_deref()).await?;
    let user_session = db::sessions::replace_for_user(&db_pool, user.id, &data.session_token).await?;

    info!(
        "user {} {}: onboarding_completed={}",
        user.email,
        if created { "created" } else { "logged in" },
        user.onboarding_completed,
    );

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&data.session_token, config.is_production()))]),
        ApiResponse::ok("Authentication successful").with_data(json!({
            "user": user,
            "expires_at": user_session.expires_at.format(&Rfc3339).map_err(anyhow::Error::from)?,
        })),
    ))
}

/// Development-only shortcut that skips the session service and starts a
/// brand-new user at the beginning of onboarding.
#[debug_handler(state = AppState)]
pub(crate) async fn dev_login(
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
) -> AppResult<impl IntoResponse> {
    if config.is_production() {
        return Err(AppError::Forbidden("Development login is only available in development mode"));
    }

    db::users::delete_by_email(&db_pool, DEV_EMAIL).await?;
    let user = User::new(DEV_EMAIL, "", Some(DEV_PICTURE));
    db::users::insert(&db_pool, &user).await?;

    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect();
    let user_session = db::sessions::replace_for_user(&db_pool, user.id, &token).await?;
    info!("dev login as {}", user.id);

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&token, false))]),
        ApiResponse::ok("Development login successful").with_data(json!({
            "user": user,
            "expires_at": user_session.expires_at.format(&Rfc3339).map_err(anyhow::Error::from)?,
        })),
    ))
}
