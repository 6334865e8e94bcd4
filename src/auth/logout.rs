use std::sync::Arc;

use axum::{
    debug_handler,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse},
};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    config::Config,
    db,
    session::{removal_cookie, token_from_headers},
    ApiResponse, AppResult, AppState,
};

#[debug_handler(state = AppState)]
pub(crate) async fn logout(
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    if let Some(token) = token_from_headers(&headers) {
        let closed = db::sessions::deactivate(&db_pool, &token).await?;
        info!("logout closed {closed} session(s)");
    }

    Ok((
        AppendHeaders([(SET_COOKIE, removal_cookie(config.is_production()))]),
        ApiResponse::ok("Logged out successfully"),
    ))
}
