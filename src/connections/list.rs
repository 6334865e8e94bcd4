use axum::{debug_handler, extract::State};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    db::{self, connections::Listing},
    extract::Query,
    session::CurrentUser,
    ApiResponse, AppResult, AppState, PageQuery,
};

async fn listing(
    db_pool: &SqlitePool,
    user: &CurrentUser,
    listing: Listing,
    query: PageQuery,
) -> AppResult<(serde_json::Value, serde_json::Value)> {
    let page = query.page(10, 50)?;
    let user_id = user.0.id;

    let requests = db::connections::list(db_pool, user_id, listing, page.skip, page.limit).await?;
    let total = db::connections::count(db_pool, user_id, listing).await?;

    Ok((json!(requests), page.pagination(total)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn received(
    State(db_pool): State<SqlitePool>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse> {
    let (requests, pagination) = listing(&db_pool, &user, Listing::Received, query).await?;
    Ok(ApiResponse::ok("Received requests retrieved successfully")
        .with_data(json!({ "requests": requests, "pagination": pagination })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn sent(
    State(db_pool): State<SqlitePool>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse> {
    let (requests, pagination) = listing(&db_pool, &user, Listing::Sent, query).await?;
    Ok(ApiResponse::ok("Sent requests retrieved successfully")
        .with_data(json!({ "requests": requests, "pagination": pagination })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn established(
    State(db_pool): State<SqlitePool>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse> {
    let (connections, pagination) = listing(&db_pool, &user, Listing::Established, query).await?;
    Ok(ApiResponse::ok("Established connections retrieved successfully")
        .with_data(json!({ "connections": connections, "pagination": pagination })))
}
