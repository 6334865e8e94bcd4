use axum::{debug_handler, extract::State};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    db::{self, profiles::BrowseFilter},
    extract::Query,
    session::CurrentUser,
    ApiResponse, AppResult, AppState, Page,
};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BrowseQuery {
    skip: Option<i64>,
    limit: Option<i64>,
    search: Option<String>,
    location: Option<String>,
    company: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

#[debug_handler(state = AppState)]
pub(crate) async fn browse(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<BrowseQuery>,
) -> AppResult<ApiResponse> {
    let page = Page::from_query(query.skip, query.limit, 10, 50)?;
    let filter = BrowseFilter {
        search: non_empty(&query.search),
        location: non_empty(&query.location),
        company: non_empty(&query.company),
    };

    let (profiles, total) = db::profiles::browse(&db_pool, user.id, &filter, page.skip, page.limit).await?;

    Ok(ApiResponse::ok("Profiles retrieved successfully").with_data(json!({
        "profiles": profiles,
        "pagination": page.pagination(total),
    })))
}
