mod browse;
mod edit;
mod page;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/profile",
            get(page::my_profile).post(edit::create).put(edit::update),
        )
        .route("/api/profile/browse", get(browse::browse))
        .route("/api/profile/{user_id}", get(page::user_profile))
}
