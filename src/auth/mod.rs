mod clients;
mod login;
mod logout;
mod me;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::AppState;

pub use clients::{SessionData, SessionService};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/test", get(test))
        .route("/api/auth/dev-login", get(login::dev_login).post(login::dev_login))
        .route("/api/auth/session", post(login::session))
        .route("/api/auth/logout", post(logout::logout))
        .route("/api/auth/me", get(me::me))
        .route("/api/auth/complete-onboarding", post(me::complete_onboarding))
}

async fn test() -> Json<Value> {
    Json(json!({ "message": "Auth router is working!", "status": "ok" }))
}
