pub mod appresult;
pub mod auth;
pub mod config;
pub mod connections;
pub mod conversations;
pub mod db;
pub mod email;
pub mod extract;
pub mod profiles;
pub mod res;
pub mod session;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::FromRef,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub use appresult::{AppError, AppResult};
use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub sessions: auth::SessionService,
    pub mailer: email::Mailer,
    pub config: Arc<Config>,
}

impl AppState {
    /// Opens (and migrates) the configured database, then wires the clients.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let db_pool = db::connect(&config.database_url).await?;
        Self::new(config, db_pool)
    }

    pub fn new(config: Config, db_pool: SqlitePool) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            db_pool,
            sessions: auth::SessionService::new(http.clone(), config.session_service_url.clone()),
            mailer: email::Mailer::new(http, &config),
            config: Arc::new(config),
        })
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api", get(root))
        .route("/api/", get(root))
        .merge(auth::router())
        .merge(profiles::router())
        .merge(connections::router())
        .merge(conversations::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Meetup Network API" }))
}

/// The `{success, message, data}` envelope every successful call answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Raw `skip`/`limit` query parameters of a list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self, default_limit: i64, max_limit: i64) -> AppResult<Page> {
        Page::from_query(self.skip, self.limit, default_limit, max_limit)
    }
}

/// Validated `skip`/`limit` pair for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub fn from_query(skip: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> AppResult<Self> {
        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(default_limit);

        if skip < 0 {
            return Err(AppError::Unprocessable("skip must be greater than or equal to 0".into()));
        }
        if !(1..=max_limit).contains(&limit) {
            return Err(AppError::Unprocessable(format!("limit must be between 1 and {max_limit}")));
        }

        Ok(Self { skip, limit })
    }

    pub fn pagination(&self, total: i64) -> Value {
        json!({
            "skip": self.skip,
            "limit": self.limit,
            "total": total,
            "has_more": self.skip + self.limit < total,
        })
    }
}
