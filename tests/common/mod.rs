//! Shared fixtures for the HTTP-level tests: an in-memory app plus stand-ins
//! for the session service and the mail provider.

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use meetup_network::{
    app,
    config::{Config, Environment},
    db::{
        self,
        profiles::UserProfile,
        users::User,
    },
    AppState,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

pub const GOOD_SESSION_ID: &str = "good-session-id";
pub const SERVICE_TOKEN: &str = "token-from-service";

pub type Outbox = Arc<Mutex<Vec<Value>>>;

pub struct TestApp {
    pub router: Router,
    pub db_pool: SqlitePool,
    pub outbox: Outbox,
}

async fn serve_on_loopback(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

async fn session_data(headers: HeaderMap) -> impl IntoResponse {
    match headers.get("x-session-id").and_then(|v| v.to_str().ok()) {
        Some(GOOD_SESSION_ID) => Json(json!({
            "id": "ext-1",
            "email": "new@example.com",
            "name": "New User",
            "picture": "https://example.com/new.png",
            "session_token": SERVICE_TOKEN,
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "unknown session").into_response(),
    }
}

/// Records every mail it is handed and answers with `status`.
#[derive(Clone)]
struct MailProvider {
    outbox: Outbox,
    status: StatusCode,
}

async fn accept_mail(State(provider): State<MailProvider>, Json(body): Json<Value>) -> StatusCode {
    provider.outbox.lock().unwrap().push(body);
    provider.status
}

pub fn config(session_service_url: String, sendgrid_api_url: String, environment: Environment) -> Config {
    Config {
        port: 0,
        database_url: "sqlite::memory:".to_owned(),
        session_service_url,
        sendgrid_api_key: Some("test-key".to_owned()),
        sendgrid_api_url,
        from_email: "no-reply@meetup.test".to_owned(),
        frontend_url: "http://frontend.test".to_owned(),
        environment,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_in(Environment::Development).await
}

pub async fn spawn_app_in(environment: Environment) -> TestApp {
    spawn(environment, StatusCode::ACCEPTED).await
}

/// An app whose mail provider answers every send with `status`.
pub async fn spawn_app_with_mail_status(status: StatusCode) -> TestApp {
    spawn(Environment::Development, status).await
}

async fn spawn(environment: Environment, mail_status: StatusCode) -> TestApp {
    let session_addr = serve_on_loopback(Router::new().route("/session-data", get(session_data))).await;

    let outbox = Outbox::default();
    let mail_addr = serve_on_loopback(
        Router::new()
            .route("/v3/mail/send", post(accept_mail))
            .with_state(MailProvider {
                outbox: outbox.clone(),
                status: mail_status,
            }),
    )
    .await;

    let config = config(
        format!("http://{session_addr}/session-data"),
        format!("http://{mail_addr}/v3/mail/send"),
        environment,
    );

    let db_pool = db::connect(&config.database_url).await.unwrap();
    let state = AppState::new(config, db_pool.clone()).unwrap();

    TestApp {
        router: app(state),
        db_pool,
        outbox,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("session_token={token}"));
        }

        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Reply { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> Reply {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    /// A user with a live session; the token is derived from the email.
    pub async fn sign_in(&self, email: &str, name: &str) -> (User, String) {
        let (user, _) = db::users::get_or_create(&self.db_pool, email, name, None).await.unwrap();
        let token = format!("token-{email}");
        db::sessions::replace_for_user(&self.db_pool, user.id, &token).await.unwrap();
        (user, token)
    }

    pub async fn sign_in_with_profile(&self, email: &str, name: &str, open: bool) -> (User, String) {
        let (user, token) = self.sign_in(email, name).await;
        let at = db::now();
        let profile = UserProfile {
            id: Uuid::now_v7(),
            user_id: user.id,
            job_title: Some("Engineer".to_owned()),
            company: Some("Acme".to_owned()),
            bio: None,
            location: Some("Berlin".to_owned()),
            linkedin_url: None,
            years_experience: Some(4),
            skills: vec!["Rust".to_owned()],
            interests: vec![],
            is_open_for_connection: open,
            contact_preferences: Some("email".to_owned()),
            created_at: at,
            updated_at: at,
        };
        db::profiles::insert(&self.db_pool, &profile).await.unwrap();
        (user, token)
    }

    /// Sends a request from `sender` to `receiver` and accepts it, returning
    /// the opened conversation's id.
    pub async fn connect_pair(&self, sender: &str, receiver: &User, receiver_token: &str) -> String {
        let reply = self
            .post(
                "/api/connections/request",
                sender,
                json!({ "receiver_id": receiver.id, "message": "Hi!" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        let request_id = reply.body["data"]["request"]["id"].as_str().unwrap().to_owned();

        let reply = self
            .put(
                &format!("/api/connections/requests/{request_id}/respond"),
                receiver_token,
                json!({ "status": "accepted" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);

        let reply = self.get("/api/conversations", receiver_token).await;
        reply.body["data"]["conversations"][0]["id"].as_str().unwrap().to_owned()
    }

    pub fn sent_mails(&self) -> Vec<Value> {
        self.outbox.lock().unwrap().clone()
    }
}
