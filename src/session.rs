use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use sqlx::SqlitePool;
use tower_sessions::cookie::{Cookie, SameSite};

use crate::{
    appresult::{AppError, AppResult},
    db::{self, sessions::SESSION_TTL, users::User},
};

pub const SESSION_COOKIE: &str = "session_token";
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Session token from the `session_token` cookie, falling back to an
/// `Authorization: Bearer` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_owned());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
    })
}

fn base_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .build()
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = base_cookie(token.to_owned(), secure);
    cookie.set_max_age(SESSION_TTL);
    cookie.to_string()
}

/// `Set-Cookie` value that makes the browser forget the session.
pub fn removal_cookie(secure: bool) -> String {
    let mut cookie = base_cookie(String::new(), secure);
    cookie.make_removal();
    cookie.to_string()
}

/// The user behind the request's session token. Rejects with 401 when the
/// token is missing or no longer resolves.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Some(token) = token_from_headers(&parts.headers) else {
            return Err(AppError::Unauthorized("Not authenticated"));
        };

        let db_pool = SqlitePool::from_ref(state);
        match db::sessions::user_for_token(&db_pool, &token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(AppError::Unauthorized("Invalid or expired session")),
        }
    }
}
