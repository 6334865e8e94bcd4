use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::users::User;

pub const SESSION_TTL: Duration = Duration::days(7);

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSession {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub session_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_active: bool,
}

/// Drops every session the user holds and opens a fresh one for `token`.
pub async fn replace_for_user(
    db_pool: &SqlitePool,
    user_id: Uuid,
    token: &str,
) -> Result<UserSession, sqlx::Error> {
    sqlx::query("DELETE FROM user_sessions WHERE user_id=?")
        .bind(user_id)
        .execute(db_pool)
        .await?;

    let created_at = super::now();
    let session = UserSession {
        id: Uuid::now_v7(),
        user_id,
        session_token: token.to_owned(),
        expires_at: created_at + SESSION_TTL,
        created_at,
        is_active: true,
    };

    sqlx::query(
        "INSERT INTO user_sessions (id,user_id,session_token,expires_at,created_at,is_active) \
         VALUES (?,?,?,?,?,?)",
    )
    .bind(session.id)
    .bind(session.user_id)
    .bind(&session.session_token)
    .bind(session.expires_at)
    .bind(session.created_at)
    .bind(session.is_active)
    .execute(db_pool)
    .await?;

    Ok(session)
}

pub async fn find_by_token(db_pool: &SqlitePool, token: &str) -> Result<Option<UserSession>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM user_sessions WHERE session_token=? AND is_active=1")
        .bind(token)
        .fetch_optional(db_pool)
        .await
}

/// Resolves a bearer token to its user. Inactive, expired and orphaned
/// sessions all resolve to `None`.
pub async fn user_for_token(db_pool: &SqlitePool, token: &str) -> Result<Option<User>, sqlx::Error> {
    let Some(session) = find_by_token(db_pool, token).await? else {
        return Ok(None);
    };

    if session.expires_at <= OffsetDateTime::now_utc() {
        return Ok(None);
    }

    super::users::find_by_id(db_pool, session.user_id).await
}

pub async fn deactivate(db_pool: &SqlitePool, token: &str) -> Result<u64, sqlx::Error> {
    Ok(sqlx::query("UPDATE user_sessions SET is_active=0 WHERE session_token=?")
        .bind(token)
        .execute(db_pool)
        .await?
        .rows_affected())
}
