use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_message_at: Option<OffsetDateTime>,
    pub is_active: bool,
}

impl Conversation {
    /// The participant that is not `user_id`.
    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.user1_id == user_id {
            self.user2_id
        } else {
            self.user1_id
        }
    }
}

/// A conversation as seen by one participant.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConversationDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub conversation: Conversation,
    pub other_user_id: Uuid,
    pub other_user_name: String,
    pub other_user_email: String,
    pub other_user_picture: Option<String>,
    pub last_message: Option<String>,
    pub unread_count: i64,
}

/// Opens the conversation for a pair unless one already exists. Returns true
/// when a row was written.
pub async fn create_for_pair(db_pool: &SqlitePool, user1_id: Uuid, user2_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO conversations (id,user1_id,user2_id,created_at,last_message_at,is_active) \
         VALUES (?,?,?,?,NULL,1)",
    )
    .bind(Uuid::now_v7())
    .bind(user1_id)
    .bind(user2_id)
    .bind(super::now())
    .execute(db_pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// The conversation, but only if `user_id` takes part in it.
pub async fn find_for_participant(
    db_pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM conversations WHERE id=?1 AND (user1_id=?2 OR user2_id=?2)")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
}

pub async fn count_between(db_pool: &SqlitePool, a: Uuid, b: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM conversations \
         WHERE (user1_id=?1 AND user2_id=?2) OR (user1_id=?2 AND user2_id=?1)",
    )
    .bind(a)
    .bind(b)
    .fetch_one(db_pool)
    .await
}

pub async fn touch(db_pool: &SqlitePool, id: Uuid, at: OffsetDateTime) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE conversations SET last_message_at=? WHERE id=?")
        .bind(at)
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(())
}

// ?1 is always the viewing user
const DETAIL_SELECT: &str = "SELECT c.id, c.user1_id, c.user2_id, c.created_at, c.is_active, \
     COALESCE(c.last_message_at, c.created_at) AS last_message_at, \
     u.id AS other_user_id, u.name AS other_user_name, u.email AS other_user_email, u.picture AS other_user_picture, \
     (SELECT m.content FROM messages m WHERE m.conversation_id = c.id ORDER BY m.id DESC LIMIT 1) AS last_message, \
     (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id AND m.sender_id != ?1 AND m.is_read = 0) AS unread_count \
     FROM conversations c \
     JOIN users u ON u.id = CASE WHEN c.user1_id = ?1 THEN c.user2_id ELSE c.user1_id END \
     WHERE (c.user1_id = ?1 OR c.user2_id = ?1)";

/// Active conversations of `user_id`, most recent activity first.
pub async fn list_details(
    db_pool: &SqlitePool,
    user_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Vec<ConversationDetail>, sqlx::Error> {
    sqlx::query_as(&format!(
        "{DETAIL_SELECT} AND c.is_active = 1 ORDER BY last_message_at DESC, c.id DESC LIMIT ?2 OFFSET ?3"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(skip)
    .fetch_all(db_pool)
    .await
}

pub async fn detail(
    db_pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<ConversationDetail>, sqlx::Error> {
    sqlx::query_as(&format!("{DETAIL_SELECT} AND c.id = ?2"))
        .bind(user_id)
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn count_active(db_pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM conversations WHERE (user1_id=?1 OR user2_id=?1) AND is_active=1",
    )
    .bind(user_id)
    .fetch_one(db_pool)
    .await
}
