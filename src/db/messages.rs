use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub is_read: bool,
}

impl Message {
    pub fn new(conversation_id: Uuid, sender_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            sender_id,
            content,
            timestamp: super::now(),
            is_read: false,
        }
    }
}

pub async fn insert(db_pool: &SqlitePool, message: &Message) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO messages (id,conversation_id,sender_id,content,timestamp,is_read) VALUES (?,?,?,?,?,?)",
    )
    .bind(message.id)
    .bind(message.conversation_id)
    .bind(message.sender_id)
    .bind(&message.content)
    .bind(message.timestamp)
    .bind(message.is_read)
    .execute(db_pool)
    .await?;
    Ok(())
}

/// One page counted back from the newest message, returned oldest first.
pub async fn page(
    db_pool: &SqlitePool,
    conversation_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let mut messages: Vec<Message> =
        sqlx::query_as("SELECT * FROM messages WHERE conversation_id=? ORDER BY id DESC LIMIT ? OFFSET ?")
            .bind(conversation_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(db_pool)
            .await?;
    messages.reverse();
    Ok(messages)
}

pub async fn count(db_pool: &SqlitePool, conversation_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id=?")
        .bind(conversation_id)
        .fetch_one(db_pool)
        .await
}

/// Marks everything the other participant sent as read by `reader_id`.
pub async fn mark_read(db_pool: &SqlitePool, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, sqlx::Error> {
    Ok(sqlx::query("UPDATE messages SET is_read=1 WHERE conversation_id=? AND sender_id != ? AND is_read=0")
        .bind(conversation_id)
        .bind(reader_id)
        .execute(db_pool)
        .await?
        .rows_affected())
}
