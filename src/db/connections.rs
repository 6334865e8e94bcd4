use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
    Blocked,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        use ConnectionStatus::*;
        match self {
            Pending => "pending",
            Accepted => "accepted",
            Rejected => "rejected",
            Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
    pub status: ConnectionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub responded_at: Option<OffsetDateTime>,
}

impl ConnectionRequest {
    pub fn new(sender_id: Uuid, receiver_id: Uuid, message: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender_id,
            receiver_id,
            message,
            status: ConnectionStatus::Pending,
            created_at: super::now(),
            responded_at: None,
        }
    }
}

/// A request with both parties' display fields attached.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConnectionRequestDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: ConnectionRequest,
    pub sender_name: String,
    pub sender_email: String,
    pub sender_picture: Option<String>,
    pub receiver_name: String,
    pub receiver_email: String,
    pub receiver_picture: Option<String>,
}

pub async fn insert(db_pool: &SqlitePool, request: &ConnectionRequest) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO connection_requests (id,sender_id,receiver_id,message,status,created_at,responded_at) \
         VALUES (?,?,?,?,?,?,?)",
    )
    .bind(request.id)
    .bind(request.sender_id)
    .bind(request.receiver_id)
    .bind(&request.message)
    .bind(request.status)
    .bind(request.created_at)
    .bind(request.responded_at)
    .execute(db_pool)
    .await?;
    Ok(())
}

pub async fn find(db_pool: &SqlitePool, id: Uuid) -> Result<Option<ConnectionRequest>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM connection_requests WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

/// Any request between the two users, in either direction, that still blocks
/// a new one: pending, accepted or blocked.
pub async fn find_live_between(
    db_pool: &SqlitePool,
    a: Uuid,
    b: Uuid,
) -> Result<Option<ConnectionRequest>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM connection_requests \
         WHERE ((sender_id=?1 AND receiver_id=?2) OR (sender_id=?2 AND receiver_id=?1)) \
         AND status IN ('pending','accepted','blocked') LIMIT 1",
    )
    .bind(a)
    .bind(b)
    .fetch_optional(db_pool)
    .await
}

pub async fn are_connected(db_pool: &SqlitePool, a: Uuid, b: Uuid) -> Result<bool, sqlx::Error> {
    let found: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM connection_requests \
         WHERE ((sender_id=?1 AND receiver_id=?2) OR (sender_id=?2 AND receiver_id=?1)) \
         AND status='accepted' LIMIT 1",
    )
    .bind(a)
    .bind(b)
    .fetch_optional(db_pool)
    .await?;
    Ok(found.is_some())
}

/// Moves a pending request to `status`. Returns false when the request was no
/// longer pending.
pub async fn respond(
    db_pool: &SqlitePool,
    id: Uuid,
    status: ConnectionStatus,
    responded_at: OffsetDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE connection_requests SET status=?, responded_at=? WHERE id=? AND status='pending'",
    )
    .bind(status)
    .bind(responded_at)
    .bind(id)
    .execute(db_pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Which slice of a user's requests to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Received,
    Sent,
    Established,
}

impl Listing {
    fn filter(&self) -> &'static str {
        use Listing::*;
        match self {
            Received => "r.receiver_id=?1",
            Sent => "r.sender_id=?1",
            Established => "(r.sender_id=?1 OR r.receiver_id=?1) AND r.status='accepted'",
        }
    }

    fn order(&self) -> &'static str {
        use Listing::*;
        match self {
            Received | Sent => "r.created_at DESC, r.id DESC",
            Established => "r.responded_at DESC, r.id DESC",
        }
    }
}

pub async fn list(
    db_pool: &SqlitePool,
    user_id: Uuid,
    listing: Listing,
    skip: i64,
    limit: i64,
) -> Result<Vec<ConnectionRequestDetail>, sqlx::Error> {
    let sql = format!(
        "SELECT r.*, \
         s.name AS sender_name, s.email AS sender_email, s.picture AS sender_picture, \
         v.name AS receiver_name, v.email AS receiver_email, v.picture AS receiver_picture \
         FROM connection_requests r \
         JOIN users s ON s.id = r.sender_id \
         JOIN users v ON v.id = r.receiver_id \
         WHERE {} ORDER BY {} LIMIT ?2 OFFSET ?3",
        listing.filter(),
        listing.order(),
    );

    sqlx::query_as(&sql)
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(db_pool)
        .await
}

pub async fn count(db_pool: &SqlitePool, user_id: Uuid, listing: Listing) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM connection_requests r WHERE {}", listing.filter());
    sqlx::query_scalar(&sql).bind(user_id).fetch_one(db_pool).await
}
