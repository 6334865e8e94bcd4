use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::appresult::is_unique_violation;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_active: bool,
    pub onboarding_completed: bool,
}

impl User {
    pub fn new(email: &str, name: &str, picture: Option<&str>) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: email.to_owned(),
            name: name.to_owned(),
            picture: picture.map(str::to_owned),
            created_at: super::now(),
            is_active: true,
            onboarding_completed: false,
        }
    }
}

pub async fn find_by_id(db_pool: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn find_by_email(db_pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email=?")
        .bind(email)
        .fetch_optional(db_pool)
        .await
}

pub async fn insert(db_pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id,email,name,picture,created_at,is_active,onboarding_completed) \
         VALUES (?,?,?,?,?,?,?)",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.picture)
    .bind(user.created_at)
    .bind(user.is_active)
    .bind(user.onboarding_completed)
    .execute(db_pool)
    .await?;
    Ok(())
}

/// Returns the user for `email`, creating it on first sight. The flag is true
/// when the user was created by this call.
pub async fn get_or_create(
    db_pool: &SqlitePool,
    email: &str,
    name: &str,
    picture: Option<&str>,
) -> Result<(User, bool), sqlx::Error> {
    if let Some(user) = find_by_email(db_pool, email).await? {
        return Ok((user, false));
    }

    let user = User::new(email, name, picture);
    match insert(db_pool, &user).await {
        Ok(()) => {
            info!("adding user {} <{}>", user.id, user.email);
            Ok((user, true))
        }
        // lost a race with a concurrent login for the same email
        Err(e) if is_unique_violation(&e) => find_by_email(db_pool, email)
            .await?
            .map(|user| (user, false))
            .ok_or(e),
        Err(e) => Err(e),
    }
}

pub async fn complete_onboarding(
    db_pool: &SqlitePool,
    id: Uuid,
    name: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET onboarding_completed=1, name=COALESCE(?,name) WHERE id=?")
        .bind(name)
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Deletes the user and, through cascading keys, everything they own.
pub async fn delete_by_email(db_pool: &SqlitePool, email: &str) -> Result<u64, sqlx::Error> {
    Ok(sqlx::query("DELETE FROM users WHERE email=?")
        .bind(email)
        .execute(db_pool)
        .await?
        .rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn get_or_create_is_keyed_by_email() {
        let db_pool = test_pool().await;

        let (first, created) = get_or_create(&db_pool, "ada@example.com", "Ada", None).await.unwrap();
        assert!(created);
        assert!(!first.onboarding_completed);

        let (second, created) = get_or_create(&db_pool, "ada@example.com", "Someone Else", None).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ada");
    }

    #[tokio::test]
    async fn onboarding_keeps_name_when_none_given() {
        let db_pool = test_pool().await;
        let (user, _) = get_or_create(&db_pool, "bo@example.com", "Bo", None).await.unwrap();

        complete_onboarding(&db_pool, user.id, None).await.unwrap();
        let user = find_by_id(&db_pool, user.id).await.unwrap().unwrap();
        assert!(user.onboarding_completed);
        assert_eq!(user.name, "Bo");

        complete_onboarding(&db_pool, user.id, Some("Bo Peep")).await.unwrap();
        let user = find_by_id(&db_pool, user.id).await.unwrap().unwrap();
        assert_eq!(user.name, "Bo Peep");
    }
}
