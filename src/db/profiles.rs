use serde::Serialize;
use sqlx::{types::Json, FromRow, QueryBuilder, Sqlite, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub years_experience: Option<i64>,
    #[sqlx(json)]
    pub skills: Vec<String>,
    #[sqlx(json)]
    pub interests: Vec<String>,
    pub is_open_for_connection: bool,
    pub contact_preferences: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A profile with its owner's display fields attached.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProfileView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: UserProfile,
    pub user_name: String,
    pub user_email: String,
    pub user_picture: Option<String>,
}

const VIEW_SELECT: &str = "SELECT p.*, u.name AS user_name, u.email AS user_email, u.picture AS user_picture \
     FROM user_profiles p JOIN users u ON u.id = p.user_id";

pub async fn insert(db_pool: &SqlitePool, profile: &UserProfile) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_profiles (id,user_id,job_title,company,bio,location,linkedin_url,years_experience,\
         skills,interests,is_open_for_connection,contact_preferences,created_at,updated_at) \
         VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(profile.id)
    .bind(profile.user_id)
    .bind(&profile.job_title)
    .bind(&profile.company)
    .bind(&profile.bio)
    .bind(&profile.location)
    .bind(&profile.linkedin_url)
    .bind(profile.years_experience)
    .bind(Json(&profile.skills))
    .bind(Json(&profile.interests))
    .bind(profile.is_open_for_connection)
    .bind(&profile.contact_preferences)
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(db_pool)
    .await?;
    Ok(())
}

/// Writes every mutable column of `profile` back to its row.
pub async fn save(db_pool: &SqlitePool, profile: &UserProfile) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE user_profiles SET job_title=?,company=?,bio=?,location=?,linkedin_url=?,years_experience=?,\
         skills=?,interests=?,is_open_for_connection=?,contact_preferences=?,updated_at=? WHERE id=?",
    )
    .bind(&profile.job_title)
    .bind(&profile.company)
    .bind(&profile.bio)
    .bind(&profile.location)
    .bind(&profile.linkedin_url)
    .bind(profile.years_experience)
    .bind(Json(&profile.skills))
    .bind(Json(&profile.interests))
    .bind(profile.is_open_for_connection)
    .bind(&profile.contact_preferences)
    .bind(profile.updated_at)
    .bind(profile.id)
    .execute(db_pool)
    .await?;
    Ok(())
}

pub async fn find_by_user(db_pool: &SqlitePool, user_id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM user_profiles WHERE user_id=?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
}

pub async fn find_view_by_user(db_pool: &SqlitePool, user_id: Uuid) -> Result<Option<ProfileView>, sqlx::Error> {
    sqlx::query_as(&format!("{VIEW_SELECT} WHERE p.user_id=?"))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
}

#[derive(Debug, Default)]
pub struct BrowseFilter<'a> {
    pub search: Option<&'a str>,
    pub location: Option<&'a str>,
    pub company: Option<&'a str>,
}

const SEARCH_COLUMNS: [&str; 5] = ["p.job_title", "p.company", "p.bio", "p.skills", "p.interests"];

fn push_browse_filter(qb: &mut QueryBuilder<'_, Sqlite>, viewer: Uuid, filter: &BrowseFilter<'_>) {
    qb.push(" WHERE p.is_open_for_connection=1 AND p.user_id != ");
    qb.push_bind(viewer);

    if let Some(search) = filter.search {
        let pattern = super::like_pattern(search);
        qb.push(" AND (");
        for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*column).push(" LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
        }
        qb.push(")");
    }
    if let Some(location) = filter.location {
        qb.push(" AND p.location LIKE ")
            .push_bind(super::like_pattern(location))
            .push(" ESCAPE '\\'");
    }
    if let Some(company) = filter.company {
        qb.push(" AND p.company LIKE ")
            .push_bind(super::like_pattern(company))
            .push(" ESCAPE '\\'");
    }
}

/// Open profiles other than the viewer's, newest first, plus the total number
/// of matches ignoring paging.
pub async fn browse(
    db_pool: &SqlitePool,
    viewer: Uuid,
    filter: &BrowseFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<(Vec<ProfileView>, i64), sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(VIEW_SELECT);
    push_browse_filter(&mut qb, viewer, filter);
    qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);
    let profiles = qb.build_query_as::<ProfileView>().fetch_all(db_pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM user_profiles p JOIN users u ON u.id = p.user_id",
    );
    push_browse_filter(&mut qb, viewer, filter);
    let total = qb.build_query_scalar::<i64>().fetch_one(db_pool).await?;

    Ok((profiles, total))
}
