use axum::{debug_handler, extract::State};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{
    appresult::is_unique_violation,
    db::{self, profiles::UserProfile},
    extract::Json,
    session::CurrentUser,
    ApiResponse, AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateProfile {
    job_title: Option<String>,
    company: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    linkedin_url: Option<String>,
    years_experience: Option<i64>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default = "default_open")]
    is_open_for_connection: bool,
    #[serde(default = "default_contact")]
    contact_preferences: Option<String>,
}

fn default_open() -> bool {
    true
}

fn default_contact() -> Option<String> {
    Some("email".to_owned())
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateProfile>,
) -> AppResult<ApiResponse> {
    const EXISTS: AppError = AppError::BadRequest("Profile already exists");

    if db::profiles::find_by_user(&db_pool, user.id).await?.is_some() {
        return Err(EXISTS);
    }

    let at = db::now();
    let profile = UserProfile {
        id: Uuid::now_v7(),
        user_id: user.id,
        job_title: body.job_title,
        company: body.company,
        bio: body.bio,
        location: body.location,
        linkedin_url: body.linkedin_url,
        years_experience: body.years_experience,
        skills: body.skills,
        interests: body.interests,
        is_open_for_connection: body.is_open_for_connection,
        contact_preferences: body.contact_preferences,
        created_at: at,
        updated_at: at,
    };

    match db::profiles::insert(&db_pool, &profile).await {
        Err(err) if is_unique_violation(&err) => return Err(EXISTS),
        other => other?,
    }
    info!("profile {} created for {}", profile.id, user.id);

    Ok(ApiResponse::ok("Profile created successfully").with_data(json!({ "profile": profile })))
}

/// Every field is optional; only the ones present are written.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UpdateProfile {
    job_title: Option<String>,
    company: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    linkedin_url: Option<String>,
    years_experience: Option<i64>,
    skills: Option<Vec<String>>,
    interests: Option<Vec<String>>,
    is_open_for_connection: Option<bool>,
    contact_preferences: Option<String>,
}

impl UpdateProfile {
    fn apply(self, profile: &mut UserProfile) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut profile.job_title, self.job_title.map(Some));
        set(&mut profile.company, self.company.map(Some));
        set(&mut profile.bio, self.bio.map(Some));
        set(&mut profile.location, self.location.map(Some));
        set(&mut profile.linkedin_url, self.linkedin_url.map(Some));
        set(&mut profile.years_experience, self.years_experience.map(Some));
        set(&mut profile.skills, self.skills);
        set(&mut profile.interests, self.interests);
        set(&mut profile.is_open_for_connection, self.is_open_for_connection);
        set(&mut profile.contact_preferences, self.contact_preferences.map(Some));
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn update(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UpdateProfile>,
) -> AppResult<ApiResponse> {
    let Some(mut profile) = db::profiles::find_by_user(&db_pool, user.id).await? else {
        return Err(AppError::NotFound("Profile not found"));
    };

    body.apply(&mut profile);
    profile.updated_at = db::now();
    db::profiles::save(&db_pool, &profile).await?;

    Ok(ApiResponse::ok("Profile updated successfully").with_data(json!({ "profile": profile })))
}
