use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::profile::completeness::{compute_completeness_report, CompletenessReport};
use crate::profile::import::{import_profile, ImportReport, ImportRequest};
use crate::profile::models::{
    AchievementInput, EducationInput, ExperienceInput, Profile, ProfileRecord, ProfileSection,
    ProjectInput, SkillInput,
};
use crate::profile::repository::{self, fetch_profile, map_unique_violation};
use crate::profile::summary::{summarize_profile, ProfileSummary};
use crate::profile::validation::{
    ensure_valid, validate_achievement, validate_education, validate_experience,
    validate_project, validate_skill,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
struct WithUser<T> {
    user_id: Uuid,
    #[serde(flatten)]
    item: T,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub completeness: CompletenessReport,
}

fn parse_section(raw: &str) -> Result<ProfileSection, AppError> {
    raw.parse::<ProfileSection>().map_err(AppError::Validation)
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<WithUser<T>, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(format!("Invalid body: {e}")))
}

/// A request body that passed validation, ready to be written.
enum ValidatedRecord {
    Experience(Uuid, ExperienceInput),
    Skill(Uuid, SkillInput),
    Education(Uuid, EducationInput),
    Project(Uuid, ProjectInput),
    Achievement(Uuid, AchievementInput),
}

impl ValidatedRecord {
    fn user_id(&self) -> Uuid {
        match self {
            ValidatedRecord::Experience(user_id, _)
            | ValidatedRecord::Skill(user_id, _)
            | ValidatedRecord::Education(user_id, _)
            | ValidatedRecord::Project(user_id, _)
            | ValidatedRecord::Achievement(user_id, _) => *user_id,
        }
    }
}

fn validate_record(section: ProfileSection, body: Value) -> Result<ValidatedRecord, AppError> {
    let record = match section {
        ProfileSection::Experiences => {
            let WithUser { user_id, item } = parse_body::<ExperienceInput>(body)?;
            ensure_valid(validate_experience(&item))?;
            ValidatedRecord::Experience(user_id, item)
        }
        ProfileSection::Skills => {
            let WithUser { user_id, item } = parse_body::<SkillInput>(body)?;
            ensure_valid(validate_skill(&item))?;
            ValidatedRecord::Skill(user_id, item)
        }
        ProfileSection::Education => {
            let WithUser { user_id, item } = parse_body::<EducationInput>(body)?;
            ensure_valid(validate_education(&item))?;
            ValidatedRecord::Education(user_id, item)
        }
        ProfileSection::Projects => {
            let WithUser { user_id, item } = parse_body::<ProjectInput>(body)?;
            ensure_valid(validate_project(&item))?;
            ValidatedRecord::Project(user_id, item)
        }
        ProfileSection::Achievements => {
            let WithUser { user_id, item } = parse_body::<AchievementInput>(body)?;
            ensure_valid(validate_achievement(&item))?;
            ValidatedRecord::Achievement(user_id, item)
        }
    };
    Ok(record)
}

async fn insert_record(
    conn: &mut PgConnection,
    record: ValidatedRecord,
) -> Result<ProfileRecord, AppError> {
    let saved = match record {
        ValidatedRecord::Experience(user_id, item) => ProfileRecord::Experience(
            repository::insert_experience(conn, user_id, &item).await?,
        ),
        ValidatedRecord::Skill(user_id, item) => {
            ProfileRecord::Skill(repository::upsert_user_skill(conn, user_id, &item).await?)
        }
        ValidatedRecord::Education(user_id, item) => {
            ProfileRecord::Education(repository::insert_education(conn, user_id, &item).await?)
        }
        ValidatedRecord::Project(user_id, item) => {
            ProfileRecord::Project(repository::insert_project(conn, user_id, &item).await?)
        }
        ValidatedRecord::Achievement(user_id, item) => ProfileRecord::Achievement(
            repository::insert_achievement(conn, user_id, &item).await?,
        ),
    };
    Ok(saved)
}

/// Returns `None` when the record does not exist for this user.
async fn update_record(
    conn: &mut PgConnection,
    id: Uuid,
    record: ValidatedRecord,
) -> Result<Option<ProfileRecord>, AppError> {
    let saved = match record {
        ValidatedRecord::Experience(user_id, item) => {
            repository::update_experience(conn, user_id, id, &item)
                .await?
                .map(ProfileRecord::Experience)
        }
        ValidatedRecord::Skill(user_id, item) => {
            repository::update_user_skill(conn, user_id, id, &item)
                .await
                .map_err(|e| map_unique_violation(e, "This skill is already in your profile"))?
                .map(ProfileRecord::Skill)
        }
        ValidatedRecord::Education(user_id, item) => {
            repository::update_education(conn, user_id, id, &item)
                .await?
                .map(ProfileRecord::Education)
        }
        ValidatedRecord::Project(user_id, item) => {
            repository::update_project(conn, user_id, id, &item)
                .await?
                .map(ProfileRecord::Project)
        }
        ValidatedRecord::Achievement(user_id, item) => {
            repository::update_achievement(conn, user_id, id, &item)
                .await?
                .map(ProfileRecord::Achievement)
        }
    };
    Ok(saved)
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = fetch_profile(&state.db, params.user_id).await?;
    let completeness = compute_completeness_report(&profile);
    Ok(Json(ProfileResponse {
        profile,
        completeness,
    }))
}

/// GET /api/v1/profile/completeness
pub async fn handle_profile_completeness(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CompletenessReport>, AppError> {
    let profile = fetch_profile(&state.db, params.user_id).await?;
    Ok(Json(compute_completeness_report(&profile)))
}

/// GET /api/v1/profile/summary
///
/// Always answers with a summary; AI failures degrade to the local fallback.
pub async fn handle_profile_summary(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileSummary>, AppError> {
    let profile = fetch_profile(&state.db, params.user_id).await?;
    Ok(Json(summarize_profile(&profile, &state.llm).await))
}

/// POST /api/v1/profile/:section
pub async fn handle_create_record(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ProfileRecord>), AppError> {
    let section = parse_section(&section)?;
    let record = validate_record(section, body)?;
    let mut conn = state.db.acquire().await?;
    let saved = insert_record(&mut conn, record).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// PUT /api/v1/profile/:section/:id
pub async fn handle_update_record(
    State(state): State<AppState>,
    Path((section, id)): Path<(String, Uuid)>,
    Json(body): Json<Value>,
) -> Result<Json<ProfileRecord>, AppError> {
    let section = parse_section(&section)?;
    let record = validate_record(section, body)?;
    let user_id = record.user_id();
    let mut conn = state.db.acquire().await?;
    update_record(&mut conn, id, record)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "{} entry {id} not found for user {user_id}",
                section.as_str()
            ))
        })
}

/// DELETE /api/v1/profile/:section/:id
pub async fn handle_delete_record(
    State(state): State<AppState>,
    Path((section, id)): Path<(String, Uuid)>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let section = parse_section(&section)?;
    if !repository::delete_record(&state.db, section, params.user_id, id).await? {
        return Err(AppError::NotFound(format!(
            "{} entry {id} not found",
            section.as_str()
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/profile/import
pub async fn handle_import(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportReport>, AppError> {
    let report = import_profile(&state.db, req.user_id, &req.profile).await?;
    Ok(Json(report))
}
