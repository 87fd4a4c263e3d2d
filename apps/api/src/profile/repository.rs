//! Persistence for the profile sections. Every query is scoped by `user_id`.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{
    AchievementRow, EducationRow, ExperienceRow, ProjectRow, UserSkillRow,
};
use crate::profile::models::{
    AchievementInput, EducationInput, ExperienceInput, Profile, ProfileSection, ProjectInput,
    SkillInput,
};

const USER_SKILL_SELECT: &str = r#"
    SELECT us.id, us.user_id, us.skill_id, s.name, s.category,
           us.proficiency_level, us.years_experience, us.created_at
    FROM user_skills us
    JOIN skills s ON s.id = us.skill_id
"#;

/// Loads every section of a user's profile.
pub async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> Result<Profile, sqlx::Error> {
    let experiences = sqlx::query_as::<_, ExperienceRow>(
        "SELECT * FROM experiences WHERE user_id = $1 ORDER BY is_current DESC, start_date DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let skills = sqlx::query_as::<_, UserSkillRow>(&format!(
        "{USER_SKILL_SELECT} WHERE us.user_id = $1 ORDER BY us.proficiency_level DESC, s.name"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let education = sqlx::query_as::<_, EducationRow>(
        "SELECT * FROM education WHERE user_id = $1 ORDER BY end_date DESC NULLS FIRST, start_date DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let projects = sqlx::query_as::<_, ProjectRow>(
        "SELECT * FROM projects WHERE user_id = $1 ORDER BY start_date DESC NULLS LAST, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let achievements = sqlx::query_as::<_, AchievementRow>(
        "SELECT * FROM achievements WHERE user_id = $1 ORDER BY date_achieved DESC NULLS LAST, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(Profile {
        experiences,
        skills,
        education,
        projects,
        achievements,
    })
}

pub async fn insert_experience(
    conn: &mut PgConnection,
    user_id: Uuid,
    input: &ExperienceInput,
) -> Result<ExperienceRow, sqlx::Error> {
    sqlx::query_as::<_, ExperienceRow>(
        r#"
        INSERT INTO experiences
            (user_id, company, position, location, start_date, end_date,
             is_current, description, achievements)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(input.company.trim())
    .bind(input.position.trim())
    .bind(&input.location)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.is_current)
    .bind(&input.description)
    .bind(&input.achievements)
    .fetch_one(&mut *conn)
    .await
}

pub async fn update_experience(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
    input: &ExperienceInput,
) -> Result<Option<ExperienceRow>, sqlx::Error> {
    sqlx::query_as::<_, ExperienceRow>(
        r#"
        UPDATE experiences
        SET company = $3, position = $4, location = $5, start_date = $6, end_date = $7,
            is_current = $8, description = $9, achievements = $10, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(input.company.trim())
    .bind(input.position.trim())
    .bind(&input.location)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.is_current)
    .bind(&input.description)
    .bind(&input.achievements)
    .fetch_optional(&mut *conn)
    .await
}

/// Finds or creates the catalog skill, matching names case-insensitively.
async fn upsert_catalog_skill(
    conn: &mut PgConnection,
    name: &str,
    category: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO skills (name, category)
        VALUES ($1, $2)
        ON CONFLICT ((lower(name)))
        DO UPDATE SET category = COALESCE(skills.category, EXCLUDED.category)
        RETURNING id
        "#,
    )
    .bind(name.trim())
    .bind(category)
    .fetch_one(&mut *conn)
    .await
}

async fn fetch_user_skill(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<UserSkillRow>, sqlx::Error> {
    sqlx::query_as::<_, UserSkillRow>(&format!(
        "{USER_SKILL_SELECT} WHERE us.id = $1 AND us.user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Adds a skill to the user's profile. Re-adding a skill the user already
/// has updates its proficiency instead of duplicating it.
pub async fn upsert_user_skill(
    conn: &mut PgConnection,
    user_id: Uuid,
    input: &SkillInput,
) -> Result<UserSkillRow, sqlx::Error> {
    let skill_id = upsert_catalog_skill(conn, &input.name, input.category.as_deref()).await?;

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO user_skills (user_id, skill_id, proficiency_level, years_experience)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, skill_id)
        DO UPDATE SET proficiency_level = EXCLUDED.proficiency_level,
                      years_experience = EXCLUDED.years_experience
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(skill_id)
    .bind(input.proficiency_level)
    .bind(input.years_experience)
    .fetch_one(&mut *conn)
    .await?;

    fetch_user_skill(conn, user_id, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_user_skill(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
    input: &SkillInput,
) -> Result<Option<UserSkillRow>, sqlx::Error> {
    let skill_id = upsert_catalog_skill(conn, &input.name, input.category.as_deref()).await?;

    let updated = sqlx::query(
        r#"
        UPDATE user_skills
        SET skill_id = $3, proficiency_level = $4, years_experience = $5
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(skill_id)
    .bind(input.proficiency_level)
    .bind(input.years_experience)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(None);
    }
    fetch_user_skill(conn, user_id, id).await
}

pub async fn insert_education(
    conn: &mut PgConnection,
    user_id: Uuid,
    input: &EducationInput,
) -> Result<EducationRow, sqlx::Error> {
    sqlx::query_as::<_, EducationRow>(
        r#"
        INSERT INTO education
            (user_id, institution, degree, field_of_study, start_date, end_date, gpa, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(input.institution.trim())
    .bind(input.degree.trim())
    .bind(&input.field_of_study)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.gpa)
    .bind(&input.description)
    .fetch_one(&mut *conn)
    .await
}

pub async fn update_education(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
    input: &EducationInput,
) -> Result<Option<EducationRow>, sqlx::Error> {
    sqlx::query_as::<_, EducationRow>(
        r#"
        UPDATE education
        SET institution = $3, degree = $4, field_of_study = $5, start_date = $6,
            end_date = $7, gpa = $8, description = $9, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(input.institution.trim())
    .bind(input.degree.trim())
    .bind(&input.field_of_study)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.gpa)
    .bind(&input.description)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_project(
    conn: &mut PgConnection,
    user_id: Uuid,
    input: &ProjectInput,
) -> Result<ProjectRow, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        r#"
        INSERT INTO projects
            (user_id, title, description, technologies, start_date, end_date,
             project_url, repository_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(&input.technologies)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.project_url)
    .bind(&input.repository_url)
    .fetch_one(&mut *conn)
    .await
}

pub async fn update_project(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
    input: &ProjectInput,
) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        r#"
        UPDATE projects
        SET title = $3, description = $4, technologies = $5, start_date = $6,
            end_date = $7, project_url = $8, repository_url = $9, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(&input.technologies)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.project_url)
    .bind(&input.repository_url)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_achievement(
    conn: &mut PgConnection,
    user_id: Uuid,
    input: &AchievementInput,
) -> Result<AchievementRow, sqlx::Error> {
    sqlx::query_as::<_, AchievementRow>(
        r#"
        INSERT INTO achievements (user_id, title, description, category, issuer, date_achieved)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(&input.category)
    .bind(&input.issuer)
    .bind(input.date_achieved)
    .fetch_one(&mut *conn)
    .await
}

pub async fn update_achievement(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
    input: &AchievementInput,
) -> Result<Option<AchievementRow>, sqlx::Error> {
    sqlx::query_as::<_, AchievementRow>(
        r#"
        UPDATE achievements
        SET title = $3, description = $4, category = $5, issuer = $6,
            date_achieved = $7, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(&input.category)
    .bind(&input.issuer)
    .bind(input.date_achieved)
    .fetch_optional(&mut *conn)
    .await
}

/// Deletes one row of a section. Returns false when nothing matched.
pub async fn delete_record(
    pool: &PgPool,
    section: ProfileSection,
    user_id: Uuid,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "DELETE FROM {} WHERE id = $1 AND user_id = $2",
        section.table()
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Maps unique-constraint violations to a validation error; everything else
/// stays a database error.
pub fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    let is_unique_violation = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505");
    if is_unique_violation {
        AppError::Validation(message.to_string())
    } else {
        AppError::Database(err)
    }
}
