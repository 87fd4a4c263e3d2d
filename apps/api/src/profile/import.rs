//! Persists an extracted profile (from a document or an interview) into the
//! profile tables. Invalid items are skipped and reported, valid ones are
//! committed in one transaction.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::ExtractedProfile;
use crate::profile::models::ProfileSection;
use crate::profile::repository;
use crate::profile::validation::{
    validate_achievement, validate_education, validate_experience, validate_project,
    validate_skill, FieldError,
};

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub user_id: Uuid,
    pub profile: ExtractedProfile,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedItem {
    pub section: ProfileSection,
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SectionCounts {
    pub experiences: usize,
    pub skills: usize,
    pub education: usize,
    pub projects: usize,
    pub achievements: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub inserted: SectionCounts,
    pub skipped: Vec<SkippedItem>,
}

fn keep_valid<T: Clone>(
    section: ProfileSection,
    items: &[T],
    validate: impl Fn(&T) -> Vec<FieldError>,
    skipped: &mut Vec<SkippedItem>,
) -> Vec<T> {
    let mut kept = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let errors = validate(item);
        if errors.is_empty() {
            kept.push(item.clone());
        } else {
            skipped.push(SkippedItem {
                section,
                index,
                reason: errors
                    .iter()
                    .map(|e| format!("{} {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            });
        }
    }
    kept
}

/// Splits an extracted profile into the importable part and the skipped items.
pub fn plan_import(profile: &ExtractedProfile) -> (ExtractedProfile, Vec<SkippedItem>) {
    let mut skipped = Vec::new();
    let valid = ExtractedProfile {
        experiences: keep_valid(
            ProfileSection::Experiences,
            &profile.experiences,
            validate_experience,
            &mut skipped,
        ),
        skills: keep_valid(
            ProfileSection::Skills,
            &profile.skills,
            validate_skill,
            &mut skipped,
        ),
        education: keep_valid(
            ProfileSection::Education,
            &profile.education,
            validate_education,
            &mut skipped,
        ),
        projects: keep_valid(
            ProfileSection::Projects,
            &profile.projects,
            validate_project,
            &mut skipped,
        ),
        achievements: keep_valid(
            ProfileSection::Achievements,
            &profile.achievements,
            validate_achievement,
            &mut skipped,
        ),
    };
    (valid, skipped)
}

pub async fn import_profile(
    pool: &PgPool,
    user_id: Uuid,
    profile: &ExtractedProfile,
) -> Result<ImportReport, AppError> {
    let (valid, skipped) = plan_import(profile);

    let mut tx = pool.begin().await?;
    for item in &valid.experiences {
        repository::insert_experience(&mut tx, user_id, item).await?;
    }
    for item in &valid.skills {
        repository::upsert_user_skill(&mut tx, user_id, item).await?;
    }
    for item in &valid.education {
        repository::insert_education(&mut tx, user_id, item).await?;
    }
    for item in &valid.projects {
        repository::insert_project(&mut tx, user_id, item).await?;
    }
    for item in &valid.achievements {
        repository::insert_achievement(&mut tx, user_id, item).await?;
    }
    tx.commit().await?;

    let inserted = SectionCounts {
        experiences: valid.experiences.len(),
        skills: valid.skills.len(),
        education: valid.education.len(),
        projects: valid.projects.len(),
        achievements: valid.achievements.len(),
    };
    info!(
        "Imported {} profile items for user {user_id} ({} skipped)",
        valid.total_items(),
        skipped.len()
    );

    Ok(ImportReport { inserted, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::{AchievementInput, SkillInput};

    #[test]
    fn test_plan_import_skips_invalid_items_with_reason() {
        let profile = ExtractedProfile {
            skills: vec![
                SkillInput {
                    name: "Rust".into(),
                    ..Default::default()
                },
                SkillInput {
                    name: "".into(),
                    ..Default::default()
                },
            ],
            achievements: vec![AchievementInput {
                title: "Hackathon winner".into(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let (valid, skipped) = plan_import(&profile);
        assert_eq!(valid.skills.len(), 1);
        assert_eq!(valid.achievements.len(), 1);
        assert_eq!(
            skipped,
            vec![SkippedItem {
                section: ProfileSection::Skills,
                index: 1,
                reason: "name is required".into(),
            }]
        );
    }

    #[test]
    fn test_plan_import_of_empty_profile() {
        let (valid, skipped) = plan_import(&ExtractedProfile::default());
        assert_eq!(valid.total_items(), 0);
        assert!(skipped.is_empty());
    }
}
