use serde::{Deserialize, Serialize};

use crate::profile::models::{Profile, ProfileSection};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionHealth {
    pub section: ProfileSection,
    pub score: f64,
    pub entry_count: usize,
    pub incomplete_entries: usize,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub overall_score: f64,
    pub sections: Vec<SectionHealth>,
    pub total_entries: usize,
    pub missing_sections: Vec<ProfileSection>,
}

/// Section weight and the entry count at which the section counts as full.
const SECTION_WEIGHTS: &[(ProfileSection, f64, usize)] = &[
    (ProfileSection::Experiences, 0.35, 3),
    (ProfileSection::Skills, 0.20, 8),
    (ProfileSection::Education, 0.20, 1),
    (ProfileSection::Projects, 0.15, 2),
    (ProfileSection::Achievements, 0.10, 2),
];

/// Per-entry detail score in 0.0..=1.0: how many of the optional,
/// résumé-relevant fields are filled in.
fn entry_detail_scores(profile: &Profile, section: ProfileSection) -> Vec<f64> {
    fn filled(flags: &[bool]) -> f64 {
        flags.iter().filter(|f| **f).count() as f64 / flags.len() as f64
    }
    fn has_text(value: &Option<String>) -> bool {
        value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    match section {
        ProfileSection::Experiences => profile
            .experiences
            .iter()
            .map(|e| {
                filled(&[
                    has_text(&e.description),
                    !e.achievements.is_empty(),
                    has_text(&e.location),
                ])
            })
            .collect(),
        ProfileSection::Skills => profile
            .skills
            .iter()
            .map(|s| filled(&[s.years_experience.is_some(), s.category.is_some()]))
            .collect(),
        ProfileSection::Education => profile
            .education
            .iter()
            .map(|e| {
                filled(&[
                    has_text(&e.field_of_study),
                    e.start_date.is_some() || e.end_date.is_some(),
                ])
            })
            .collect(),
        ProfileSection::Projects => profile
            .projects
            .iter()
            .map(|p| {
                filled(&[
                    has_text(&p.description),
                    !p.technologies.is_empty(),
                    has_text(&p.project_url) || has_text(&p.repository_url),
                ])
            })
            .collect(),
        ProfileSection::Achievements => profile
            .achievements
            .iter()
            .map(|a| filled(&[has_text(&a.description), a.date_achieved.is_some()]))
            .collect(),
    }
}

pub fn compute_completeness_report(profile: &Profile) -> CompletenessReport {
    let mut section_healths = Vec::new();
    let mut weighted_score_sum = 0.0;
    let mut missing_sections = Vec::new();
    let mut total_entries = 0;

    for &(section, weight, target) in SECTION_WEIGHTS {
        let entry_count = profile.count(section);
        total_entries += entry_count;

        if entry_count == 0 {
            missing_sections.push(section);
            section_healths.push(SectionHealth {
                section,
                score: 0.0,
                entry_count: 0,
                incomplete_entries: 0,
                status: SectionStatus::Missing,
                recommendations: vec![format!(
                    "Add at least one {} entry to strengthen your profile",
                    section.as_str()
                )],
            });
            continue;
        }

        let details = entry_detail_scores(profile, section);
        let incomplete_entries = details.iter().filter(|d| **d < 0.5).count();
        let average_detail = details.iter().sum::<f64>() / details.len() as f64;
        let coverage = (entry_count as f64 / target as f64).min(1.0);

        let section_score = (0.6 * coverage + 0.4 * average_detail).clamp(0.0, 1.0);

        let status = match section_score {
            s if s >= 0.8 => SectionStatus::Strong,
            s if s >= 0.5 => SectionStatus::Moderate,
            s if s >= 0.2 => SectionStatus::Weak,
            _ => SectionStatus::Missing,
        };

        let mut recommendations = Vec::new();
        if incomplete_entries > 0 {
            recommendations.push(format!(
                "{} {} entries are missing details; add descriptions, dates or links",
                incomplete_entries,
                section.as_str()
            ));
        }
        if entry_count < target {
            recommendations.push(format!(
                "Add {} more {} entries to build a complete picture",
                target - entry_count,
                section.as_str()
            ));
        }

        weighted_score_sum += section_score * weight;
        section_healths.push(SectionHealth {
            section,
            score: section_score,
            entry_count,
            incomplete_entries,
            status,
            recommendations,
        });
    }

    let total_weight: f64 = SECTION_WEIGHTS.iter().map(|(_, w, _)| w).sum();
    let overall_score = if total_weight > 0.0 {
        (weighted_score_sum / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };

    CompletenessReport {
        overall_score,
        sections: section_healths,
        total_entries,
        missing_sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{EducationRow, ExperienceRow};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn experience(description: Option<&str>) -> ExperienceRow {
        ExperienceRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            company: "Acme".into(),
            position: "Engineer".into(),
            location: Some("Berlin".into()),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: None,
            is_current: true,
            description: description.map(String::from),
            achievements: vec!["Cut build times by 40%".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_profile_is_all_missing() {
        let report = compute_completeness_report(&Profile::default());
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.missing_sections.len(), 5);
        assert!(report
            .sections
            .iter()
            .all(|s| s.status == SectionStatus::Missing));
    }

    #[test]
    fn test_full_experience_section_is_strong() {
        let profile = Profile {
            experiences: vec![
                experience(Some("Built things")),
                experience(Some("Ran things")),
                experience(Some("Fixed things")),
            ],
            ..Default::default()
        };
        let report = compute_completeness_report(&profile);
        let experiences = &report.sections[0];
        assert_eq!(experiences.section, ProfileSection::Experiences);
        assert_eq!(experiences.status, SectionStatus::Strong);
        assert!((report.overall_score - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_sparse_entries_get_recommendations() {
        let profile = Profile {
            experiences: vec![ExperienceRow {
                achievements: vec![],
                ..experience(None)
            }],
            education: vec![EducationRow {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                institution: "MIT".into(),
                degree: "BSc".into(),
                field_of_study: None,
                start_date: None,
                end_date: None,
                gpa: None,
                description: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }],
            ..Default::default()
        };
        let report = compute_completeness_report(&profile);
        assert_eq!(report.total_entries, 2);
        let experiences = &report.sections[0];
        assert_eq!(experiences.incomplete_entries, 1);
        assert_eq!(experiences.recommendations.len(), 2);
        assert_eq!(experiences.status, SectionStatus::Weak);
        assert!(!report.missing_sections.contains(&ProfileSection::Education));
    }
}
