//! Profile summary: LLM-written when possible, locally assembled otherwise.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::LlmClient;
use crate::profile::models::Profile;
use crate::profile::prompts::{SUMMARY_PROMPT, SUMMARY_SYSTEM};

pub const EMPTY_PROFILE_SUMMARY: &str = "No profile data available yet. \
Upload a résumé or complete an interview to build your profile.";

const TOP_SKILLS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Llm,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub summary: String,
    pub source: SummarySource,
}

/// Summarizes a profile. LLM failures never surface to the caller; the
/// locally assembled summary is returned instead.
pub async fn summarize_profile(profile: &Profile, llm: &LlmClient) -> ProfileSummary {
    if profile.is_empty() {
        return ProfileSummary {
            summary: EMPTY_PROFILE_SUMMARY.to_string(),
            source: SummarySource::Fallback,
        };
    }

    let prompt = SUMMARY_PROMPT.replace("{profile}", &render_profile_text(profile));
    match llm.call_text(&prompt, SUMMARY_SYSTEM).await {
        Ok(summary) => ProfileSummary {
            summary,
            source: SummarySource::Llm,
        },
        Err(e) => {
            warn!("Profile summarization failed, using fallback summary: {e}");
            ProfileSummary {
                summary: build_fallback_summary(profile),
                source: SummarySource::Fallback,
            }
        }
    }
}

/// Renders the profile as plain text for prompting.
pub fn render_profile_text(profile: &Profile) -> String {
    let mut out = String::new();
    for e in &profile.experiences {
        let end = if e.is_current {
            "present".to_string()
        } else {
            e.end_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        };
        out.push_str(&format!(
            "- Experience: {} at {} ({} to {})\n",
            e.position, e.company, e.start_date, end
        ));
        if let Some(desc) = &e.description {
            out.push_str(&format!("  {desc}\n"));
        }
        for a in &e.achievements {
            out.push_str(&format!("  * {a}\n"));
        }
    }
    for s in &profile.skills {
        out.push_str(&format!(
            "- Skill: {} (level {}/5)\n",
            s.name, s.proficiency_level
        ));
    }
    for e in &profile.education {
        let field = e
            .field_of_study
            .as_deref()
            .map(|f| format!(" in {f}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "- Education: {}{} at {}\n",
            e.degree, field, e.institution
        ));
    }
    for p in &profile.projects {
        out.push_str(&format!("- Project: {}", p.title));
        if !p.technologies.is_empty() {
            out.push_str(&format!(" [{}]", p.technologies.join(", ")));
        }
        out.push('\n');
        if let Some(desc) = &p.description {
            out.push_str(&format!("  {desc}\n"));
        }
    }
    for a in &profile.achievements {
        out.push_str(&format!("- Achievement: {}\n", a.title));
    }
    out
}

/// Assembles a summary from the profile without any AI call.
pub fn build_fallback_summary(profile: &Profile) -> String {
    if profile.is_empty() {
        return EMPTY_PROFILE_SUMMARY.to_string();
    }

    let today = Utc::now().date_naive();
    let mut sentences = Vec::new();

    if let Some(latest) = profile
        .experiences
        .iter()
        .max_by_key(|e| (e.is_current, e.end_date.unwrap_or(today), e.start_date))
    {
        let tense = if latest.is_current { "is" } else { "was most recently" };
        let mut sentence = format!(
            "This professional {tense} {} at {}",
            with_article(&latest.position),
            latest.company
        );
        let years = total_experience_years(profile, today);
        if years >= 1 {
            let unit = if years == 1 { "year" } else { "years" };
            sentence.push_str(&format!(", with {years} {unit} of professional experience"));
        }
        sentence.push('.');
        sentences.push(sentence);
    }

    if let Some(edu) = profile
        .education
        .iter()
        .max_by_key(|e| e.end_date.or(e.start_date))
    {
        let field = edu
            .field_of_study
            .as_deref()
            .map(|f| format!(" in {f}"))
            .unwrap_or_default();
        sentences.push(format!(
            "They hold {}{} from {}.",
            with_article(&edu.degree),
            field,
            edu.institution
        ));
    }

    if !profile.skills.is_empty() {
        let mut skills: Vec<_> = profile.skills.iter().collect();
        skills.sort_by(|a, b| b.proficiency_level.cmp(&a.proficiency_level));
        let names: Vec<&str> = skills
            .iter()
            .take(TOP_SKILLS)
            .map(|s| s.name.as_str())
            .collect();
        sentences.push(format!("Key skills include {}.", join_natural(&names)));
    }

    let projects = profile.projects.len();
    let achievements = profile.achievements.len();
    if projects > 0 || achievements > 0 {
        let mut parts = Vec::new();
        if projects > 0 {
            parts.push(plural(projects, "project"));
        }
        if achievements > 0 {
            parts.push(plural(achievements, "achievement"));
        }
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        sentences.push(format!("Their profile lists {}.", join_natural(&parts)));
    }

    sentences.join(" ")
}

fn total_experience_years(profile: &Profile, today: NaiveDate) -> i32 {
    let months: i32 = profile
        .experiences
        .iter()
        .map(|e| {
            let end = if e.is_current {
                today
            } else {
                e.end_date.unwrap_or(today)
            };
            let months = (end.year() - e.start_date.year()) * 12 + end.month() as i32
                - e.start_date.month() as i32;
            months.max(0)
        })
        .sum();
    months / 12
}

fn with_article(noun: &str) -> String {
    let starts_with_vowel = noun
        .chars()
        .next()
        .is_some_and(|c| "aeiouAEIOU".contains(c));
    if starts_with_vowel {
        format!("an {noun}")
    } else {
        format!("a {noun}")
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn join_natural(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{EducationRow, ExperienceRow, ProjectRow, UserSkillRow};
    use uuid::Uuid;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn past_experience(position: &str, start: NaiveDate, end: NaiveDate) -> ExperienceRow {
        ExperienceRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            company: "Acme".into(),
            position: position.into(),
            location: None,
            start_date: start,
            end_date: Some(end),
            is_current: false,
            description: None,
            achievements: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn skill(name: &str, level: i16) -> UserSkillRow {
        UserSkillRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            skill_id: Uuid::new_v4(),
            name: name.into(),
            category: None,
            proficiency_level: level,
            years_experience: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_profile_fallback() {
        assert_eq!(build_fallback_summary(&Profile::default()), EMPTY_PROFILE_SUMMARY);
    }

    #[test]
    fn test_fallback_uses_most_recent_role_and_years() {
        let profile = Profile {
            experiences: vec![
                past_experience("Intern", date(2015, 1), date(2016, 1)),
                past_experience("Engineer", date(2016, 1), date(2020, 1)),
            ],
            ..Default::default()
        };
        let summary = build_fallback_summary(&profile);
        assert!(
            summary.starts_with("This professional was most recently an Engineer at Acme, with 5 years"),
            "{summary}"
        );
    }

    #[test]
    fn test_fallback_lists_top_skills_by_proficiency() {
        let profile = Profile {
            skills: vec![skill("SQL", 2), skill("Rust", 5), skill("Go", 4)],
            ..Default::default()
        };
        assert_eq!(
            build_fallback_summary(&profile),
            "Key skills include Rust, Go and SQL."
        );
    }

    #[test]
    fn test_fallback_mentions_education_and_counts() {
        let profile = Profile {
            education: vec![EducationRow {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                institution: "MIT".into(),
                degree: "BSc".into(),
                field_of_study: Some("Computer Science".into()),
                start_date: None,
                end_date: Some(date(2018, 6)),
                gpa: None,
                description: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }],
            projects: vec![ProjectRow {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                title: "Compiler".into(),
                description: None,
                technologies: vec![],
                start_date: None,
                end_date: None,
                project_url: None,
                repository_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }],
            ..Default::default()
        };
        assert_eq!(
            build_fallback_summary(&profile),
            "They hold a BSc in Computer Science from MIT. Their profile lists 1 project."
        );
    }

    #[test]
    fn test_render_profile_text_lists_entries() {
        let profile = Profile {
            experiences: vec![past_experience("Engineer", date(2016, 1), date(2020, 1))],
            skills: vec![skill("Rust", 5)],
            ..Default::default()
        };
        let text = render_profile_text(&profile);
        assert!(text.contains("- Experience: Engineer at Acme (2016-01-01 to 2020-01-01)"));
        assert!(text.contains("- Skill: Rust (level 5/5)"));
    }

    #[test]
    fn test_join_natural() {
        assert_eq!(join_natural(&["a"]), "a");
        assert_eq!(join_natural(&["a", "b", "c"]), "a, b and c");
    }
}
