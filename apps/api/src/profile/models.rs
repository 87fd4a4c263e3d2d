use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::profile::{
    AchievementRow, EducationRow, ExperienceRow, ProjectRow, UserSkillRow,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSection {
    Experiences,
    Skills,
    Education,
    Projects,
    Achievements,
}

impl ProfileSection {
    pub const ALL: [ProfileSection; 5] = [
        ProfileSection::Experiences,
        ProfileSection::Skills,
        ProfileSection::Education,
        ProfileSection::Projects,
        ProfileSection::Achievements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSection::Experiences => "experiences",
            ProfileSection::Skills => "skills",
            ProfileSection::Education => "education",
            ProfileSection::Projects => "projects",
            ProfileSection::Achievements => "achievements",
        }
    }

    /// The table holding the user-owned rows of this section.
    pub fn table(&self) -> &'static str {
        match self {
            ProfileSection::Skills => "user_skills",
            other => other.as_str(),
        }
    }
}

impl FromStr for ProfileSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileSection::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("Unknown profile section '{s}'"))
    }
}

// Inputs default every field so that missing values reach validation
// and are reported together instead of failing deserialization one by one.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceInput {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillInput {
    pub name: String,
    pub category: Option<String>,
    pub proficiency_level: i16,
    pub years_experience: Option<f32>,
}

impl Default for SkillInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: None,
            proficiency_level: 3,
            years_experience: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationInput {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub gpa: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInput {
    pub title: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub project_url: Option<String>,
    pub repository_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementInput {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub issuer: Option<String>,
    pub date_achieved: Option<NaiveDate>,
}

/// Every persisted profile row of one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub experiences: Vec<ExperienceRow>,
    pub skills: Vec<UserSkillRow>,
    pub education: Vec<EducationRow>,
    pub projects: Vec<ProjectRow>,
    pub achievements: Vec<AchievementRow>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        self.experiences.is_empty()
            && self.skills.is_empty()
            && self.education.is_empty()
            && self.projects.is_empty()
            && self.achievements.is_empty()
    }

    pub fn count(&self, section: ProfileSection) -> usize {
        match section {
            ProfileSection::Experiences => self.experiences.len(),
            ProfileSection::Skills => self.skills.len(),
            ProfileSection::Education => self.education.len(),
            ProfileSection::Projects => self.projects.len(),
            ProfileSection::Achievements => self.achievements.len(),
        }
    }
}

/// A single persisted row of any section, as returned by the CRUD endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProfileRecord {
    Experience(ExperienceRow),
    Skill(UserSkillRow),
    Education(EducationRow),
    Project(ProjectRow),
    Achievement(AchievementRow),
}
