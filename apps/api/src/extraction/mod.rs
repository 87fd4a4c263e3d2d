//! Profile extraction: turns free text (résumé text, interview transcripts)
//! into structured profile sections.
//!
//! `AppState` holds an `Arc<dyn ProfileExtractor>`; the default backend is
//! `LlmProfileExtractor`.

pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::prompts::{EXTRACTION_PROMPT, EXTRACTION_SYSTEM};
use crate::llm_client::LlmClient;
use crate::profile::models::{
    AchievementInput, EducationInput, ExperienceInput, ProjectInput, SkillInput,
};

/// Source text beyond this many characters is cut before prompting.
pub const MAX_SOURCE_CHARS: usize = 24_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Document,
    InterviewTranscript,
}

impl SourceKind {
    fn describe(&self) -> &'static str {
        match self {
            SourceKind::Document => "résumé document text",
            SourceKind::InterviewTranscript => "career interview transcript",
        }
    }
}

/// Structured profile data extracted from a document or interview.
/// Missing sections deserialize as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedProfile {
    pub experiences: Vec<ExperienceInput>,
    pub skills: Vec<SkillInput>,
    pub education: Vec<EducationInput>,
    pub projects: Vec<ProjectInput>,
    pub achievements: Vec<AchievementInput>,
}

impl ExtractedProfile {
    pub fn total_items(&self) -> usize {
        self.experiences.len()
            + self.skills.len()
            + self.education.len()
            + self.projects.len()
            + self.achievements.len()
    }
}

#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    async fn extract(&self, text: &str, kind: SourceKind) -> Result<ExtractedProfile, AppError>;
}

pub struct LlmProfileExtractor(pub LlmClient);

#[async_trait]
impl ProfileExtractor for LlmProfileExtractor {
    async fn extract(&self, text: &str, kind: SourceKind) -> Result<ExtractedProfile, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::UnprocessableEntity(
                "No text available to extract profile data from".to_string(),
            ));
        }
        let prompt = build_extraction_prompt(text, kind);
        self.0
            .call_json::<ExtractedProfile>(&prompt, EXTRACTION_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Profile extraction failed: {e}")))
    }
}

fn build_extraction_prompt(text: &str, kind: SourceKind) -> String {
    EXTRACTION_PROMPT
        .replace("{source_kind}", kind.describe())
        .replace("{source_text}", truncate_chars(text.trim(), MAX_SOURCE_CHARS))
}

/// Truncates to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
