//! Content enhancement: prompt in, text out.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::functions::prompts::{
    ENHANCE_ACHIEVEMENT, ENHANCE_EXPERIENCE, ENHANCE_GENERAL, ENHANCE_PROJECT, ENHANCE_SUMMARY,
};
use crate::llm_client::LlmClient;

pub const MAX_PROMPT_CHARS: usize = 8_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Summary,
    Experience,
    Project,
    Achievement,
    #[default]
    General,
}

impl ContentType {
    /// Unknown or missing content types fall back to `General`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("summary") => ContentType::Summary,
            Some("experience") => ContentType::Experience,
            Some("project") => ContentType::Project,
            Some("achievement") => ContentType::Achievement,
            _ => ContentType::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Summary => "summary",
            ContentType::Experience => "experience",
            ContentType::Project => "project",
            ContentType::Achievement => "achievement",
            ContentType::General => "general",
        }
    }

    fn builtin_system_prompt(&self) -> &'static str {
        match self {
            ContentType::Summary => ENHANCE_SUMMARY,
            ContentType::Experience => ENHANCE_EXPERIENCE,
            ContentType::Project => ENHANCE_PROJECT,
            ContentType::Achievement => ENHANCE_ACHIEVEMENT,
            ContentType::General => ENHANCE_GENERAL,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub prompt: String,
    pub content_type: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub enhanced_content: String,
    pub content_type: ContentType,
}

pub fn validate_enhance_request(req: &EnhanceRequest) -> Result<(), AppError> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    if req.prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(AppError::Validation(format!(
            "prompt must be at most {MAX_PROMPT_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn build_user_message(prompt: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{}\n\nAdditional context:\n{context}", prompt.trim()),
        None => prompt.trim().to_string(),
    }
}

/// Resolves the system prompt for a content type. A stored override wins;
/// lookup failures are logged and the built-in prompt is used.
pub async fn resolve_system_prompt(pool: &PgPool, content_type: ContentType) -> String {
    let name = format!("enhance_{}", content_type.as_str());
    let stored: Result<Option<String>, sqlx::Error> =
        sqlx::query_scalar("SELECT content FROM system_prompts WHERE name = $1")
            .bind(&name)
            .fetch_optional(pool)
            .await;
    match stored {
        Ok(Some(content)) if !content.trim().is_empty() => content,
        Ok(_) => content_type.builtin_system_prompt().to_string(),
        Err(e) => {
            warn!("Could not load system prompt '{name}', using built-in: {e}");
            content_type.builtin_system_prompt().to_string()
        }
    }
}

pub async fn enhance_content(
    pool: &PgPool,
    llm: &LlmClient,
    req: &EnhanceRequest,
) -> Result<EnhanceResponse, AppError> {
    validate_enhance_request(req)?;
    let content_type = ContentType::parse(req.content_type.as_deref());
    let system = resolve_system_prompt(pool, content_type).await;
    let message = build_user_message(&req.prompt, req.context.as_deref());

    let enhanced_content = llm
        .call_text(&message, &system)
        .await
        .map_err(|e| AppError::Llm(format!("Content enhancement failed: {e}")))?;

    Ok(EnhanceResponse {
        enhanced_content,
        content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse_falls_back_to_general() {
        assert_eq!(ContentType::parse(Some(" Summary ")), ContentType::Summary);
        assert_eq!(ContentType::parse(Some("poem")), ContentType::General);
        assert_eq!(ContentType::parse(None), ContentType::General);
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let req = EnhanceRequest {
            prompt: "  \n".into(),
            content_type: None,
            context: None,
        };
        assert!(matches!(
            validate_enhance_request(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_oversized_prompt_rejected() {
        let req = EnhanceRequest {
            prompt: "a".repeat(MAX_PROMPT_CHARS + 1),
            content_type: None,
            context: None,
        };
        assert!(validate_enhance_request(&req).is_err());
    }

    #[test]
    fn test_user_message_appends_context() {
        assert_eq!(build_user_message(" Led a team ", None), "Led a team");
        assert_eq!(
            build_user_message("Led a team", Some("Role: manager")),
            "Led a team\n\nAdditional context:\nRole: manager"
        );
        assert_eq!(build_user_message("Led a team", Some("   ")), "Led a team");
    }
}
