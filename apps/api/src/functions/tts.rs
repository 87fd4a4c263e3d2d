//! Text-to-speech: text in, base64 audio out.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::LlmClient;

pub const MAX_TTS_CHARS: usize = 4096;
pub const DEFAULT_VOICE: &str = "alloy";
pub const VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeechResponse {
    pub audio_content: String,
    pub content_type: &'static str,
}

/// Validates the request and returns the voice to use.
pub fn validate_speech_request(text: &str, voice: Option<&str>) -> Result<&'static str, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    if text.chars().count() > MAX_TTS_CHARS {
        return Err(AppError::Validation(format!(
            "text must be at most {MAX_TTS_CHARS} characters"
        )));
    }
    match voice.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(DEFAULT_VOICE),
        Some(v) => VOICES
            .iter()
            .copied()
            .find(|known| known.eq_ignore_ascii_case(v))
            .ok_or_else(|| {
                AppError::Validation(format!("voice must be one of {}", VOICES.join(", ")))
            }),
    }
}

pub async fn synthesize(
    llm: &LlmClient,
    text: &str,
    voice: Option<&str>,
) -> Result<SpeechResponse, AppError> {
    let voice = validate_speech_request(text, voice)?;
    let audio = llm
        .speech(text.trim(), voice)
        .await
        .map_err(|e| AppError::Llm(format!("Speech synthesis failed: {e}")))?;
    Ok(SpeechResponse {
        audio_content: base64::engine::general_purpose::STANDARD.encode(audio),
        content_type: "audio/mpeg",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_voice() {
        assert_eq!(validate_speech_request("Hello", None).unwrap(), "alloy");
        assert_eq!(validate_speech_request("Hello", Some(" ")).unwrap(), "alloy");
    }

    #[test]
    fn test_voice_is_case_insensitive() {
        assert_eq!(validate_speech_request("Hello", Some("Nova")).unwrap(), "nova");
    }

    #[test]
    fn test_rejects_unknown_voice_and_bad_text() {
        assert!(validate_speech_request("Hello", Some("robot")).is_err());
        assert!(validate_speech_request("   ", None).is_err());
        assert!(validate_speech_request(&"x".repeat(MAX_TTS_CHARS + 1), None).is_err());
        assert!(validate_speech_request(&"x".repeat(MAX_TTS_CHARS), None).is_ok());
    }
}
