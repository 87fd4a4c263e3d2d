//! Axum route handlers for the proxy functions.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::functions::enhance::{enhance_content, EnhanceRequest, EnhanceResponse};
use crate::functions::tts::{synthesize, SpeechRequest, SpeechResponse};
use crate::state::AppState;

/// POST /api/v1/functions/enhance-content
pub async fn handle_enhance_content(
    State(state): State<AppState>,
    Json(req): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, AppError> {
    Ok(Json(enhance_content(&state.db, &state.llm, &req).await?))
}

/// POST /api/v1/functions/text-to-speech
pub async fn handle_text_to_speech(
    State(state): State<AppState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<SpeechResponse>, AppError> {
    Ok(Json(
        synthesize(&state.llm, &req.text, req.voice.as_deref()).await?,
    ))
}
