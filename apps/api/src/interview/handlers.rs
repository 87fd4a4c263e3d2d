use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{ExtractedProfile, SourceKind};
use crate::functions::tts::{synthesize, SpeechResponse};
use crate::interview::question_bank::{questions_for, InterviewContext, DEFAULT_INTERVIEW_TYPE};
use crate::interview::repository::{
    fetch_session, fetch_session_for_update, find_context, insert_session, list_contexts,
    save_answers,
};
use crate::interview::sequencer::InterviewQuestion;
use crate::interview::session::{InterviewMode, InterviewSession, SessionState};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct UserIdBody {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Uuid,
    pub interview_type: Option<String>,
    pub mode: Option<String>,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub user_id: Uuid,
    pub question_id: String,
    pub answer: Value,
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub next_question: Option<InterviewQuestion>,
    pub progress: u8,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct QuestionAudioQuery {
    pub user_id: Uuid,
    pub voice: Option<String>,
}

#[derive(Serialize)]
pub struct QuestionAudioResponse {
    pub question: InterviewQuestion,
    #[serde(flatten)]
    pub speech: SpeechResponse,
}

#[derive(Serialize)]
pub struct InterviewExtractResponse {
    pub session_id: Uuid,
    pub profile: ExtractedProfile,
}

async fn load_session(state: &AppState, id: Uuid, user_id: Uuid) -> Result<InterviewSession, AppError> {
    let row = fetch_session(&state.db, id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview session {id} not found")))?;
    InterviewSession::from_row(row)
}

/// GET /api/v1/interviews/contexts
pub async fn handle_list_contexts(
    State(state): State<AppState>,
) -> Result<Json<Vec<InterviewContext>>, AppError> {
    Ok(Json(list_contexts(&state.db).await?))
}

/// POST /api/v1/interviews
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionState>), AppError> {
    let mode = match req.mode.as_deref() {
        Some(raw) => raw.parse::<InterviewMode>().map_err(AppError::Validation)?,
        None => InterviewMode::default(),
    };
    let interview_type = req
        .interview_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_INTERVIEW_TYPE)
        .to_string();

    find_context(&state.db, &interview_type)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown interview type '{interview_type}'")))?;

    let questions = serde_json::to_value(questions_for(&interview_type))
        .map_err(|e| AppError::Internal(e.into()))?;
    let row = insert_session(&state.db, req.user_id, &interview_type, mode.as_str(), questions).await?;
    let session = InterviewSession::from_row(row)?;

    info!(
        "Started {} interview {} ({}) for user {}",
        interview_type,
        session.row.id,
        mode.as_str(),
        req.user_id
    );
    Ok((StatusCode::CREATED, Json(session.state())))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionState>, AppError> {
    Ok(Json(load_session(&state, id, params.user_id).await?.state()))
}

/// POST /api/v1/interviews/:id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let mut tx = state.db.begin().await?;
    let row = fetch_session_for_update(&mut *tx, id, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview session {id} not found")))?;
    let mut session = InterviewSession::from_row(row)?;

    let discarded = session.record_answer(req.question_id.trim(), req.answer)?;
    if !discarded.is_empty() {
        info!("Interview {id}: discarded answers no longer applicable: {discarded:?}");
    }

    let progress = session.progress();
    let completed = session.is_complete();
    let answers =
        serde_json::to_value(&session.answers).map_err(|e| AppError::Internal(e.into()))?;
    save_answers(&mut *tx, id, answers, progress as i32, completed).await?;
    tx.commit().await?;

    if completed {
        info!("Interview {id} completed");
    }
    Ok(Json(AnswerResponse {
        next_question: session.next_question().cloned(),
        progress,
        completed,
    }))
}

/// GET /api/v1/interviews/:id/question-audio
///
/// Speaks the current question for voice-mode interviews.
pub async fn handle_question_audio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<QuestionAudioQuery>,
) -> Result<Json<QuestionAudioResponse>, AppError> {
    let session = load_session(&state, id, params.user_id).await?;
    let question = session.spoken_question()?.clone();
    let speech = synthesize(&state.llm, &question.text, params.voice.as_deref()).await?;
    Ok(Json(QuestionAudioResponse { question, speech }))
}

/// POST /api/v1/interviews/:id/extract
///
/// Runs profile extraction over the interview so far. Nothing is written;
/// the caller imports the preview through the profile import endpoint.
pub async fn handle_extract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<InterviewExtractResponse>, AppError> {
    let session = load_session(&state, id, req.user_id).await?;
    let transcript = session.transcript_text();
    if transcript.is_empty() {
        return Err(AppError::UnprocessableEntity(format!(
            "Interview {id} has no answers or transcript yet"
        )));
    }
    let profile = state
        .extractor
        .extract(&transcript, SourceKind::InterviewTranscript)
        .await?;
    info!(
        "Extracted {} profile items from interview {id}",
        profile.total_items()
    );
    Ok(Json(InterviewExtractResponse {
        session_id: id,
        profile,
    }))
}
