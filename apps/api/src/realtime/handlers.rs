use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::question_bank::{realtime_instructions, DEFAULT_INTERVIEW_TYPE};
use crate::interview::repository::{fetch_session, find_context};
use crate::realtime::bridge::{run_bridge, BridgeParams};
use crate::realtime::protocol::{SessionConfig, DEFAULT_REALTIME_VOICE, REALTIME_VOICES};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RealtimeQuery {
    pub user_id: Uuid,
    pub interview_type: Option<String>,
    pub session_id: Option<Uuid>,
    pub voice: Option<String>,
}

pub fn resolve_realtime_voice(voice: Option<&str>) -> Result<&'static str, AppError> {
    match voice.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(DEFAULT_REALTIME_VOICE),
        Some(v) => REALTIME_VOICES
            .iter()
            .copied()
            .find(|known| known.eq_ignore_ascii_case(v))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "voice must be one of {}",
                    REALTIME_VOICES.join(", ")
                ))
            }),
    }
}

/// GET /api/v1/functions/realtime-interview
///
/// Everything that can fail with a proper HTTP status is checked before the
/// upgrade; after it, failures are reported as `error` events on the socket.
pub async fn handle_realtime_interview(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<RealtimeQuery>,
) -> Result<Response, AppError> {
    let voice = resolve_realtime_voice(params.voice.as_deref())?;

    let session_type = match params.session_id {
        Some(id) => Some(
            fetch_session(&state.db, id, params.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Interview session {id} not found")))?
                .interview_type,
        ),
        None => None,
    };
    let interview_type = session_type
        .or_else(|| {
            params
                .interview_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
        })
        .unwrap_or_else(|| DEFAULT_INTERVIEW_TYPE.to_string());

    let context = find_context(&state.db, &interview_type)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown interview type '{interview_type}'")))?;

    let bridge = BridgeParams {
        user_id: params.user_id,
        session_id: params.session_id,
        interview_type,
        session: SessionConfig::for_interview(realtime_instructions(&context), voice),
    };
    Ok(ws.on_upgrade(move |socket| run_bridge(socket, state, bridge)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_realtime_voice() {
        assert_eq!(resolve_realtime_voice(None).unwrap(), "alloy");
        assert_eq!(resolve_realtime_voice(Some("Verse")).unwrap(), "verse");
        assert!(resolve_realtime_voice(Some("nova")).is_err());
    }
}
