//! Persistence for interview contexts and sessions.

use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::interview::question_bank::{builtin_context, builtin_contexts, InterviewContext};
use crate::interview::session::{TranscriptEntry, STATUS_IN_PROGRESS};
use crate::models::interview::{InterviewContextRow, InterviewSessionRow};

impl From<InterviewContextRow> for InterviewContext {
    fn from(row: InterviewContextRow) -> Self {
        InterviewContext {
            interview_type: row.interview_type,
            title: row.title,
            description: row.description,
            system_prompt: row.system_prompt,
        }
    }
}

/// Built-in contexts with active database rows layered on top by type.
pub fn merge_contexts(rows: Vec<InterviewContextRow>) -> Vec<InterviewContext> {
    let mut contexts = builtin_contexts();
    for row in rows.into_iter().filter(|r| r.is_active) {
        let context = InterviewContext::from(row);
        match contexts
            .iter_mut()
            .find(|c| c.interview_type == context.interview_type)
        {
            Some(existing) => *existing = context,
            None => contexts.push(context),
        }
    }
    contexts
}

pub async fn list_contexts(pool: &PgPool) -> Result<Vec<InterviewContext>, sqlx::Error> {
    let rows = sqlx::query_as::<_, InterviewContextRow>(
        "SELECT * FROM interview_contexts WHERE is_active = TRUE ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(merge_contexts(rows))
}

/// Resolves a context by type: an active database row wins over the
/// built-in default.
pub async fn find_context(
    pool: &PgPool,
    interview_type: &str,
) -> Result<Option<InterviewContext>, sqlx::Error> {
    let row = sqlx::query_as::<_, InterviewContextRow>(
        "SELECT * FROM interview_contexts WHERE interview_type = $1 AND is_active = TRUE",
    )
    .bind(interview_type)
    .fetch_optional(pool)
    .await?;
    Ok(row
        .map(InterviewContext::from)
        .or_else(|| builtin_context(interview_type)))
}

pub async fn insert_session(
    pool: &PgPool,
    user_id: Uuid,
    interview_type: &str,
    mode: &str,
    questions: Value,
) -> Result<InterviewSessionRow, sqlx::Error> {
    sqlx::query_as::<_, InterviewSessionRow>(
        r#"
        INSERT INTO interview_sessions (user_id, interview_type, mode, questions, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(interview_type)
    .bind(mode)
    .bind(questions)
    .bind(STATUS_IN_PROGRESS)
    .fetch_one(pool)
    .await
}

pub async fn fetch_session(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<InterviewSessionRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewSessionRow>(
        "SELECT * FROM interview_sessions WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Row-locked read for read-modify-write of answers.
pub async fn fetch_session_for_update(
    conn: &mut PgConnection,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<InterviewSessionRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewSessionRow>(
        "SELECT * FROM interview_sessions WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn save_answers(
    conn: &mut PgConnection,
    id: Uuid,
    answers: Value,
    progress: i32,
    completed: bool,
) -> Result<InterviewSessionRow, sqlx::Error> {
    sqlx::query_as::<_, InterviewSessionRow>(
        r#"
        UPDATE interview_sessions
        SET answers = $2,
            progress = $3,
            status = CASE WHEN $4 THEN 'completed' ELSE status END,
            completed_at = CASE WHEN $4 THEN COALESCE(completed_at, NOW()) ELSE completed_at END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(answers)
    .bind(progress)
    .bind(completed)
    .fetch_one(conn)
    .await
}

/// Appends realtime transcript entries. Returns false when the session does
/// not exist for this user.
pub async fn append_transcript(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    entries: &[TranscriptEntry],
) -> Result<bool, sqlx::Error> {
    let entries = serde_json::to_value(entries).unwrap_or_else(|_| Value::Array(Vec::new()));
    let result = sqlx::query(
        r#"
        UPDATE interview_sessions
        SET transcript = transcript || $3::jsonb, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(entries)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
