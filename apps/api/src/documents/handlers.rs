use std::future::Future;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::documents::storage::{delete_object, get_object, object_key, put_object};
use crate::documents::text::extract_text;
use crate::documents::validation::{
    resolve_mime_type, sanitize_file_name, validate_document_type, validate_upload,
};
use crate::errors::AppError;
use crate::extraction::{ExtractedProfile, SourceKind};
use crate::models::document::{ResumeRow, UploadedDocumentRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct ProcessRequest {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct ProcessDocumentResponse {
    pub document_id: Uuid,
    pub resume_id: Uuid,
    pub profile: ExtractedProfile,
}

/// A fully read multipart upload.
struct UploadForm {
    user_id: Uuid,
    document_type: String,
    file_name: String,
    declared_type: Option<String>,
    bytes: Bytes,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut user_id = None;
    let mut document_type = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "user_id" => {
                let raw = field.text().await.map_err(multipart_error)?;
                let parsed = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?;
                user_id = Some(parsed);
            }
            "document_type" => {
                document_type = Some(field.text().await.map_err(multipart_error)?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let declared_type = field.content_type().map(String::from);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, declared_type, bytes));
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| AppError::Validation("user_id is required".into()))?;
    let (file_name, declared_type, bytes) =
        file.ok_or_else(|| AppError::Validation("file is required".into()))?;

    Ok(UploadForm {
        user_id,
        document_type: document_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "resume".to_string()),
        file_name,
        declared_type,
        bytes,
    })
}

async fn find_document(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
) -> Result<UploadedDocumentRow, AppError> {
    sqlx::query_as::<_, UploadedDocumentRow>(
        "SELECT * FROM uploaded_documents WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
}

async fn set_processing_status<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    status: &str,
    extracted_text: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE uploaded_documents
        SET processing_status = $2, extracted_text = COALESCE($3, extracted_text)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(extracted_text)
    .execute(executor)
    .await?;
    Ok(())
}

/// Runs `work`; if it fails, awaits `mark_failed` before returning the
/// original error. A failure to mark is logged, not returned.
async fn with_failure_status<T, W, M>(id: Uuid, work: W, mark_failed: M) -> Result<T, AppError>
where
    W: Future<Output = Result<T, AppError>>,
    M: Future<Output = Result<(), AppError>>,
{
    match work.await {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Processing document {id} failed: {e}");
            if let Err(mark_err) = mark_failed.await {
                error!("Could not mark document {id} as failed: {mark_err}");
            }
            Err(e)
        }
    }
}

/// POST /api/v1/documents
///
/// Multipart upload: `user_id`, optional `document_type`, `file`.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedDocumentRow>), AppError> {
    let form = read_upload_form(multipart).await?;

    let mime_type = resolve_mime_type(&form.file_name, form.declared_type.as_deref());
    validate_upload(mime_type.as_deref(), form.bytes.len())?;
    validate_document_type(&form.document_type)?;
    let mime_type = mime_type.unwrap_or_default();

    let document_id = Uuid::new_v4();
    let file_name = sanitize_file_name(&form.file_name);
    let key = object_key(form.user_id, document_id, &file_name);
    let file_size = form.bytes.len() as i64;

    put_object(
        &state.s3,
        &state.config.s3_bucket,
        &key,
        &mime_type,
        form.bytes,
    )
    .await?;

    let row = sqlx::query_as::<_, UploadedDocumentRow>(
        r#"
        INSERT INTO uploaded_documents
            (id, user_id, file_name, file_type, file_size, storage_path, document_type,
             processing_status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'uploaded')
        RETURNING *
        "#,
    )
    .bind(document_id)
    .bind(form.user_id)
    .bind(&file_name)
    .bind(&mime_type)
    .bind(file_size)
    .bind(&key)
    .bind(&form.document_type)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Stored document {document_id} ({file_size} bytes, {mime_type}) for user {}",
        form.user_id
    );
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/documents
pub async fn handle_list_documents(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<UploadedDocumentRow>>, AppError> {
    let rows = sqlx::query_as::<_, UploadedDocumentRow>(
        "SELECT * FROM uploaded_documents WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/v1/documents/:id/download
pub async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Response, AppError> {
    let document = find_document(&state, id, params.user_id).await?;
    let bytes = get_object(&state.s3, &state.config.s3_bucket, &document.storage_path).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, &document.file_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("building download response: {e}")))
}

/// DELETE /api/v1/documents/:id
pub async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let document = find_document(&state, id, params.user_id).await?;
    delete_object(&state.s3, &state.config.s3_bucket, &document.storage_path).await?;
    sqlx::query("DELETE FROM uploaded_documents WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/documents/:id/process
///
/// Extracts text, runs profile extraction and records the parsed résumé.
/// The document is marked `failed` if any step after `processing` fails.
pub async fn handle_process_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProcessRequest>,
) -> Result<Json<ProcessDocumentResponse>, AppError> {
    let document = find_document(&state, id, req.user_id).await?;
    set_processing_status(&state.db, id, "processing", None).await?;

    let (resume, profile) = with_failure_status(
        id,
        process_document(&state, &document),
        set_processing_status(&state.db, id, "failed", None),
    )
    .await?;

    info!(
        "Processed document {id}: {} profile items extracted",
        profile.total_items()
    );

    Ok(Json(ProcessDocumentResponse {
        document_id: id,
        resume_id: resume.id,
        profile,
    }))
}

/// Extraction, then the résumé row and the `processed` status in one
/// transaction.
async fn process_document(
    state: &AppState,
    document: &UploadedDocumentRow,
) -> Result<(ResumeRow, ExtractedProfile), AppError> {
    let (text, profile) = extract_document_profile(state, document).await?;
    let parsed = serde_json::to_value(&profile).map_err(anyhow::Error::from)?;

    let mut tx = state.db.begin().await?;
    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (user_id, document_id, title, parsed_data, status)
        VALUES ($1, $2, $3, $4, 'parsed')
        RETURNING *
        "#,
    )
    .bind(document.user_id)
    .bind(document.id)
    .bind(&document.file_name)
    .bind(parsed)
    .fetch_one(&mut *tx)
    .await?;
    set_processing_status(&mut *tx, document.id, "processed", Some(&text)).await?;
    tx.commit().await?;
    Ok((resume, profile))
}

async fn extract_document_profile(
    state: &AppState,
    document: &UploadedDocumentRow,
) -> Result<(String, ExtractedProfile), AppError> {
    let text = match document.extracted_text.as_deref() {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => {
            let bytes =
                get_object(&state.s3, &state.config.s3_bucket, &document.storage_path).await?;
            extract_text(&document.file_type, bytes).await?
        }
    };
    let profile = state.extractor.extract(&text, SourceKind::Document).await?;
    Ok((text, profile))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    let rows = sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_failed_work_marks_document() {
        let marked = AtomicBool::new(false);
        let result: Result<(), AppError> = with_failure_status(
            Uuid::new_v4(),
            async { Err(AppError::UnprocessableEntity("no text".into())) },
            async {
                marked.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
        assert!(marked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_successful_work_leaves_status_alone() {
        let marked = AtomicBool::new(false);
        let result = with_failure_status(Uuid::new_v4(), async { Ok(7) }, async {
            marked.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert!(!marked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_mark_failure_keeps_original_error() {
        let result: Result<(), AppError> = with_failure_status(
            Uuid::new_v4(),
            async { Err(AppError::NotFound("resume".into())) },
            async { Err(AppError::Internal(anyhow::anyhow!("pool closed"))) },
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
