//! Plain-text extraction from uploaded documents.

use bytes::Bytes;

use crate::documents::validation::{MIME_PDF, MIME_TEXT};
use crate::errors::AppError;

/// Extracts text from a stored document. PDF parsing is CPU-bound and runs
/// on the blocking pool.
pub async fn extract_text(mime_type: &str, bytes: Bytes) -> Result<String, AppError> {
    let text = match mime_type {
        MIME_PDF => tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            // the parser panics on some malformed files
            .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?
            .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?,
        MIME_TEXT => String::from_utf8_lossy(&bytes).into_owned(),
        other => {
            return Err(AppError::UnprocessableEntity(format!(
                "Text extraction is not supported for '{other}'; upload a PDF or plain text file"
            )))
        }
    };
    Ok(normalize_whitespace(&text))
}

/// Collapses runs of blank lines and trailing spaces left by PDF layout.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::validation::MIME_DOCX;

    #[tokio::test]
    async fn test_plain_text_is_passed_through() {
        let text = extract_text(MIME_TEXT, Bytes::from_static(b"Jane Doe\n\n\n\nEngineer  \n"))
            .await
            .unwrap();
        assert_eq!(text, "Jane Doe\n\nEngineer");
    }

    #[tokio::test]
    async fn test_word_documents_are_unprocessable() {
        let err = extract_text(MIME_DOCX, Bytes::from_static(&[1, 2, 3])).await.unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_unprocessable() {
        let err = extract_text(MIME_PDF, Bytes::from_static(b"not a pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }
}
