use crate::errors::AppError;

/// Largest accepted upload: 10 MB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

pub const ALLOWED_MIME_TYPES: &[&str] = &[MIME_PDF, MIME_DOC, MIME_DOCX, MIME_TEXT];

pub const DOCUMENT_TYPES: &[&str] = &["resume", "cover_letter", "certificate", "other"];

/// Resolves the effective MIME type of an upload. A declared type wins
/// unless it is missing or generic, in which case the extension decides.
pub fn resolve_mime_type(file_name: &str, declared: Option<&str>) -> Option<String> {
    let declared = declared
        .map(|d| d.split(';').next().unwrap_or(d).trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty() && d != "application/octet-stream");
    if declared.is_some() {
        return declared;
    }
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let inferred = match extension.as_str() {
        "pdf" => MIME_PDF,
        "doc" => MIME_DOC,
        "docx" => MIME_DOCX,
        "txt" => MIME_TEXT,
        _ => return None,
    };
    Some(inferred.to_string())
}

/// Rejects disallowed MIME types, empty files and files over 10 MB.
pub fn validate_upload(mime_type: Option<&str>, size: usize) -> Result<(), AppError> {
    match mime_type {
        Some(mime) if ALLOWED_MIME_TYPES.contains(&mime) => {}
        Some(mime) => {
            return Err(AppError::UnsupportedMediaType(format!(
                "File type '{mime}' is not allowed; upload a PDF, Word or plain text document"
            )))
        }
        None => {
            return Err(AppError::UnsupportedMediaType(
                "Could not determine the file type".to_string(),
            ))
        }
    }
    if size == 0 {
        return Err(AppError::Validation("File is empty".to_string()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "File is {size} bytes; the maximum is {MAX_UPLOAD_BYTES} bytes (10 MB)"
        )));
    }
    Ok(())
}

pub fn validate_document_type(document_type: &str) -> Result<(), AppError> {
    if DOCUMENT_TYPES.contains(&document_type) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "document_type must be one of {}",
            DOCUMENT_TYPES.join(", ")
        )))
    }
}

/// Reduces a client-supplied file name to a safe object key segment.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types_pass() {
        for mime in ALLOWED_MIME_TYPES {
            assert!(validate_upload(Some(mime), 1024).is_ok());
        }
    }

    #[test]
    fn test_disallowed_type_rejected() {
        assert!(matches!(
            validate_upload(Some("image/png"), 1024),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            validate_upload(None, 1024),
            Err(AppError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(validate_upload(Some(MIME_PDF), MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            validate_upload(Some(MIME_PDF), MAX_UPLOAD_BYTES + 1),
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(matches!(
            validate_upload(Some(MIME_PDF), 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_resolve_mime_prefers_declared_type() {
        assert_eq!(
            resolve_mime_type("cv.pdf", Some("text/plain; charset=utf-8")).as_deref(),
            Some(MIME_TEXT)
        );
        assert_eq!(
            resolve_mime_type("CV.DOCX", Some("application/octet-stream")).as_deref(),
            Some(MIME_DOCX)
        );
        assert_eq!(resolve_mime_type("photo.png", None), None);
        assert_eq!(resolve_mime_type("README", None), None);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\My CV (1).pdf"), "My_CV__1_.pdf");
        assert_eq!(sanitize_file_name(".."), "document");
    }

    #[test]
    fn test_document_type() {
        assert!(validate_document_type("resume").is_ok());
        assert!(validate_document_type("selfie").is_err());
    }
}
