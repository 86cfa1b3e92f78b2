//! HTTP handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{debug, info};

use searchive_core::{DeletionReport, DocumentWithTags, IngestionOutcome, Tag};
use searchive_ingest::{KeywordStatus, Upload};

use crate::error::ApiError;
use crate::session::Owner;
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "capabilities": state.capabilities.as_ref(),
    }))
}

// =============================================================================
// DOCUMENTS
// =============================================================================

pub async fn upload_document(
    State(state): State<AppState>,
    Owner(user_id): Owner,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestionOutcome>), ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("File field has no filename".to_string()))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        upload = Some(Upload {
            user_id,
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| {
        ApiError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;
    debug!(
        user_id,
        filename = %upload.filename,
        size = upload.bytes.len(),
        "Upload received"
    );

    let outcome = state.pipeline.ingest_detached(upload).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Owner(user_id): Owner,
) -> Result<Json<Vec<DocumentWithTags>>, ApiError> {
    Ok(Json(state.pipeline.list_documents(user_id).await?))
}

pub async fn get_document(
    State(state): State<AppState>,
    Owner(user_id): Owner,
    Path(id): Path<i64>,
) -> Result<Json<DocumentWithTags>, ApiError> {
    Ok(Json(state.pipeline.get_document(id, user_id).await?))
}

pub async fn get_document_tags(
    State(state): State<AppState>,
    Owner(user_id): Owner,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(
        state.pipeline.get_tags_by_document_id(id, user_id).await?,
    ))
}

/// `Content-Disposition` for `filename`, with an ASCII fallback and the
/// exact name in `filename*`.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

pub async fn download_document(
    State(state): State<AppState>,
    Owner(user_id): Owner,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let content = state.pipeline.download_document(id, user_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    let disposition = HeaderValue::from_str(&content_disposition(&content.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((StatusCode::OK, headers, content.bytes))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Owner(user_id): Owner,
    Path(id): Path<i64>,
) -> Result<Json<DeletionReport>, ApiError> {
    let report = state.pipeline.delete_document(id, user_id).await?;
    info!(
        document_id = id,
        user_id,
        index_cleaned = report.index_cleaned,
        "Document deleted"
    );
    Ok(Json(report))
}

// =============================================================================
// KEYWORDS
// =============================================================================

pub async fn keyword_status(State(state): State<AppState>) -> Json<KeywordStatus> {
    Json(state.pipeline.orchestrator().status().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii_is_valid_header() {
        let value = content_disposition("보고서 \"초안\".hwp");
        assert!(value.starts_with("attachment; filename=\"___ ____.hwp\""));
        assert!(HeaderValue::from_str(&value).is_ok());
    }
}
