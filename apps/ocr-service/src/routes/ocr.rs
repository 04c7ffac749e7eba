//! OCR upload endpoint
//!
//! `POST /ocr` takes a multipart form with a `file` field and returns the
//! contract payload for the document.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::contract::ContractPayload;
use crate::document::{is_accepted_media_type, normalize_media_type, ACCEPTED_MEDIA_TYPES};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OcrSuccessResponse {
    pub success: bool,
    pub data: ContractPayload,
}

pub async fn process_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OcrSuccessResponse>, ApiError> {
    let max_bytes = state.config().server.max_upload_bytes;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::Multipart(e.to_string())
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            tracing::warn!("Upload has an empty filename");
            return Err(ApiError::MissingFile);
        }

        // Checked before the body is read so rejected uploads are not buffered
        let content_type = field
            .content_type()
            .map(normalize_media_type)
            .unwrap_or_default();
        if !is_accepted_media_type(&content_type) {
            tracing::warn!(content_type = %content_type, "Unsupported upload type");
            return Err(ApiError::UnsupportedType {
                content_type,
                supported: ACCEPTED_MEDIA_TYPES.join(", "),
            });
        }

        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read file data: {}", e);
            ApiError::Multipart(e.to_string())
        })?;

        if data.len() > max_bytes {
            return Err(ApiError::FileTooLarge {
                size: data.len(),
                max_bytes,
            });
        }

        tracing::info!(
            filename = %filename,
            content_type = %content_type,
            bytes = data.len(),
            "Processing upload"
        );

        let payload = state
            .pipeline()
            .process(data.to_vec(), &content_type)
            .await?;

        return Ok(Json(OcrSuccessResponse {
            success: true,
            data: payload,
        }));
    }

    tracing::warn!("No file field found in multipart upload");
    Err(ApiError::MissingFile)
}
